/// Label returned when the model predicts an index outside of [`Category::ALL`].
pub const UNKNOWN_CATEGORY_LABEL: &str = "Category unknown";

/// Garment categories the classifier was trained on, in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    JacketsAndVests,
    ShirtsAndPolos,
    Suiting,
    BlousesAndShirts,
    Cardigans,
    Dresses,
    GraphicTees,
    JacketsAndCoats,
    Leggings,
    RompersAndJumpsuits,
    Skirts,
    Denim,
    Pants,
    Shorts,
    Sweaters,
    SweatshirtsAndHoodies,
    TeesAndTanks,
}

/// Coarse grouping used to pick which items complete an outfit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GarmentGroup {
    UpperBody,
    OnePiece,
    LowerBody,
    Other,
}

impl Category {
    pub const ALL: [Category; 17] = [
        Category::JacketsAndVests,
        Category::ShirtsAndPolos,
        Category::Suiting,
        Category::BlousesAndShirts,
        Category::Cardigans,
        Category::Dresses,
        Category::GraphicTees,
        Category::JacketsAndCoats,
        Category::Leggings,
        Category::RompersAndJumpsuits,
        Category::Skirts,
        Category::Denim,
        Category::Pants,
        Category::Shorts,
        Category::Sweaters,
        Category::SweatshirtsAndHoodies,
        Category::TeesAndTanks,
    ];

    pub fn from_index(index: usize) -> Option<Category> {
        Self::ALL.get(index).copied()
    }

    pub fn from_label(label: &str) -> Option<Category> {
        Self::ALL.iter().copied().find(|c| c.label() == label)
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::JacketsAndVests => "Jackets & Vests",
            Category::ShirtsAndPolos => "Shirts & Polos",
            Category::Suiting => "Suiting",
            Category::BlousesAndShirts => "Blouses & Shirts",
            Category::Cardigans => "Cardigans",
            Category::Dresses => "Dresses",
            Category::GraphicTees => "Graphic Tees",
            Category::JacketsAndCoats => "Jackets & Coats",
            Category::Leggings => "Leggings",
            Category::RompersAndJumpsuits => "Rompers & Jumpsuits",
            Category::Skirts => "Skirts",
            Category::Denim => "Denim",
            Category::Pants => "Pants",
            Category::Shorts => "Shorts",
            Category::Sweaters => "Sweaters",
            Category::SweatshirtsAndHoodies => "Sweatshirts & Hoodies",
            Category::TeesAndTanks => "Tees & Tanks",
        }
    }

    pub fn group(self) -> GarmentGroup {
        match self {
            Category::TeesAndTanks
            | Category::GraphicTees
            | Category::ShirtsAndPolos
            | Category::BlousesAndShirts => GarmentGroup::UpperBody,
            Category::Dresses | Category::RompersAndJumpsuits => GarmentGroup::OnePiece,
            Category::Skirts
            | Category::Denim
            | Category::Pants
            | Category::Shorts
            | Category::Leggings => GarmentGroup::LowerBody,
            Category::JacketsAndVests
            | Category::Suiting
            | Category::Cardigans
            | Category::JacketsAndCoats
            | Category::Sweaters
            | Category::SweatshirtsAndHoodies => GarmentGroup::Other,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl GarmentGroup {
    /// Group for an arbitrary label; anything unrecognised is [`GarmentGroup::Other`].
    pub fn of_label(label: &str) -> GarmentGroup {
        Category::from_label(label)
            .map(Category::group)
            .unwrap_or(GarmentGroup::Other)
    }
}
