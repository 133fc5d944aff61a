use rand::Rng;
use serde::Serialize;

use crate::labels::GarmentGroup;

pub const MAX_SUGGESTED_ITEMS: usize = 3;

/// Probability that the optional item of a template is added to an outfit.
const OPTIONAL_ITEM_PROBABILITY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ItemCategory {
    Tops,
    Bottoms,
    Shoes,
    Outerwear,
    Accessories,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutfitItem {
    pub name: &'static str,
    pub category: ItemCategory,
    pub image_url: &'static str,
}

pub const CATALOG: [OutfitItem; 5] = [
    OutfitItem {
        name: "Basic Fit Tee",
        category: ItemCategory::Tops,
        image_url: "https://placehold.co/200x300/E2E8F0/AAAAAA?text=Basic+Fit+Tee",
    },
    OutfitItem {
        name: "Straight-Leg Jeans",
        category: ItemCategory::Bottoms,
        image_url: "https://placehold.co/200x300/A0AEC0/FFFFFF?text=Straight+Jeans",
    },
    OutfitItem {
        name: "Classic Sneakers",
        category: ItemCategory::Shoes,
        image_url: "https://placehold.co/200x300/CBD5E0/FFFFFF?text=Classic+Sneakers",
    },
    OutfitItem {
        name: "Khaki Bomber Jacket",
        category: ItemCategory::Outerwear,
        image_url: "https://placehold.co/200x300/718096/FFFFFF?text=Khaki+Bomber",
    },
    OutfitItem {
        name: "Sporty Baseball Cap",
        category: ItemCategory::Accessories,
        image_url: "https://placehold.co/200x300/4A5568/FFFFFF?text=Baseball+Cap",
    },
];

impl OutfitItem {
    pub fn for_category(category: ItemCategory) -> &'static OutfitItem {
        match category {
            ItemCategory::Tops => &CATALOG[0],
            ItemCategory::Bottoms => &CATALOG[1],
            ItemCategory::Shoes => &CATALOG[2],
            ItemCategory::Outerwear => &CATALOG[3],
            ItemCategory::Accessories => &CATALOG[4],
        }
    }
}

/// Items that complete an outfit for one garment group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutfitTemplate {
    pub always: &'static [ItemCategory],
    pub maybe: Option<ItemCategory>,
}

static TEMPLATES: [OutfitTemplate; 4] = [
    // GarmentGroup::UpperBody
    OutfitTemplate {
        always: &[ItemCategory::Bottoms, ItemCategory::Shoes],
        maybe: Some(ItemCategory::Outerwear),
    },
    // GarmentGroup::OnePiece
    OutfitTemplate {
        always: &[ItemCategory::Shoes, ItemCategory::Accessories],
        maybe: None,
    },
    // GarmentGroup::LowerBody
    OutfitTemplate {
        always: &[ItemCategory::Tops, ItemCategory::Shoes],
        maybe: None,
    },
    // GarmentGroup::Other
    OutfitTemplate {
        always: &[ItemCategory::Tops, ItemCategory::Bottoms, ItemCategory::Shoes],
        maybe: None,
    },
];

pub fn template_for(group: GarmentGroup) -> &'static OutfitTemplate {
    let slot = match group {
        GarmentGroup::UpperBody => 0,
        GarmentGroup::OnePiece => 1,
        GarmentGroup::LowerBody => 2,
        GarmentGroup::Other => 3,
    };
    &TEMPLATES[slot]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub input_item_category: String,
    pub suggestion_text: String,
    pub suggested_outfit: Vec<OutfitItem>,
}

/// Builds an outfit around an item of the given category label.
///
/// Labels outside the known set are treated like jackets and suiting. Items
/// matching the input category are not filtered out.
pub fn suggest_outfit<R: Rng>(label: &str, rng: &mut R) -> Suggestion {
    let template = template_for(GarmentGroup::of_label(label));

    let mut items: Vec<OutfitItem> = template
        .always
        .iter()
        .map(|category| *OutfitItem::for_category(*category))
        .collect();

    if let Some(optional) = template.maybe {
        if rng.random_bool(OPTIONAL_ITEM_PROBABILITY) {
            items.push(*OutfitItem::for_category(optional));
        }
    }
    items.truncate(MAX_SUGGESTED_ITEMS);

    tracing::debug!(category = label, items = items.len(), "built outfit suggestion");

    Suggestion {
        input_item_category: label.to_string(),
        suggestion_text: format!(
            "With a '{}' item, here is a fun outfit idea for you:",
            label
        ),
        suggested_outfit: items,
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::labels::{Category, UNKNOWN_CATEGORY_LABEL};

    fn categories(suggestion: &Suggestion) -> Vec<ItemCategory> {
        suggestion
            .suggested_outfit
            .iter()
            .map(|item| item.category)
            .collect()
    }

    #[test]
    fn catalog_lookup_matches_category() {
        for item in CATALOG.iter() {
            assert_eq!(OutfitItem::for_category(item.category), item);
        }
    }

    #[test]
    fn every_known_label_gets_a_valid_suggestion() {
        let mut rng = StdRng::seed_from_u64(7);
        for category in Category::ALL {
            let suggestion = suggest_outfit(category.label(), &mut rng);
            assert_eq!(suggestion.input_item_category, category.label());
            assert!(!suggestion.suggestion_text.is_empty());
            assert!(suggestion.suggestion_text.contains(category.label()));
            assert!(!suggestion.suggested_outfit.is_empty());
            assert!(suggestion.suggested_outfit.len() <= MAX_SUGGESTED_ITEMS);
            for item in &suggestion.suggested_outfit {
                assert!(CATALOG.contains(item));
            }
        }
    }

    #[test]
    fn upper_body_outerwear_is_a_coin_flip() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut with_outerwear = 0;
        let mut without_outerwear = 0;

        for _ in 0..200 {
            let suggestion = suggest_outfit("Shirts & Polos", &mut rng);
            let got = categories(&suggestion);
            assert_eq!(&got[..2], &[ItemCategory::Bottoms, ItemCategory::Shoes]);
            match got.len() {
                3 => {
                    assert_eq!(got[2], ItemCategory::Outerwear);
                    with_outerwear += 1;
                }
                2 => without_outerwear += 1,
                n => panic!("unexpected outfit size {}", n),
            }
        }

        assert!(with_outerwear > 0);
        assert!(without_outerwear > 0);
    }

    #[test]
    fn same_seed_gives_same_outfit() {
        let first = suggest_outfit("Graphic Tees", &mut StdRng::seed_from_u64(3));
        let second = suggest_outfit("Graphic Tees", &mut StdRng::seed_from_u64(3));
        assert_eq!(first, second);
    }

    #[test]
    fn dresses_get_shoes_then_accessories() {
        let suggestion = suggest_outfit("Dresses", &mut StdRng::seed_from_u64(1));
        assert_eq!(
            categories(&suggestion),
            vec![ItemCategory::Shoes, ItemCategory::Accessories]
        );
    }

    #[test]
    fn pants_get_top_and_shoes() {
        let suggestion = suggest_outfit("Pants", &mut StdRng::seed_from_u64(1));
        assert_eq!(
            categories(&suggestion),
            vec![ItemCategory::Tops, ItemCategory::Shoes]
        );
    }

    #[test]
    fn unrecognised_labels_get_full_outfit() {
        for label in ["Unknown", UNKNOWN_CATEGORY_LABEL, "", "Suiting"] {
            let suggestion = suggest_outfit(label, &mut StdRng::seed_from_u64(1));
            assert_eq!(
                categories(&suggestion),
                vec![ItemCategory::Tops, ItemCategory::Bottoms, ItemCategory::Shoes]
            );
        }
    }

    #[test]
    fn serializes_item_categories_as_plain_names() {
        let value = serde_json::to_value(OutfitItem::for_category(ItemCategory::Outerwear))
            .unwrap();
        assert_eq!(value["category"], "Outerwear");
        assert_eq!(value["name"], "Khaki Bomber Jacket");
        assert!(value["image_url"].as_str().unwrap().starts_with("https://"));
    }
}
