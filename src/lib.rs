pub mod config;
pub mod error;
pub mod fetch;
pub mod labels;
pub mod logging;
pub mod model;
pub mod server;
pub mod suggest;

pub use config::Config;
pub use model::{ClassifierAdapter, Classifier};
pub use server::{build_router, AppState};
