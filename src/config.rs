//! Configuration: types and JSON persistence.

pub mod persistence;
pub mod types;

pub use persistence::{config_path, load_config, save_config};
pub use types::AppConfig;
