//! Configuration file parsing for the EVE inspector
//!
//! Supports:
//! - `.eve/config.toml` - Global settings and extra editor schemas

pub mod settings;
pub mod types;

pub use settings::{init_config_dir, load_settings, EVE_DIR};
pub use types::*;
