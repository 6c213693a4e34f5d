//! Configuration system for Larder.
//!
//! Provides TOML-based configuration with:
//! - `[cache]` and `[session]` store settings
//! - `[logging]` settings for the operator binary
//! - Config file layering (user config dir + project-local overrides)
//!
//! The store sections implement the `larder-types` config traits, so a
//! loaded section can be handed straight to `CacheStore::from_config` or
//! `SessionStore::from_config`.

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options,
    save_config, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
