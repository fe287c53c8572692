//! Configuration utilities

/// TOML configuration loading and validation.
pub mod toml_config;

pub use toml_config::{ConfigError, LitScoutConfig, DEFAULT_CONFIG_FILE};
