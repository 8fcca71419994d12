//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    Config, ConfigError, DexScreenerSection, IndexingSection, LoggingSection, StorageSection,
    load_config,
};
