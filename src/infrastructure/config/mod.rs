//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML file loading
//! - dotenv file loading (dotenvy)
//! - Environment variable overrides, including the plain credential names
//! - Configuration validation
//! - Privilege-aware connection resolution

pub mod loader;

pub use loader::{ConfigError, ConfigLoader, LoadOptions, DEFAULT_CONFIG_FILE, DEFAULT_ENV_FILE};
