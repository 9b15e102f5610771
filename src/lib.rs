//! Barback - backend access helper and maintenance CLI for a cocktail
//! catalogue stored behind a PostgREST API.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): records, queries, configuration models and
//!   the [`RecordStore`] port
//! - **Adapters** (`adapters`): the PostgREST HTTP client and an in-memory store
//! - **Service Layer** (`services`): catalogue maintenance, audits and SQL export
//! - **Infrastructure Layer** (`infrastructure`): configuration loading and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use barback::{ConfigLoader, LoadOptions, PostgrestClient, Privilege};
//! use barback::services::CatalogService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load(&LoadOptions::default())?;
//!     let connection = ConfigLoader::resolve_connection(&config, Privilege::Restricted)?;
//!     let catalog = CatalogService::new(Arc::new(PostgrestClient::new(&connection, &config)?));
//!     println!("{:?}", catalog.ingredient("benedictine").await?);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::{MemoryStore, PostgrestClient};
pub use domain::models::{
    Config, ConnectionConfig, Filter, Order, Privilege, Query, Record, Table,
};
pub use domain::ports::RecordStore;
pub use domain::{BackendError, DomainError};
pub use infrastructure::config::{ConfigError, ConfigLoader, LoadOptions};
