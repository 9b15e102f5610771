//! Domain layer for Barback
//!
//! Connection settings, record views, query predicates and the store port.
//! Nothing here performs I/O.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{BackendError, DomainError, DomainResult, StoreResult};
