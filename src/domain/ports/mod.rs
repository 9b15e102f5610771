//! Port trait definitions (Hexagonal Architecture)
//!
//! - RecordStore: generic table access against the catalogue backend

pub mod record_store;

pub use record_store::RecordStore;
