pub mod config;
pub mod connection;
pub mod query;
pub mod record;

pub use config::{BackendConfig, Config, LoggingConfig, RateLimitConfig, RetryConfig};
pub use connection::{ConnectionConfig, Privilege};
pub use query::{Direction, Filter, Order, Query};
pub use record::{
    from_record, from_records, to_record, BaseSpirit, Collection, Ingredient, IngredientLine,
    LocalizedIngredients, LocalizedText, Recipe, Record, Subcategory, Table,
};
