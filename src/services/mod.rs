pub mod audit;
pub mod catalog;
pub mod sql_export;
pub mod tables;

pub use audit::{
    AuditService, CoverageReport, ProposalConflict, RecipeIdAudit, RenameProposal,
    SubcategoryAudit,
};
pub use catalog::{AliasUpdate, CatalogService, RecipeRename, SpiritSwap};
pub use sql_export::{blurhash_update_sql, parse_blurhash_payload, DEFAULT_SQL_FILE};
pub use tables::{TableSchema, TableService, TableStatus};
