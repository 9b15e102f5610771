use async_trait::async_trait;

use crate::domain::errors::StoreResult;
use crate::domain::models::{Filter, Query, Record};

/// Generic access to the backend's named tables.
///
/// Tables are addressed by name so table checks can reach tables the catalogue
/// does not model. Mutations return the affected rows as the backend
/// reports them. Update and delete refuse an empty filter list with
/// [`BackendError::UnfilteredMutation`](crate::domain::BackendError::UnfilteredMutation).
///
/// Implementations never check the credential's privilege themselves: a
/// mutation made with the restricted key reaches the backend, and its
/// rejection comes back as `PermissionDenied`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Rows matching `query`. No match is an empty vector, not an error.
    async fn select(&self, table: &str, query: &Query) -> StoreResult<Vec<Record>>;

    /// Exact number of rows matching `filters`, without fetching them.
    async fn count(&self, table: &str, filters: &[Filter]) -> StoreResult<u64>;

    /// Plain insert; an existing key is a `Conflict`.
    async fn insert(&self, table: &str, rows: Vec<Record>) -> StoreResult<Vec<Record>>;

    /// Insert, or merge into the row sharing the `on_conflict` column value.
    ///
    /// Applying the same upsert twice leaves the table as applying it once.
    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Record>,
        on_conflict: &str,
    ) -> StoreResult<Vec<Record>>;

    /// Set the fields in `patch` on every row matching `filters`.
    async fn update(
        &self,
        table: &str,
        patch: Record,
        filters: &[Filter],
    ) -> StoreResult<Vec<Record>>;

    /// Remove every row matching `filters`.
    async fn delete(&self, table: &str, filters: &[Filter]) -> StoreResult<Vec<Record>>;

    /// First row matching `query`, or `None` when nothing matches.
    async fn select_one(&self, table: &str, query: &Query) -> StoreResult<Option<Record>> {
        let rows = self.select(table, &query.clone().limit(1)).await?;
        Ok(rows.into_iter().next())
    }
}
