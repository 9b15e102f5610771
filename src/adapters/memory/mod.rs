//! In-process record store.
//!
//! Evaluates the same [`Filter`] values the HTTP adapter sends, so services
//! can be exercised without a backend. Rows are keyed by their `id` column
//! for plain inserts.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::models::query::value_text;
use crate::domain::models::{Direction, Filter, Query, Record, Table};
use crate::domain::ports::RecordStore;
use crate::domain::{BackendError, StoreResult};

/// Record store backed by a map of table name to rows.
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, Vec<Record>>>>,
    read_only: bool,
}

impl MemoryStore {
    /// Store holding the four catalogue tables, all empty.
    pub fn new() -> Self {
        let tables = Table::ALL
            .into_iter()
            .map(|t| (t.as_str().to_string(), Vec::new()))
            .collect();
        Self {
            tables: Arc::new(RwLock::new(tables)),
            read_only: false,
        }
    }

    /// Handle sharing the same tables that rejects every mutation the way a
    /// row-level policy rejects the restricted key.
    #[must_use]
    pub fn read_only(&self) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
            read_only: true,
        }
    }

    /// Replace the contents of `table`, creating it if needed.
    pub async fn seed(&self, table: &str, rows: Vec<Record>) {
        let mut tables = self.tables.write().await;
        tables.insert(table.to_string(), rows);
    }

    /// Snapshot of every row in `table`.
    pub async fn rows(&self, table: &str) -> Vec<Record> {
        let tables = self.tables.read().await;
        tables.get(table).cloned().unwrap_or_default()
    }

    fn check_writable(&self, table: &str) -> StoreResult<()> {
        if self.read_only {
            return Err(BackendError::PermissionDenied {
                status: 401,
                message: format!(
                    "new row violates row-level security policy for table \"{table}\""
                ),
            });
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn missing_table(table: &str) -> BackendError {
    BackendError::NotFound(format!("relation \"public.{table}\" does not exist"))
}

fn require_filters(operation: &'static str, table: &str, filters: &[Filter]) -> StoreResult<()> {
    if filters.is_empty() {
        return Err(BackendError::UnfilteredMutation {
            operation,
            table: table.to_string(),
        });
    }
    Ok(())
}

fn matches_all(filters: &[Filter], row: &Record) -> bool {
    filters.iter().all(|f| f.matches(row))
}

/// Ascending order with nulls last.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => value_text(x).cmp(&value_text(y)),
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> StoreResult<Vec<Record>> {
        let tables = self.tables.read().await;
        let rows = tables.get(table).ok_or_else(|| missing_table(table))?;
        let mut selected: Vec<&Record> = rows.iter().filter(|r| query.matches(r)).collect();
        if let Some(order) = &query.order {
            selected.sort_by(|a, b| {
                let ord = compare(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(selected
            .into_iter()
            .take(limit)
            .map(|r| query.project(r))
            .collect())
    }

    async fn count(&self, table: &str, filters: &[Filter]) -> StoreResult<u64> {
        let tables = self.tables.read().await;
        let rows = tables.get(table).ok_or_else(|| missing_table(table))?;
        Ok(rows.iter().filter(|r| matches_all(filters, r)).count() as u64)
    }

    async fn insert(&self, table: &str, rows: Vec<Record>) -> StoreResult<Vec<Record>> {
        self.check_writable(table)?;
        let mut tables = self.tables.write().await;
        let existing = tables.get_mut(table).ok_or_else(|| missing_table(table))?;

        let mut seen: Vec<&Value> = existing.iter().filter_map(|r| r.get("id")).collect();
        for row in &rows {
            if let Some(id) = row.get("id") {
                if seen.contains(&id) {
                    return Err(BackendError::Conflict(format!(
                        "duplicate key value violates unique constraint \"{table}_pkey\" (Key (id)=({}) already exists.)",
                        value_text(id)
                    )));
                }
                seen.push(id);
            }
        }
        existing.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Record>,
        on_conflict: &str,
    ) -> StoreResult<Vec<Record>> {
        self.check_writable(table)?;
        if let Some(row) = rows.iter().find(|r| r.get(on_conflict).is_none()) {
            return Err(BackendError::BadRequest(format!(
                "upsert row is missing conflict column '{on_conflict}': {}",
                Value::Object(row.clone())
            )));
        }

        let mut tables = self.tables.write().await;
        let existing = tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        let mut written = Vec::with_capacity(rows.len());
        for row in rows {
            let key = row.get(on_conflict);
            match existing.iter_mut().find(|r| r.get(on_conflict) == key) {
                Some(current) => {
                    for (field, value) in row {
                        current.insert(field, value);
                    }
                    written.push(current.clone());
                }
                None => {
                    existing.push(row.clone());
                    written.push(row);
                }
            }
        }
        Ok(written)
    }

    async fn update(
        &self,
        table: &str,
        patch: Record,
        filters: &[Filter],
    ) -> StoreResult<Vec<Record>> {
        require_filters("update", table, filters)?;
        self.check_writable(table)?;
        let mut tables = self.tables.write().await;
        let rows = tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|r| matches_all(filters, r)) {
            for (field, value) in &patch {
                row.insert(field.clone(), value.clone());
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> StoreResult<Vec<Record>> {
        require_filters("delete", table, filters)?;
        self.check_writable(table)?;
        let mut tables = self.tables.write().await;
        let rows = tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        let (removed, kept): (Vec<Record>, Vec<Record>) = rows
            .drain(..)
            .partition(|r| matches_all(filters, r));
        *rows = kept;
        Ok(removed)
    }
}
