//! Table checks and generic row access.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Filter, Query, Record};
use crate::domain::ports::RecordStore;

/// Result of probing one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableStatus {
    Exists { table: String, rows: u64 },
    Unavailable { table: String, reason: String },
}

/// Column names and one sample row.
#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<String>,
    pub sample: Record,
}

pub struct TableService<S: RecordStore> {
    store: Arc<S>,
}

impl<S: RecordStore> TableService<S> {
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Count rows in each table. A table that is missing or blocked by
    /// row-level policy is reported, not treated as a failure.
    pub async fn check_tables(&self, tables: &[String]) -> Vec<TableStatus> {
        let mut statuses = Vec::with_capacity(tables.len());
        for table in tables {
            let status = match self.store.count(table, &[]).await {
                Ok(rows) => TableStatus::Exists {
                    table: table.clone(),
                    rows,
                },
                Err(err) => {
                    debug!(table = %table, error = %err, "table check failed");
                    TableStatus::Unavailable {
                        table: table.clone(),
                        reason: err.to_string(),
                    }
                }
            };
            statuses.push(status);
        }
        statuses
    }

    /// Columns of the first row, or `None` when the table is empty.
    pub async fn schema(&self, table: &str) -> DomainResult<Option<TableSchema>> {
        let sample = self.store.select_one(table, &Query::new()).await?;
        Ok(sample.map(|sample| TableSchema {
            table: table.to_string(),
            columns: sample.keys().cloned().collect(),
            sample,
        }))
    }

    pub async fn select(&self, table: &str, query: &Query) -> DomainResult<Vec<Record>> {
        Ok(self.store.select(table, query).await?)
    }

    pub async fn insert(&self, table: &str, rows: Vec<Record>) -> DomainResult<Vec<Record>> {
        Ok(self.store.insert(table, rows).await?)
    }

    pub async fn upsert(
        &self,
        table: &str,
        rows: Vec<Record>,
        on_conflict: &str,
    ) -> DomainResult<Vec<Record>> {
        if on_conflict.trim().is_empty() {
            return Err(DomainError::Validation(
                "conflict column cannot be empty".to_string(),
            ));
        }
        Ok(self.store.upsert(table, rows, on_conflict).await?)
    }

    pub async fn update(
        &self,
        table: &str,
        patch: Record,
        filters: &[Filter],
    ) -> DomainResult<Vec<Record>> {
        if patch.is_empty() {
            return Err(DomainError::Validation("nothing to update".to_string()));
        }
        Ok(self.store.update(table, patch, filters).await?)
    }

    pub async fn delete(&self, table: &str, filters: &[Filter]) -> DomainResult<Vec<Record>> {
        Ok(self.store.delete(table, filters).await?)
    }
}
