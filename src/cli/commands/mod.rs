//! CLI command implementations.

pub mod audit;
pub mod collection;
pub mod filters;
pub mod ingredient;
pub mod recipe;
pub mod rows;
pub mod sql;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::adapters::PostgrestClient;
use crate::domain::models::{Config, Privilege, Record};
use crate::infrastructure::config::ConfigLoader;

/// What every command receives from `main`: the configuration loaded once
/// for this invocation and the output mode.
pub struct CommandContext {
    config: Config,
    json: bool,
}

impl CommandContext {
    pub const fn new(config: Config, json: bool) -> Self {
        Self { config, json }
    }

    pub const fn json(&self) -> bool {
        self.json
    }

    /// Backend handle holding the key for `privilege`.
    ///
    /// Fails before any request when the endpoint or that key is missing.
    pub fn store(&self, privilege: Privilege) -> Result<Arc<PostgrestClient>> {
        let connection = ConfigLoader::resolve_connection(&self.config, privilege)?;
        debug!(privilege = %privilege, endpoint = %connection.endpoint(), "connecting");
        let client = PostgrestClient::new(&connection, &self.config)?;
        Ok(Arc::new(client))
    }
}

/// Rows from a JSON file holding one object or an array of objects.
pub fn read_rows(path: &Path) -> Result<Vec<Record>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_rows(&raw).with_context(|| format!("Invalid row payload in {}", path.display()))
}

pub(crate) fn parse_rows(raw: &str) -> Result<Vec<Record>> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(row) => Ok(vec![row]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(row) => Ok(row),
                other => bail!("element {index} is not an object: {other}"),
            })
            .collect(),
        other => bail!("expected an object or an array of objects, got {other}"),
    }
}
