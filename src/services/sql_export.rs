//! Offline SQL generation for bulk blurhash updates.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde_json::Value;

use crate::domain::errors::{DomainError, DomainResult};

/// Default output file name.
pub const DEFAULT_SQL_FILE: &str = "update_blurhash.sql";

/// Parse a `{"recipe-id": "blurhash", ...}` payload.
pub fn parse_blurhash_payload(json: &str) -> DomainResult<BTreeMap<String, String>> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Object(map) = value else {
        return Err(DomainError::Validation(
            "payload must be a JSON object of id to blurhash".to_string(),
        ));
    };
    map.into_iter()
        .map(|(id, hash)| match hash {
            Value::String(hash) => Ok((id, hash)),
            other => Err(DomainError::Validation(format!(
                "blurhash for '{id}' must be a string, got {other}"
            ))),
        })
        .collect()
}

/// A single `UPDATE ... CASE` statement setting every blurhash, ids sorted.
pub fn blurhash_update_sql(updates: &BTreeMap<String, String>) -> DomainResult<String> {
    if updates.is_empty() {
        return Err(DomainError::Validation(
            "payload contains no blurhash updates".to_string(),
        ));
    }

    let mut sql = String::from("UPDATE recipes SET blurhash = CASE id ");
    let mut ids = Vec::with_capacity(updates.len());
    for (id, hash) in updates {
        let id = quote_literal(id);
        let _ = write!(sql, "WHEN {id} THEN {} ", quote_literal(hash));
        ids.push(id);
    }
    let _ = write!(sql, "END WHERE id IN ({});", ids.join(","));
    Ok(sql)
}

fn quote_literal(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}
