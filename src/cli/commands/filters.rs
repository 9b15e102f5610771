//! Filter flags shared by the generic row commands.

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::Value;

use crate::domain::models::{Filter, Order, Record};

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Equality filter
    #[arg(long = "eq", value_name = "COL=VALUE")]
    pub eq: Vec<String>,

    /// Inequality filter
    #[arg(long = "neq", value_name = "COL=VALUE")]
    pub neq: Vec<String>,

    /// Case-insensitive pattern, `%` and `_` are wildcards
    #[arg(long = "ilike", value_name = "COL=PATTERN")]
    pub ilike: Vec<String>,

    /// Case-sensitive pattern
    #[arg(long = "like", value_name = "COL=PATTERN")]
    pub like: Vec<String>,

    /// Set membership, comma-separated values
    #[arg(long = "in", value_name = "COL=A,B")]
    pub is_in: Vec<String>,

    /// Column is null
    #[arg(long = "is-null", value_name = "COL")]
    pub is_null: Vec<String>,
}

impl FilterArgs {
    pub fn to_filters(&self) -> Result<Vec<Filter>> {
        let mut filters = Vec::new();
        for raw in &self.eq {
            let (column, value) = split_pair(raw)?;
            filters.push(Filter::eq(column, parse_value(value)));
        }
        for raw in &self.neq {
            let (column, value) = split_pair(raw)?;
            filters.push(Filter::neq(column, parse_value(value)));
        }
        for raw in &self.ilike {
            let (column, pattern) = split_pair(raw)?;
            filters.push(Filter::ilike(column, pattern));
        }
        for raw in &self.like {
            let (column, pattern) = split_pair(raw)?;
            filters.push(Filter::like(column, pattern));
        }
        for raw in &self.is_in {
            let (column, values) = split_pair(raw)?;
            filters.push(Filter::is_in(
                column,
                values.split(',').map(str::trim).filter(|v| !v.is_empty()),
            ));
        }
        for column in &self.is_null {
            let column = column.trim();
            if column.is_empty() {
                bail!("--is-null needs a column name");
            }
            filters.push(Filter::is_null(column));
        }
        Ok(filters)
    }
}

/// `col=value` split on the first `=`.
pub fn split_pair(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => Ok((column.trim(), value)),
        _ => bail!("expected COLUMN=VALUE, got '{raw}'"),
    }
}

/// JSON when it parses, otherwise the raw text as a string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// `col` or `col.asc` / `col.desc`.
pub fn parse_order(raw: &str) -> Result<Order> {
    match raw.rsplit_once('.') {
        Some((column, "desc")) if !column.is_empty() => Ok(Order::desc(column)),
        Some((column, "asc")) if !column.is_empty() => Ok(Order::asc(column)),
        _ if !raw.trim().is_empty() => Ok(Order::asc(raw.trim())),
        _ => bail!("order needs a column name"),
    }
}

/// Patch built from repeated `--set col=<json>` flags.
pub fn parse_patch(assignments: &[String]) -> Result<Record> {
    let mut patch = Record::new();
    for raw in assignments {
        let (column, value) =
            split_pair(raw).with_context(|| format!("invalid --set '{raw}'"))?;
        patch.insert(column.to_string(), parse_value(value));
    }
    Ok(patch)
}
