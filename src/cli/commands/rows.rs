//! Generic row commands: select, insert, upsert, update, delete, and the
//! table checks.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use super::filters::{parse_order, parse_patch, FilterArgs};
use super::{read_rows, CommandContext};
use crate::cli::display::{
    action_failure, action_success, output, records_table, CommandOutput,
};
use crate::domain::models::{Privilege, Query, Record, Table};
use crate::services::{TableSchema, TableService, TableStatus};

#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Table name
    pub table: String,

    /// Comma-separated column list
    #[arg(short, long, default_value = "*")]
    pub columns: String,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Maximum number of rows
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Sort column, optionally suffixed with `.asc` or `.desc`
    #[arg(short, long)]
    pub order: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpsertArgs {
    /// Table name
    pub table: String,

    /// JSON file with one object or an array of objects
    #[arg(short, long)]
    pub file: PathBuf,

    /// Column that identifies existing rows
    #[arg(long, default_value = "id")]
    pub on_conflict: String,
}

#[derive(Args, Debug)]
pub struct InsertArgs {
    /// Table name
    pub table: String,

    /// JSON file with one object or an array of objects
    #[arg(short, long)]
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Table name
    pub table: String,

    /// Field assignment; the value is parsed as JSON, falling back to text
    #[arg(long = "set", value_name = "COL=VALUE", required = true)]
    pub set: Vec<String>,

    #[command(flatten)]
    pub filters: FilterArgs,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Table name
    pub table: String,

    #[command(flatten)]
    pub filters: FilterArgs,
}

#[derive(Args, Debug)]
pub struct CheckTablesArgs {
    /// Tables to check; defaults to the catalogue tables
    pub tables: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Table name
    pub table: String,
}

#[derive(Debug, Serialize)]
pub struct RowsOutput {
    pub table: String,
    pub rows: Vec<Record>,
}

impl CommandOutput for RowsOutput {
    fn to_human(&self) -> String {
        if self.rows.is_empty() {
            return "No rows found.".to_string();
        }
        format!(
            "{} row(s) from {}:\n{}",
            self.rows.len(),
            self.table,
            records_table(&self.rows)
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.rows).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct MutationOutput {
    pub action: &'static str,
    pub table: String,
    pub rows: Vec<Record>,
}

impl CommandOutput for MutationOutput {
    fn to_human(&self) -> String {
        let summary = action_success(&format!(
            "{} {} row(s) in {}",
            self.action,
            self.rows.len(),
            self.table
        ));
        if self.rows.is_empty() {
            summary
        } else {
            format!("{summary}\n{}", records_table(&self.rows))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TableStatusOutput {
    pub tables: Vec<TableStatus>,
}

impl CommandOutput for TableStatusOutput {
    fn to_human(&self) -> String {
        self.tables
            .iter()
            .map(|status| match status {
                TableStatus::Exists { table, rows } => {
                    action_success(&format!("Table '{table}': exists ({rows} rows)"))
                }
                TableStatus::Unavailable { table, reason } => {
                    action_failure(&format!("Table '{table}': not found / blocked ({reason})"))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct SchemaOutput {
    pub table: String,
    pub schema: Option<TableSchema>,
}

impl CommandOutput for SchemaOutput {
    fn to_human(&self) -> String {
        let Some(schema) = &self.schema else {
            return "Table is empty.".to_string();
        };
        let mut lines = vec![format!("Columns of {}:", self.table)];
        lines.extend(schema.columns.iter().map(|c| format!("  - {c}")));
        lines.push(String::new());
        lines.push("Sample row:".to_string());
        lines.push(serde_json::to_string_pretty(&schema.sample).unwrap_or_default());
        lines.join("\n")
    }
}

pub async fn select(args: SelectArgs, context: &CommandContext) -> Result<()> {
    let mut query = Query::new().columns(&args.columns);
    for filter in args.filters.to_filters()? {
        query = query.filter(filter);
    }
    if let Some(order) = args.order.as_deref() {
        query = query.order(parse_order(order)?);
    }
    if let Some(limit) = args.limit {
        query = query.limit(limit);
    }

    let service = TableService::new(context.store(Privilege::Restricted)?);
    let rows = service
        .select(&args.table, &query)
        .await
        .with_context(|| format!("Failed to select from {}", args.table))?;
    output(
        &RowsOutput {
            table: args.table,
            rows,
        },
        context.json(),
    );
    Ok(())
}

pub async fn upsert(args: UpsertArgs, context: &CommandContext) -> Result<()> {
    let rows = read_rows(&args.file)?;
    let service = TableService::new(context.store(Privilege::Elevated)?);
    let rows = service
        .upsert(&args.table, rows, &args.on_conflict)
        .await
        .with_context(|| format!("Failed to upsert into {}", args.table))?;
    info!(table = %args.table, rows = rows.len(), "upserted rows");
    output(
        &MutationOutput {
            action: "Upserted",
            table: args.table,
            rows,
        },
        context.json(),
    );
    Ok(())
}

pub async fn insert(args: InsertArgs, context: &CommandContext) -> Result<()> {
    let rows = read_rows(&args.file)?;
    let service = TableService::new(context.store(Privilege::Elevated)?);
    let rows = service
        .insert(&args.table, rows)
        .await
        .with_context(|| format!("Failed to insert into {}", args.table))?;
    info!(table = %args.table, rows = rows.len(), "inserted rows");
    output(
        &MutationOutput {
            action: "Inserted",
            table: args.table,
            rows,
        },
        context.json(),
    );
    Ok(())
}

pub async fn update(args: UpdateArgs, context: &CommandContext) -> Result<()> {
    let patch = parse_patch(&args.set)?;
    let filters = args.filters.to_filters()?;
    let service = TableService::new(context.store(Privilege::Elevated)?);
    let rows = service
        .update(&args.table, patch, &filters)
        .await
        .with_context(|| format!("Failed to update {}", args.table))?;
    info!(table = %args.table, rows = rows.len(), "updated rows");
    output(
        &MutationOutput {
            action: "Updated",
            table: args.table,
            rows,
        },
        context.json(),
    );
    Ok(())
}

pub async fn delete(args: DeleteArgs, context: &CommandContext) -> Result<()> {
    let filters = args.filters.to_filters()?;
    let service = TableService::new(context.store(Privilege::Elevated)?);
    let rows = service
        .delete(&args.table, &filters)
        .await
        .with_context(|| format!("Failed to delete from {}", args.table))?;
    info!(table = %args.table, rows = rows.len(), "deleted rows");
    output(
        &MutationOutput {
            action: "Deleted",
            table: args.table,
            rows,
        },
        context.json(),
    );
    Ok(())
}

pub async fn check_tables(args: CheckTablesArgs, context: &CommandContext) -> Result<()> {
    let tables = if args.tables.is_empty() {
        Table::ALL.iter().map(|t| t.as_str().to_string()).collect()
    } else {
        args.tables
    };
    let service = TableService::new(context.store(Privilege::Restricted)?);
    let tables = service.check_tables(&tables).await;
    output(&TableStatusOutput { tables }, context.json());
    Ok(())
}

pub async fn schema(args: SchemaArgs, context: &CommandContext) -> Result<()> {
    let service = TableService::new(context.store(Privilege::Restricted)?);
    let schema = service
        .schema(&args.table)
        .await
        .with_context(|| format!("Failed to read {}", args.table))?;
    output(
        &SchemaOutput {
            table: args.table,
            schema,
        },
        context.json(),
    );
    Ok(())
}
