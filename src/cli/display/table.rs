//! Table builder wrapper around comfy-table for consistent list display.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use console::style;
use serde_json::Value;

use super::truncate;
use crate::domain::models::query::value_text;
use crate::domain::models::Record;

const MAX_CELL_CHARS: usize = 48;

/// Create a standard list table with the given headers.
///
/// Uses the NOTHING preset (no borders) for a clean CLI aesthetic.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// Render the table to string with a count header.
pub fn render_list(entity_name: &str, table: &Table, total: usize) -> String {
    if total == 0 {
        return format!("No {entity_name}s found.");
    }
    let noun = if total == 1 {
        entity_name.to_string()
    } else {
        format!("{entity_name}s")
    };
    format!("{} {noun}:\n{table}", style(total).bold())
}

/// Table over arbitrary rows. Columns appear in first-seen order.
pub fn records_table(rows: &[Record]) -> Table {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key.as_str());
            }
        }
    }

    let mut table = list_table(&columns);
    for row in rows {
        table.add_row(
            columns
                .iter()
                .map(|column| row.get(*column).map(cell_text).unwrap_or_default()),
        );
    }
    table
}

/// Compact single-line text for one value.
pub fn cell_text(value: &Value) -> String {
    let text = match value {
        Value::Array(_) | Value::Object(_) => value.to_string(),
        Value::Null => String::new(),
        scalar => value_text(scalar),
    };
    truncate(&text, MAX_CELL_CHARS)
}
