//! Offline SQL generation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use tracing::info;

use super::CommandContext;
use crate::cli::display::{action_success, output, CommandOutput};
use crate::services::{blurhash_update_sql, parse_blurhash_payload, DEFAULT_SQL_FILE};

#[derive(Args, Debug)]
pub struct SqlArgs {
    #[command(subcommand)]
    pub command: SqlCommands,
}

#[derive(Subcommand, Debug)]
pub enum SqlCommands {
    /// Write one UPDATE statement setting recipe blurhashes
    Blurhash {
        /// JSON object mapping recipe id to blurhash
        payload: PathBuf,
        /// Output file
        #[arg(short, long, default_value = DEFAULT_SQL_FILE)]
        output: PathBuf,
    },
}

#[derive(Debug, Serialize)]
pub struct SqlOutput {
    pub path: PathBuf,
    pub recipes: usize,
}

impl CommandOutput for SqlOutput {
    fn to_human(&self) -> String {
        action_success(&format!(
            "SQL written to {} ({} recipes)",
            self.path.display(),
            self.recipes
        ))
    }
}

/// Runs without backend credentials.
pub async fn execute(args: SqlArgs, context: &CommandContext) -> Result<()> {
    match args.command {
        SqlCommands::Blurhash { payload, output: path } => {
            let raw = tokio::fs::read_to_string(&payload)
                .await
                .with_context(|| format!("Failed to read {}", payload.display()))?;
            let updates = parse_blurhash_payload(&raw)
                .with_context(|| format!("Invalid blurhash payload in {}", payload.display()))?;
            let sql = blurhash_update_sql(&updates)?;
            tokio::fs::write(&path, format!("{sql}\n"))
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), recipes = updates.len(), "wrote blurhash sql");
            output(
                &SqlOutput {
                    path,
                    recipes: updates.len(),
                },
                context.json(),
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Config;

    #[tokio::test]
    async fn test_blurhash_writes_statement_file() {
        let dir = tempfile::tempdir().unwrap();
        let payload = dir.path().join("blurhash.json");
        let out = dir.path().join("out.sql");
        std::fs::write(&payload, r#"{"negroni": "LKO2?U%2Tw=w"}"#).unwrap();

        let context = CommandContext::new(Config::default(), true);
        execute(
            SqlArgs {
                command: SqlCommands::Blurhash {
                    payload,
                    output: out.clone(),
                },
            },
            &context,
        )
        .await
        .unwrap();

        let sql = std::fs::read_to_string(out).unwrap();
        assert_eq!(
            sql.trim_end(),
            "UPDATE recipes SET blurhash = CASE id WHEN 'negroni' THEN 'LKO2?U%2Tw=w' END WHERE id IN ('negroni');"
        );
    }
}
