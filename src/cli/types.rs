//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands::audit::AuditArgs;
use super::commands::collection::CollectionArgs;
use super::commands::ingredient::IngredientArgs;
use super::commands::recipe::RecipeArgs;
use super::commands::rows::{
    CheckTablesArgs, DeleteArgs, InsertArgs, SchemaArgs, SelectArgs, UpdateArgs, UpsertArgs,
};
use super::commands::sql::SqlArgs;
use crate::infrastructure::config::LoadOptions;

#[derive(Parser, Debug)]
#[command(name = "barback")]
#[command(about = "Barback - maintenance tooling for the cocktail catalogue backend")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Dotenv file with backend credentials [default: .env.local]
    #[arg(long, global = true, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Do not load any dotenv file
    #[arg(long, global = true, conflicts_with = "env_file")]
    pub no_env_file: bool,

    /// YAML configuration file [default: .barback/config.yaml]
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_file: self.config.clone(),
            env_file: self.env_file.clone(),
            skip_env_file: self.no_env_file,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Select rows from any table
    Select(SelectArgs),

    /// Insert or merge rows on a conflict column
    Upsert(UpsertArgs),

    /// Insert rows; fails on duplicate keys
    Insert(InsertArgs),

    /// Update fields on the rows matching the filters
    Update(UpdateArgs),

    /// Delete the rows matching the filters
    Delete(DeleteArgs),

    /// Report whether tables exist and how many rows they hold
    CheckTables(CheckTablesArgs),

    /// Show the columns of a table from its first row
    Schema(SchemaArgs),

    /// Ingredient maintenance
    Ingredient(IngredientArgs),

    /// Recipe maintenance
    Recipe(RecipeArgs),

    /// Collection maintenance
    Collection(CollectionArgs),

    /// Read-only catalogue audits
    Audit(AuditArgs),

    /// Generate SQL offline
    Sql(SqlArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "barback",
            "check-tables",
            "--json",
            "--env-file",
            "/tmp/creds.env",
        ])
        .unwrap();
        assert!(cli.json);
        let options = cli.load_options();
        assert_eq!(options.env_file, Some(PathBuf::from("/tmp/creds.env")));
        assert!(!options.skip_env_file);
    }

    #[test]
    fn test_env_file_conflicts_with_no_env_file() {
        assert!(Cli::try_parse_from([
            "barback",
            "--no-env-file",
            "--env-file",
            "x.env",
            "check-tables"
        ])
        .is_err());
    }
}
