//! Recipe CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use super::CommandContext;
use crate::cli::display::{
    action_failure, action_skipped, action_success, list_table, output, render_list, truncate,
    CommandOutput,
};
use crate::domain::models::query::value_text;
use crate::domain::models::{Privilege, Recipe};
use crate::services::{CatalogService, RecipeRename, SpiritSwap};

#[derive(Args, Debug)]
pub struct RecipeArgs {
    #[command(subcommand)]
    pub command: RecipeCommands,
}

#[derive(Subcommand, Debug)]
pub enum RecipeCommands {
    /// Show one recipe
    Show {
        /// Recipe id
        id: String,
    },
    /// List recipes ordered by id
    List {
        /// Comma-separated column list
        #[arg(short, long, default_value = "id, name, base_spirit")]
        columns: String,
    },
    /// Replace one base spirit with another on the given recipes
    SwapSpirit {
        /// Spirit to remove
        #[arg(long)]
        from: String,
        /// Spirit to add
        #[arg(long)]
        to: String,
        /// Recipe ids
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Rename a recipe id and the collections that reference it
    Rename {
        /// Current id
        from: String,
        /// New id
        to: String,
    },
}

#[derive(Debug, Serialize)]
pub struct RecipeDetailOutput {
    pub id: String,
    pub recipe: Option<Recipe>,
}

impl CommandOutput for RecipeDetailOutput {
    fn to_human(&self) -> String {
        let Some(recipe) = &self.recipe else {
            return format!("Recipe '{}' not found.", self.id);
        };
        let mut lines = vec![
            format!("Recipe: {}", recipe.id),
            format!("Name (en): {}", recipe.name.en),
            format!("Name (zh): {}", recipe.name.zh),
            format!(
                "Base spirit: {}",
                recipe
                    .base_spirit
                    .as_ref()
                    .map_or_else(|| "-".to_string(), ToString::to_string)
            ),
        ];
        if let Some(blurhash) = &recipe.blurhash {
            lines.push(format!("Blurhash: {blurhash}"));
        }
        if !recipe.ingredients.en.is_empty() {
            lines.push("\nIngredients:".to_string());
            for line in &recipe.ingredients.en {
                match &line.amount {
                    Some(amount) => {
                        lines.push(format!("  - {} ({})", line.name, value_text(amount)));
                    }
                    None => lines.push(format!("  - {}", line.name)),
                }
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.recipe).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeListOutput {
    pub recipes: Vec<Recipe>,
}

impl CommandOutput for RecipeListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "name_en", "name_zh", "base_spirit"]);
        for recipe in &self.recipes {
            table.add_row(vec![
                recipe.id.clone(),
                truncate(&recipe.name.en, 32),
                truncate(&recipe.name.zh, 16),
                recipe
                    .base_spirit
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            ]);
        }
        render_list("recipe", &table, self.recipes.len())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.recipes).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct SwapOutput {
    pub from: String,
    pub to: String,
    pub results: Vec<SpiritSwap>,
}

impl CommandOutput for SwapOutput {
    fn to_human(&self) -> String {
        let mut lines: Vec<String> = self
            .results
            .iter()
            .map(|result| match result {
                SpiritSwap::Updated { id, before, after } => action_success(&format!(
                    "{id}: {} -> {}",
                    before.join(", "),
                    after.join(", ")
                )),
                SpiritSwap::Unchanged { id } => action_skipped(&format!("{id}: unchanged")),
                SpiritSwap::Missing { id } => {
                    action_failure(&format!("{id}: not found, skipped"))
                }
            })
            .collect();
        let updated = self
            .results
            .iter()
            .filter(|r| matches!(r, SpiritSwap::Updated { .. }))
            .count();
        lines.push(format!(
            "\n{updated} of {} recipe(s) moved from '{}' to '{}'.",
            self.results.len(),
            self.from,
            self.to
        ));
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct RenameOutput {
    pub result: RecipeRename,
}

impl CommandOutput for RenameOutput {
    fn to_human(&self) -> String {
        match &self.result {
            RecipeRename::Renamed {
                from,
                to,
                collections,
            } => {
                let mut message = action_success(&format!("Renamed '{from}' to '{to}'"));
                if !collections.is_empty() {
                    message.push_str(&format!(
                        "\n  updated collections: {}",
                        collections.join(", ")
                    ));
                }
                message
            }
            RecipeRename::SourceMissing { id } => {
                action_failure(&format!("Recipe '{id}' not found; nothing renamed."))
            }
            RecipeRename::TargetExists { id } => {
                action_failure(&format!("Recipe '{id}' already exists; nothing renamed."))
            }
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.result).unwrap_or_default()
    }
}

pub async fn execute(args: RecipeArgs, context: &CommandContext) -> Result<()> {
    match args.command {
        RecipeCommands::Show { id } => {
            let service = CatalogService::new(context.store(Privilege::Restricted)?);
            let recipe = service
                .recipe(&id)
                .await
                .with_context(|| format!("Failed to fetch recipe {id}"))?;
            output(&RecipeDetailOutput { id, recipe }, context.json());
        }
        RecipeCommands::List { columns } => {
            let service = CatalogService::new(context.store(Privilege::Restricted)?);
            let recipes = service
                .list_recipes(&columns)
                .await
                .context("Failed to list recipes")?;
            output(&RecipeListOutput { recipes }, context.json());
        }
        RecipeCommands::SwapSpirit { from, to, ids } => {
            let service = CatalogService::new(context.store(Privilege::Elevated)?);
            let results = service
                .swap_spirit(&from, &to, &ids)
                .await
                .context("Failed to swap base spirit")?;
            output(&SwapOutput { from, to, results }, context.json());
        }
        RecipeCommands::Rename { from, to } => {
            let service = CatalogService::new(context.store(Privilege::Elevated)?);
            let result = service
                .rename_recipe(&from, &to)
                .await
                .with_context(|| format!("Failed to rename recipe {from}"))?;
            output(&RenameOutput { result }, context.json());
        }
    }
    Ok(())
}
