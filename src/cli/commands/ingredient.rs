//! Ingredient CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use super::CommandContext;
use crate::cli::display::{action_success, list_table, output, render_list, truncate, CommandOutput};
use crate::domain::models::{Ingredient, Privilege};
use crate::services::{AliasUpdate, CatalogService};

#[derive(Args, Debug)]
pub struct IngredientArgs {
    #[command(subcommand)]
    pub command: IngredientCommands,
}

#[derive(Subcommand, Debug)]
pub enum IngredientCommands {
    /// Show one ingredient
    Show {
        /// Ingredient id
        id: String,
    },
    /// Search id and both localized names, case-insensitively
    Search {
        /// Search terms; any match is returned
        #[arg(required = true)]
        terms: Vec<String>,
    },
    /// Append aliases, skipping ones already present
    AddAlias {
        /// Ingredient id
        id: String,
        /// Aliases to add
        #[arg(required = true)]
        aliases: Vec<String>,
    },
    /// Set category and subcategory for several ingredients
    SetCategory {
        /// Ingredient ids
        #[arg(required = true)]
        ids: Vec<String>,
        /// New category
        #[arg(short, long)]
        category: String,
        /// New subcategory
        #[arg(short, long)]
        subcategory: Option<String>,
    },
}

#[derive(Debug, Serialize)]
pub struct IngredientDetailOutput {
    pub id: String,
    pub ingredient: Option<Ingredient>,
}

impl CommandOutput for IngredientDetailOutput {
    fn to_human(&self) -> String {
        let Some(ingredient) = &self.ingredient else {
            return format!("Ingredient '{}' not found.", self.id);
        };
        let mut lines = vec![
            format!("Ingredient: {}", ingredient.id),
            format!("Name (en): {}", ingredient.name_en),
            format!("Name (zh): {}", ingredient.name_zh),
            format!(
                "Category: {}",
                ingredient.category.as_deref().unwrap_or("-")
            ),
            format!(
                "Subcategory: {}",
                ingredient.subcategory.as_deref().unwrap_or("-")
            ),
        ];
        if !ingredient.aliases.is_empty() {
            lines.push(format!("Aliases: {}", ingredient.aliases.join(", ")));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.ingredient).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct IngredientListOutput {
    pub ingredients: Vec<Ingredient>,
}

impl CommandOutput for IngredientListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "name_en", "name_zh", "category", "subcategory"]);
        for ingredient in &self.ingredients {
            table.add_row(vec![
                ingredient.id.clone(),
                truncate(&ingredient.name_en, 32),
                truncate(&ingredient.name_zh, 16),
                ingredient.category.clone().unwrap_or_default(),
                ingredient.subcategory.clone().unwrap_or_default(),
            ]);
        }
        render_list("ingredient", &table, self.ingredients.len())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.ingredients).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct AliasOutput {
    pub id: String,
    pub update: Option<AliasUpdate>,
}

impl CommandOutput for AliasOutput {
    fn to_human(&self) -> String {
        match &self.update {
            None => format!("Ingredient '{}' not found.", self.id),
            Some(update) if update.added.is_empty() => {
                format!("No new aliases for '{}'.", self.id)
            }
            Some(update) => action_success(&format!(
                "{}: added {} (aliases now: {})",
                self.id,
                update.added.join(", "),
                update.ingredient.aliases.join(", ")
            )),
        }
    }
}

pub async fn execute(args: IngredientArgs, context: &CommandContext) -> Result<()> {
    match args.command {
        IngredientCommands::Show { id } => {
            let service = CatalogService::new(context.store(Privilege::Restricted)?);
            let ingredient = service
                .ingredient(&id)
                .await
                .with_context(|| format!("Failed to fetch ingredient {id}"))?;
            output(&IngredientDetailOutput { id, ingredient }, context.json());
        }
        IngredientCommands::Search { terms } => {
            let service = CatalogService::new(context.store(Privilege::Restricted)?);
            let ingredients = service
                .search_ingredients(&terms)
                .await
                .context("Failed to search ingredients")?;
            output(&IngredientListOutput { ingredients }, context.json());
        }
        IngredientCommands::AddAlias { id, aliases } => {
            let service = CatalogService::new(context.store(Privilege::Elevated)?);
            let update = service
                .add_aliases(&id, &aliases)
                .await
                .with_context(|| format!("Failed to add aliases to {id}"))?;
            output(&AliasOutput { id, update }, context.json());
        }
        IngredientCommands::SetCategory {
            ids,
            category,
            subcategory,
        } => {
            let service = CatalogService::new(context.store(Privilege::Elevated)?);
            let ingredients = service
                .set_category(&ids, &category, subcategory.as_deref())
                .await
                .context("Failed to set category")?;
            output(&IngredientListOutput { ingredients }, context.json());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let out = IngredientDetailOutput {
            id: "unobtainium".into(),
            ingredient: None,
        };
        assert_eq!(out.to_human(), "Ingredient 'unobtainium' not found.");
        assert_eq!(out.to_json(), serde_json::Value::Null);
    }

    #[test]
    fn test_empty_search_message() {
        let out = IngredientListOutput {
            ingredients: vec![],
        };
        assert_eq!(out.to_human(), "No ingredients found.");
    }
}
