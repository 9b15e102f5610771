//! Collection CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use super::CommandContext;
use crate::cli::display::{action_success, output, CommandOutput};
use crate::domain::models::{Collection, Privilege};
use crate::services::CatalogService;

#[derive(Args, Debug)]
pub struct CollectionArgs {
    #[command(subcommand)]
    pub command: CollectionCommands,
}

#[derive(Subcommand, Debug)]
pub enum CollectionCommands {
    /// Show one collection
    Show {
        /// Collection id
        id: String,
    },
    /// Replace the recipes in a collection
    SetRecipes {
        /// Collection id
        id: String,
        /// Recipe ids in display order
        recipe_ids: Vec<String>,
    },
}

#[derive(Debug, Serialize)]
pub struct CollectionOutput {
    pub id: String,
    pub collection: Option<Collection>,
    #[serde(skip)]
    pub updated: bool,
}

impl CommandOutput for CollectionOutput {
    fn to_human(&self) -> String {
        let Some(collection) = &self.collection else {
            return format!("Collection '{}' not found.", self.id);
        };
        let header = if self.updated {
            action_success(&format!(
                "Collection '{}' now holds {} recipe(s)",
                collection.id,
                collection.recipe_ids.len()
            ))
        } else {
            format!("Collection: {}", collection.id)
        };
        let mut lines = vec![header];
        if let Some(cover) = &collection.cover_image {
            lines.push(format!("Cover: {cover}"));
        }
        if let Some(cover) = &collection.cover_image_en {
            lines.push(format!("Cover (en): {cover}"));
        }
        lines.push("Recipes:".to_string());
        lines.extend(
            collection
                .recipe_ids
                .iter()
                .enumerate()
                .map(|(i, id)| format!("  {:>2}. {id}", i + 1)),
        );
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.collection).unwrap_or_default()
    }
}

pub async fn execute(args: CollectionArgs, context: &CommandContext) -> Result<()> {
    match args.command {
        CollectionCommands::Show { id } => {
            let service = CatalogService::new(context.store(Privilege::Restricted)?);
            let collection = service
                .collection(&id)
                .await
                .with_context(|| format!("Failed to fetch collection {id}"))?;
            output(
                &CollectionOutput {
                    id,
                    collection,
                    updated: false,
                },
                context.json(),
            );
        }
        CollectionCommands::SetRecipes { id, recipe_ids } => {
            let service = CatalogService::new(context.store(Privilege::Elevated)?);
            let collection = service
                .set_collection_recipes(&id, &recipe_ids)
                .await
                .with_context(|| format!("Failed to update collection {id}"))?;
            output(
                &CollectionOutput {
                    id,
                    collection,
                    updated: true,
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

    #[test]
    fn test_collection_listing_is_numbered() {
        let collection: Collection = serde_json::from_value(serde_json::json!({
            "id": "brunch",
            "recipe_ids": ["mimosa", "bellini"]
        }))
        .unwrap();
        let out = CollectionOutput {
            id: "brunch".into(),
            collection: Some(collection),
            updated: false,
        };
        let human = out.to_human();
        assert!(human.contains(" 1. mimosa"));
        assert!(human.contains(" 2. bellini"));
    }
}
