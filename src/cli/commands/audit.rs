//! Read-only audit commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use super::CommandContext;
use crate::cli::display::{action_success, list_table, output, render_list, CommandOutput};
use crate::domain::models::{Ingredient, Privilege, Recipe};
use crate::services::{
    AuditService, CoverageReport, ProposalConflict, RecipeIdAudit, SubcategoryAudit,
};

#[derive(Args, Debug)]
pub struct AuditArgs {
    #[command(subcommand)]
    pub command: AuditCommands,
}

#[derive(Subcommand, Debug)]
pub enum AuditCommands {
    /// Recipe ids that are not kebab-case, with proposed renames
    RecipeIds,
    /// Ingredients with a missing or unknown subcategory
    Subcategories,
    /// Recipe ingredient names that match no ingredient id
    Coverage,
    /// Recipes whose base spirit mentions a term
    BaseSpirit {
        /// Text to look for
        term: String,
    },
}

impl CommandOutput for RecipeIdAudit {
    fn to_human(&self) -> String {
        if self.proposals.is_empty() {
            return action_success(&format!("All {} recipe ids are kebab-case.", self.total));
        }
        let mut table = list_table(&["current", "proposed", "conflicts"]);
        for proposal in &self.proposals {
            let conflicts = proposal
                .conflicts
                .iter()
                .map(|conflict| match conflict {
                    ProposalConflict::ExistingId => "id already exists".to_string(),
                    ProposalConflict::SharedProposal { with } => {
                        format!("same proposal as {}", with.join(", "))
                    }
                    ProposalConflict::StillInvalid => "needs a manual id".to_string(),
                })
                .collect::<Vec<_>>()
                .join("; ");
            table.add_row(vec![proposal.current.clone(), proposal.proposed.clone(), conflicts]);
        }
        let clean = self.proposals.iter().filter(|p| p.is_clean()).count();
        format!(
            "{}\n\n{clean} proposal(s) can be applied with `barback recipe rename <current> <proposed>`.",
            render_list("non-kebab id", &table, self.proposals.len())
        )
    }
}

fn ingredient_line(ingredient: &Ingredient) -> String {
    format!(
        "[{}] {} ({}) -> '{}'",
        ingredient.id,
        ingredient.name_en,
        ingredient.name_zh,
        ingredient.subcategory.as_deref().unwrap_or_default()
    )
}

impl CommandOutput for SubcategoryAudit {
    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "Scanned {} ingredients against {} subcategories.",
            self.scanned, self.valid_subcategories
        )];
        lines.push(format!("\nMissing subcategory ({}):", self.missing.len()));
        lines.extend(self.missing.iter().map(ingredient_line));
        lines.push(format!("\nUnknown subcategory ({}):", self.invalid.len()));
        lines.extend(self.invalid.iter().map(ingredient_line));
        lines.join("\n")
    }
}

impl CommandOutput for CoverageReport {
    fn to_human(&self) -> String {
        if self.unmatched.is_empty() {
            return action_success(&format!(
                "All {} ingredient names match an ingredient id.",
                self.distinct_names
            ));
        }
        let mut lines = vec![format!(
            "{} of {} distinct ingredient names match no ingredient id:",
            self.unmatched.len(),
            self.distinct_names
        )];
        lines.extend(self.unmatched.iter().map(|name| format!("  - {name}")));
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct BaseSpiritOutput {
    pub term: String,
    pub recipes: Vec<Recipe>,
}

impl CommandOutput for BaseSpiritOutput {
    fn to_human(&self) -> String {
        if self.recipes.is_empty() {
            return format!("No recipes with base spirit '{}'.", self.term);
        }
        let mut lines = vec![format!(
            "{} recipe(s) with base spirit '{}':",
            self.recipes.len(),
            self.term
        )];
        for recipe in &self.recipes {
            let spirit = recipe
                .base_spirit
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            lines.push(format!("\n{} ({}) [{spirit}]", recipe.id, recipe.name.en));
            lines.extend(
                recipe
                    .ingredients
                    .en
                    .iter()
                    .map(|line| format!("  - {}", line.name)),
            );
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.recipes).unwrap_or_default()
    }
}

pub async fn execute(args: AuditArgs, context: &CommandContext) -> Result<()> {
    let service = AuditService::new(context.store(Privilege::Restricted)?);
    match args.command {
        AuditCommands::RecipeIds => {
            let audit = service
                .recipe_ids()
                .await
                .context("Failed to audit recipe ids")?;
            output(&audit, context.json());
        }
        AuditCommands::Subcategories => {
            let audit = service
                .subcategories()
                .await
                .context("Failed to audit subcategories")?;
            output(&audit, context.json());
        }
        AuditCommands::Coverage => {
            let report = service
                .coverage()
                .await
                .context("Failed to audit ingredient coverage")?;
            output(&report, context.json());
        }
        AuditCommands::BaseSpirit { term } => {
            let recipes = service
                .base_spirit(&term)
                .await
                .context("Failed to search base spirits")?;
            output(&BaseSpiritOutput { term, recipes }, context.json());
        }
    }
    Ok(())
}
