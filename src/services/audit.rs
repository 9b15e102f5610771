//! Read-only catalogue audits.
//!
//! Audits report; they never write. Id fixes come back as proposals that a
//! maintainer applies one at a time with `recipe rename`.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::domain::errors::DomainResult;
use crate::domain::models::{from_records, Ingredient, Order, Query, Recipe, Subcategory, Table};
use crate::domain::ports::RecordStore;

static KEBAB_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Whether `id` is lower kebab-case.
pub fn is_kebab_case(id: &str) -> bool {
    KEBAB_CASE.is_match(id)
}

/// Suggested kebab-case form of a recipe id.
pub fn propose_kebab_id(id: &str) -> String {
    let lowered = id.to_lowercase().replace('_', "-");
    WHITESPACE_RUN.replace_all(&lowered, "-").into_owned()
}

/// Why a proposed id cannot be applied as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProposalConflict {
    /// Another recipe already has the proposed id.
    ExistingId,
    /// Other non-kebab ids map to the same proposal.
    SharedProposal { with: Vec<String> },
    /// The proposal still is not kebab-case and needs a manual choice.
    StillInvalid,
}

/// A reviewable rename suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameProposal {
    pub current: String,
    pub proposed: String,
    pub conflicts: Vec<ProposalConflict>,
}

impl RenameProposal {
    /// True when the proposal can be applied without further thought.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeIdAudit {
    pub total: usize,
    pub proposals: Vec<RenameProposal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubcategoryAudit {
    pub valid_subcategories: usize,
    pub scanned: usize,
    /// Ingredients with no subcategory at all.
    pub missing: Vec<Ingredient>,
    /// Ingredients pointing at a subcategory id that does not exist.
    pub invalid: Vec<Ingredient>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub distinct_names: usize,
    /// Names matching no ingredient id, sorted.
    pub unmatched: Vec<String>,
}

/// Compute rename proposals for every non-kebab id in `ids`.
pub fn rename_proposals(ids: &[String]) -> Vec<RenameProposal> {
    let existing: HashSet<&str> = ids.iter().map(String::as_str).collect();

    let mut by_proposal: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for id in ids.iter().filter(|id| !is_kebab_case(id)) {
        by_proposal
            .entry(propose_kebab_id(id))
            .or_default()
            .push(id.clone());
    }

    let mut proposals: Vec<RenameProposal> = ids
        .iter()
        .filter(|id| !is_kebab_case(id))
        .map(|id| {
            let proposed = propose_kebab_id(id);
            let mut conflicts = Vec::new();
            if existing.contains(proposed.as_str()) && proposed != *id {
                conflicts.push(ProposalConflict::ExistingId);
            }
            let sharing: Vec<String> = by_proposal
                .get(&proposed)
                .map(|group| group.iter().filter(|other| *other != id).cloned().collect())
                .unwrap_or_default();
            if !sharing.is_empty() {
                conflicts.push(ProposalConflict::SharedProposal { with: sharing });
            }
            if !is_kebab_case(&proposed) {
                conflicts.push(ProposalConflict::StillInvalid);
            }
            RenameProposal {
                current: id.clone(),
                proposed,
                conflicts,
            }
        })
        .collect();
    proposals.sort_by(|a, b| a.current.cmp(&b.current));
    proposals
}

/// Raw ingredient names used by recipes that match no ingredient id.
///
/// Names from both locales are trimmed and lower-cased. A name matches when
/// it equals an id directly or after replacing spaces with underscores.
pub fn unmatched_ingredient_names(
    recipes: &[Recipe],
    ingredient_ids: &HashSet<String>,
) -> CoverageReport {
    let names: BTreeSet<String> = recipes
        .iter()
        .flat_map(|r| r.ingredients.en.iter().chain(r.ingredients.zh.iter()))
        .map(|line| line.name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    let unmatched = names
        .iter()
        .filter(|name| {
            !ingredient_ids.contains(name.as_str())
                && !ingredient_ids.contains(&name.replace(' ', "_"))
        })
        .cloned()
        .collect();

    CoverageReport {
        distinct_names: names.len(),
        unmatched,
    }
}

pub struct AuditService<S: RecordStore> {
    store: Arc<S>,
}

impl<S: RecordStore> AuditService<S> {
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Recipe ids that are not kebab-case, with proposed replacements.
    pub async fn recipe_ids(&self) -> DomainResult<RecipeIdAudit> {
        let rows = self
            .store
            .select(Table::Recipes.as_str(), &Query::new().columns("id"))
            .await?;
        let ids: Vec<String> = rows
            .iter()
            .filter_map(|r| r.get("id").and_then(|v| v.as_str()).map(str::to_string))
            .collect();
        Ok(RecipeIdAudit {
            total: ids.len(),
            proposals: rename_proposals(&ids),
        })
    }

    /// Ingredients with a missing or unknown subcategory.
    pub async fn subcategories(&self) -> DomainResult<SubcategoryAudit> {
        let subcategories: Vec<Subcategory> = from_records(
            self.store
                .select(
                    Table::IngredientSubcategories.as_str(),
                    &Query::new().columns("id"),
                )
                .await?,
        )?;
        let valid: HashSet<String> = subcategories.into_iter().map(|s| s.id).collect();

        let query = Query::new()
            .columns("id, name_en, name_zh, subcategory")
            .order(Order::asc("id"));
        let ingredients: Vec<Ingredient> =
            from_records(self.store.select(Table::Ingredients.as_str(), &query).await?)?;

        let scanned = ingredients.len();
        let mut missing = Vec::new();
        let mut invalid = Vec::new();
        for ingredient in ingredients {
            match ingredient.subcategory.as_deref().map(str::trim) {
                None | Some("") => missing.push(ingredient),
                Some(sub) if !valid.contains(sub) => invalid.push(ingredient),
                Some(_) => {}
            }
        }

        Ok(SubcategoryAudit {
            valid_subcategories: valid.len(),
            scanned,
            missing,
            invalid,
        })
    }

    /// Recipe ingredient names not covered by an ingredient id.
    pub async fn coverage(&self) -> DomainResult<CoverageReport> {
        let recipes: Vec<Recipe> = from_records(
            self.store
                .select(
                    Table::Recipes.as_str(),
                    &Query::new().columns("id, name, ingredients"),
                )
                .await?,
        )?;
        let ids: HashSet<String> = self
            .store
            .select(Table::Ingredients.as_str(), &Query::new().columns("id"))
            .await?
            .iter()
            .filter_map(|r| r.get("id").and_then(|v| v.as_str()).map(str::to_string))
            .collect();
        Ok(unmatched_ingredient_names(&recipes, &ids))
    }

    /// Recipes whose base spirit mentions `term`.
    pub async fn base_spirit(&self, term: &str) -> DomainResult<Vec<Recipe>> {
        let query = Query::new()
            .columns("id, name, base_spirit, ingredients")
            .order(Order::asc("id"));
        let recipes: Vec<Recipe> =
            from_records(self.store.select(Table::Recipes.as_str(), &query).await?)?;
        Ok(recipes
            .into_iter()
            .filter(|r| r.base_spirit.as_ref().is_some_and(|b| b.mentions(term)))
            .collect())
    }
}
