//! Ingredient, recipe and collection maintenance.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    from_record, from_records, BaseSpirit, Collection, Filter, Ingredient, Order, Query, Recipe,
    Record, Table,
};
use crate::domain::ports::RecordStore;

const INGREDIENT_SEARCH_COLUMNS: [&str; 3] = ["id", "name_en", "name_zh"];

/// Result of adding aliases to one ingredient.
#[derive(Debug, Clone, Serialize)]
pub struct AliasUpdate {
    pub ingredient: Ingredient,
    /// Aliases that were not already present.
    pub added: Vec<String>,
}

/// What happened to one recipe during a base-spirit swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpiritSwap {
    Updated {
        id: String,
        before: Vec<String>,
        after: Vec<String>,
    },
    Unchanged {
        id: String,
    },
    Missing {
        id: String,
    },
}

/// Outcome of an explicit recipe rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecipeRename {
    Renamed {
        from: String,
        to: String,
        /// Collections whose `recipe_ids` were rewritten.
        collections: Vec<String>,
    },
    SourceMissing {
        id: String,
    },
    TargetExists {
        id: String,
    },
}

pub struct CatalogService<S: RecordStore> {
    store: Arc<S>,
}

impl<S: RecordStore> CatalogService<S> {
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn fetch_one<T>(&self, table: Table, id: &str) -> DomainResult<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let row = self.store.select_one(table.as_str(), &Query::by_id(id)).await?;
        Ok(row.map(from_record::<T>).transpose()?)
    }

    /// One ingredient by id.
    pub async fn ingredient(&self, id: &str) -> DomainResult<Option<Ingredient>> {
        self.fetch_one(Table::Ingredients, id).await
    }

    /// Ingredients whose id or either localized name contains any term,
    /// ignoring case.
    pub async fn search_ingredients(&self, terms: &[String]) -> DomainResult<Vec<Ingredient>> {
        let terms: Vec<&str> = terms
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return Err(DomainError::Validation(
                "at least one search term is required".to_string(),
            ));
        }

        let alternatives = terms.iter().flat_map(|term| {
            INGREDIENT_SEARCH_COLUMNS
                .iter()
                .map(move |column| Filter::contains_ci(*column, term))
        });
        let query = Query::new()
            .columns("id, name_en, name_zh, aliases, category, subcategory")
            .filter(Filter::any(alternatives))
            .order(Order::asc("id"));

        let rows = self.store.select(Table::Ingredients.as_str(), &query).await?;
        debug!(terms = terms.len(), matches = rows.len(), "ingredient search");
        Ok(from_records(rows)?)
    }

    /// Append aliases to an ingredient, skipping ones it already has.
    ///
    /// Returns `None` when the ingredient does not exist. Nothing is written
    /// when every alias is already present.
    pub async fn add_aliases(
        &self,
        id: &str,
        aliases: &[String],
    ) -> DomainResult<Option<AliasUpdate>> {
        let Some(mut ingredient) = self.ingredient(id).await? else {
            return Ok(None);
        };

        let mut added = Vec::new();
        for alias in aliases.iter().map(|a| a.trim()).filter(|a| !a.is_empty()) {
            if !ingredient.aliases.iter().any(|existing| existing == alias) {
                ingredient.aliases.push(alias.to_string());
                added.push(alias.to_string());
            }
        }

        if added.is_empty() {
            return Ok(Some(AliasUpdate { ingredient, added }));
        }

        let patch = record([("aliases", json!(ingredient.aliases))]);
        let rows = self
            .store
            .update(Table::Ingredients.as_str(), patch, &[Filter::eq("id", id)])
            .await?;
        info!(id, added = added.len(), "aliases added");

        let ingredient = match rows.into_iter().next() {
            Some(row) => from_record(row)?,
            None => ingredient,
        };
        Ok(Some(AliasUpdate { ingredient, added }))
    }

    /// Set category, and optionally subcategory, on every listed ingredient.
    pub async fn set_category(
        &self,
        ids: &[String],
        category: &str,
        subcategory: Option<&str>,
    ) -> DomainResult<Vec<Ingredient>> {
        if ids.is_empty() {
            return Err(DomainError::Validation(
                "at least one ingredient id is required".to_string(),
            ));
        }
        if category.trim().is_empty() {
            return Err(DomainError::Validation("category cannot be empty".to_string()));
        }

        let mut patch = record([("category", json!(category.trim()))]);
        if let Some(sub) = subcategory {
            patch.insert("subcategory".to_string(), json!(sub.trim()));
        }
        let rows = self
            .store
            .update(
                Table::Ingredients.as_str(),
                patch,
                &[Filter::is_in("id", ids.iter().map(String::as_str))],
            )
            .await?;
        info!(requested = ids.len(), updated = rows.len(), category, "category set");
        Ok(from_records(rows)?)
    }

    /// One recipe by id.
    pub async fn recipe(&self, id: &str) -> DomainResult<Option<Recipe>> {
        self.fetch_one(Table::Recipes, id).await
    }

    /// Every recipe, ordered by id.
    pub async fn list_recipes(&self, columns: &str) -> DomainResult<Vec<Recipe>> {
        let query = Query::new().columns(columns).order(Order::asc("id"));
        let rows = self.store.select(Table::Recipes.as_str(), &query).await?;
        Ok(from_records(rows)?)
    }

    /// Replace `from` with `to` in each recipe's base spirits.
    ///
    /// `to` is appended when absent even if `from` was not listed. Recipes
    /// that do not exist are reported and skipped.
    pub async fn swap_spirit(
        &self,
        from: &str,
        to: &str,
        ids: &[String],
    ) -> DomainResult<Vec<SpiritSwap>> {
        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            let query = Query::by_id(id.as_str()).columns("id, base_spirit");
            let Some(row) = self.store.select_one(Table::Recipes.as_str(), &query).await? else {
                outcomes.push(SpiritSwap::Missing { id: id.clone() });
                continue;
            };
            let recipe: Recipe = from_record(row)?;

            let before = recipe
                .base_spirit
                .as_ref()
                .map(BaseSpirit::to_vec)
                .unwrap_or_default();
            let mut after: Vec<String> = before.iter().filter(|s| *s != from).cloned().collect();
            if !after.iter().any(|s| s == to) {
                after.push(to.to_string());
            }

            if after == before {
                outcomes.push(SpiritSwap::Unchanged { id: id.clone() });
                continue;
            }

            let patch = record([("base_spirit", json!(after))]);
            self.store
                .update(Table::Recipes.as_str(), patch, &[Filter::eq("id", id.as_str())])
                .await?;
            info!(id = %id, ?before, ?after, "base spirit swapped");
            outcomes.push(SpiritSwap::Updated {
                id: id.clone(),
                before,
                after,
            });
        }
        Ok(outcomes)
    }

    /// Rename a recipe id and rewrite collections that list it.
    ///
    /// Refuses when the source is missing or the target already exists.
    pub async fn rename_recipe(&self, from: &str, to: &str) -> DomainResult<RecipeRename> {
        let (from, to) = (from.trim(), to.trim());
        if from.is_empty() || to.is_empty() || to == from {
            return Err(DomainError::Validation(
                "both ids must be non-empty and differ from each other".to_string(),
            ));
        }

        let recipes = Table::Recipes.as_str();
        let id_only = |id: &str| Query::by_id(id).columns("id");
        if self.store.select_one(recipes, &id_only(from)).await?.is_none() {
            return Ok(RecipeRename::SourceMissing {
                id: from.to_string(),
            });
        }
        if self.store.select_one(recipes, &id_only(to)).await?.is_some() {
            return Ok(RecipeRename::TargetExists { id: to.to_string() });
        }

        self.store
            .update(recipes, record([("id", json!(to))]), &[Filter::eq("id", from)])
            .await?;
        info!(from, to, "recipe renamed");

        let listing = Query::new().columns("id, recipe_ids");
        let collections: Vec<Collection> =
            from_records(self.store.select(Table::Collections.as_str(), &listing).await?)?;
        let mut rewritten = Vec::new();
        for collection in collections
            .into_iter()
            .filter(|c| c.recipe_ids.iter().any(|r| r == from))
        {
            let recipe_ids: Vec<&str> = collection
                .recipe_ids
                .iter()
                .map(|r| if r == from { to } else { r.as_str() })
                .collect();
            self.store
                .update(
                    Table::Collections.as_str(),
                    record([("recipe_ids", json!(recipe_ids))]),
                    &[Filter::eq("id", collection.id.as_str())],
                )
                .await?;
            rewritten.push(collection.id);
        }

        Ok(RecipeRename::Renamed {
            from: from.to_string(),
            to: to.to_string(),
            collections: rewritten,
        })
    }

    /// One collection by id.
    pub async fn collection(&self, id: &str) -> DomainResult<Option<Collection>> {
        self.fetch_one(Table::Collections, id).await
    }

    /// Replace a collection's recipe list. `None` when it does not exist.
    pub async fn set_collection_recipes(
        &self,
        id: &str,
        recipe_ids: &[String],
    ) -> DomainResult<Option<Collection>> {
        let patch = record([("recipe_ids", json!(recipe_ids))]);
        let rows = self
            .store
            .update(Table::Collections.as_str(), patch, &[Filter::eq("id", id)])
            .await?;
        info!(id, recipes = recipe_ids.len(), "collection recipes replaced");
        Ok(rows
            .into_iter()
            .next()
            .map(from_record::<Collection>)
            .transpose()?)
    }
}

fn record<const N: usize>(fields: [(&str, Value); N]) -> Record {
    fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;

    fn row(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    async fn service() -> (MemoryStore, CatalogService<MemoryStore>) {
        let store = MemoryStore::new();
        store
            .seed(
                "ingredients",
                vec![
                    row(json!({"id": "rye_whiskey", "name_en": "Rye Whiskey", "name_zh": "裸麥威士忌", "aliases": ["rye"], "category": "spirit"})),
                    row(json!({"id": "lemon_juice", "name_en": "Lemon Juice", "name_zh": "檸檬汁", "aliases": null, "category": "juice"})),
                ],
            )
            .await;
        store
            .seed(
                "recipes",
                vec![
                    row(json!({"id": "mimosa", "name": {"en": "Mimosa", "zh": "含羞草"}, "base_spirit": ["wine"]})),
                    row(json!({"id": "bellini", "name": {"en": "Bellini", "zh": "貝里尼"}, "base_spirit": "champagne"})),
                ],
            )
            .await;
        store
            .seed(
                "collections",
                vec![row(json!({"id": "brunch", "recipe_ids": ["mimosa", "bellini"]}))],
            )
            .await;
        let service = CatalogService::new(Arc::new(store.clone()));
        (store, service)
    }

    #[tokio::test]
    async fn test_search_matches_any_term_and_column() {
        let (_, service) = service().await;
        let found = service
            .search_ingredients(&["WHISK".to_string(), "檸檬".to_string()])
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["lemon_juice", "rye_whiskey"]);
    }

    #[tokio::test]
    async fn test_search_requires_terms() {
        let (_, service) = service().await;
        assert!(matches!(
            service.search_ingredients(&["  ".to_string()]).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_add_aliases_dedupes_and_keeps_order() {
        let (_, service) = service().await;
        let update = service
            .add_aliases(
                "rye_whiskey",
                &["rye".into(), "rye whisky".into(), "rye whisky".into()],
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(update.added, vec!["rye whisky"]);
        assert_eq!(update.ingredient.aliases, vec!["rye", "rye whisky"]);

        let again = service
            .add_aliases("rye_whiskey", &["rye".into()])
            .await
            .unwrap()
            .unwrap();
        assert!(again.added.is_empty());
    }

    #[tokio::test]
    async fn test_add_aliases_to_missing_ingredient() {
        let (_, service) = service().await;
        assert!(service
            .add_aliases("unicorn_tears", &["magic".into()])
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_set_category_updates_listed_ids() {
        let (_, service) = service().await;
        let updated = service
            .set_category(
                &["lemon_juice".into(), "ghost".into()],
                "fresh_juice",
                Some("citrus"),
            )
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].category.as_deref(), Some("fresh_juice"));
        assert_eq!(updated[0].subcategory.as_deref(), Some("citrus"));
    }

    #[tokio::test]
    async fn test_swap_spirit() {
        let (_, service) = service().await;
        let outcomes = service
            .swap_spirit(
                "wine",
                "champagne",
                &["mimosa".into(), "bellini".into(), "ghost".into()],
            )
            .await
            .unwrap();
        assert_eq!(
            outcomes,
            vec![
                SpiritSwap::Updated {
                    id: "mimosa".into(),
                    before: vec!["wine".into()],
                    after: vec!["champagne".into()],
                },
                SpiritSwap::Unchanged { id: "bellini".into() },
                SpiritSwap::Missing { id: "ghost".into() },
            ]
        );
        let mimosa = service.recipe("mimosa").await.unwrap().unwrap();
        assert_eq!(
            mimosa.base_spirit,
            Some(BaseSpirit::Many(vec!["champagne".into()]))
        );
    }

    #[tokio::test]
    async fn test_rename_recipe_rewrites_collections() {
        let (store, service) = service().await;
        let outcome = service.rename_recipe("mimosa", "classic-mimosa").await.unwrap();
        assert_eq!(
            outcome,
            RecipeRename::Renamed {
                from: "mimosa".into(),
                to: "classic-mimosa".into(),
                collections: vec!["brunch".into()],
            }
        );
        assert!(service.recipe("mimosa").await.unwrap().is_none());
        let brunch = store.rows("collections").await;
        assert_eq!(brunch[0]["recipe_ids"], json!(["classic-mimosa", "bellini"]));
    }

    #[tokio::test]
    async fn test_rename_recipe_refuses_collisions() {
        let (_, service) = service().await;
        assert_eq!(
            service.rename_recipe("mimosa", "bellini").await.unwrap(),
            RecipeRename::TargetExists { id: "bellini".into() }
        );
        assert_eq!(
            service.rename_recipe("ghost", "spirit").await.unwrap(),
            RecipeRename::SourceMissing { id: "ghost".into() }
        );
    }

    #[tokio::test]
    async fn test_rename_recipe_trims_both_ids() {
        let (_, service) = service().await;
        assert!(matches!(
            service.rename_recipe(" mimosa", "mimosa ").await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            service.rename_recipe("  ", "mimosa").await,
            Err(DomainError::Validation(_))
        ));
        assert_eq!(
            service.rename_recipe(" bellini ", "peach-bellini").await.unwrap(),
            RecipeRename::Renamed {
                from: "bellini".into(),
                to: "peach-bellini".into(),
                collections: vec!["brunch".into()],
            }
        );
    }

    #[tokio::test]
    async fn test_set_collection_recipes() {
        let (_, service) = service().await;
        let updated = service
            .set_collection_recipes("brunch", &["bellini".into()])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.recipe_ids, vec!["bellini"]);
        assert!(service
            .set_collection_recipes("nope", &[])
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_mutation_with_read_only_store_is_permission_error() {
        let (store, _) = service().await;
        let restricted = CatalogService::new(Arc::new(store.read_only()));
        let err = restricted
            .set_category(&["lemon_juice".into()], "juice", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Backend(e) if e.is_permission_denied()));
    }
}
