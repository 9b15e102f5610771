//! Store behaviour exercised through the in-memory adapter.

mod common;

use std::sync::Arc;

use barback::domain::models::{Filter, Query};
use barback::services::{AuditService, CatalogService, RecipeRename, SpiritSwap};
use barback::{MemoryStore, RecordStore};
use common::row;
use proptest::prelude::*;
use serde_json::json;

async fn catalogue() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .seed(
            "ingredients",
            vec![
                row(json!({"id": "gin", "name_en": "London Dry Gin", "name_zh": "金酒", "aliases": [], "category": "spirit", "subcategory": "gin"})),
                row(json!({"id": "orange_bitters", "name_en": "Orange Bitters", "name_zh": "橙味苦精", "aliases": ["orange bitter"], "category": "bitters", "subcategory": null})),
                row(json!({"id": "campari", "name_en": "Campari", "name_zh": "金巴利", "aliases": [], "category": "liqueur", "subcategory": "aperitivo"})),
            ],
        )
        .await;
    store
        .seed(
            "ingredient_subcategories",
            vec![row(json!({"id": "gin"})), row(json!({"id": "amaro"}))],
        )
        .await;
    store
        .seed(
            "recipes",
            vec![
                row(json!({
                    "id": "negroni",
                    "name": {"en": "Negroni", "zh": "尼格罗尼"},
                    "base_spirit": ["gin"],
                    "ingredients": {
                        "en": [{"name": "Gin", "amount": "30 ml"}, {"name": "Campari", "amount": "30 ml"}, {"name": "Sweet Vermouth", "amount": "30 ml"}],
                        "zh": [{"name": "金酒", "amount": "30 ml"}]
                    }
                })),
                row(json!({
                    "id": "Mimosa",
                    "name": {"en": "Mimosa", "zh": "含羞草"},
                    "base_spirit": "champagne",
                    "ingredients": {"en": [{"name": "Orange Bitters"}], "zh": []}
                })),
            ],
        )
        .await;
    store
        .seed(
            "collections",
            vec![row(json!({"id": "brunch", "recipe_ids": ["Mimosa"]}))],
        )
        .await;
    store
}

#[tokio::test]
async fn test_filter_on_missing_id_returns_empty() {
    let store = catalogue().await;
    let rows = store
        .select("ingredients", &Query::by_id("unobtainium"))
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_upsert_updates_in_place_and_is_idempotent() {
    let store = catalogue().await;
    let patch = vec![row(json!({"id": "campari", "category": "bitter liqueur"}))];

    store.upsert("ingredients", patch.clone(), "id").await.unwrap();
    let once = store.rows("ingredients").await;
    store.upsert("ingredients", patch, "id").await.unwrap();
    let twice = store.rows("ingredients").await;

    assert_eq!(once, twice);
    assert_eq!(once.len(), 3);
    let campari = once.iter().find(|r| r["id"] == "campari").unwrap();
    assert_eq!(campari["category"], "bitter liqueur");
    // Merge keeps columns the upsert did not name.
    assert_eq!(campari["name_en"], "Campari");
}

#[tokio::test]
async fn test_case_insensitive_substring_on_localized_name() {
    let store = catalogue().await;
    let rows = store
        .select(
            "ingredients",
            &Query::new().filter(Filter::contains_ci("name_en", "ORANGE")),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], "orange_bitters");
}

#[tokio::test]
async fn test_benedictine_upsert_then_select() {
    let store = catalogue().await;
    let benedictine = row(json!({
        "id": "benedictine",
        "name_en": "Bénédictine",
        "category": "liqueur",
        "aliases": ["DOM", "Benedictine D.O.M."]
    }));

    store
        .upsert("ingredients", vec![benedictine.clone()], "id")
        .await
        .unwrap();
    let rows = store
        .select("ingredients", &Query::by_id("benedictine"))
        .await
        .unwrap();

    assert_eq!(rows, vec![benedictine]);
}

#[tokio::test]
async fn test_restricted_handle_cannot_mutate() {
    let store = catalogue().await;
    let restricted = store.read_only();

    assert_eq!(restricted.select("ingredients", &Query::new()).await.unwrap().len(), 3);
    let err = restricted
        .update(
            "ingredients",
            row(json!({"category": "x"})),
            &[Filter::eq("id", "gin")],
        )
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());
    assert_eq!(store.rows("ingredients").await[0]["category"], "spirit");
}

#[tokio::test]
async fn test_catalog_flow() {
    let store = Arc::new(catalogue().await);
    let catalog = CatalogService::new(Arc::clone(&store));

    let found = catalog
        .search_ingredients(&["bitters".to_string()])
        .await
        .unwrap();
    assert_eq!(found.len(), 1);

    let update = catalog
        .add_aliases("gin", &["dry gin".to_string(), "dry gin".to_string()])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(update.added, vec!["dry gin"]);

    let swaps = catalog
        .swap_spirit(
            "champagne",
            "sparkling wine",
            &["Mimosa".to_string(), "ghost".to_string()],
        )
        .await
        .unwrap();
    assert!(matches!(
        &swaps[0],
        SpiritSwap::Updated { after, .. } if after == &vec!["sparkling wine".to_string()]
    ));
    assert_eq!(swaps[1], SpiritSwap::Missing { id: "ghost".into() });

    let rename = catalog.rename_recipe("Mimosa", "mimosa").await.unwrap();
    assert_eq!(
        rename,
        RecipeRename::Renamed {
            from: "Mimosa".into(),
            to: "mimosa".into(),
            collections: vec!["brunch".into()],
        }
    );
    let brunch = catalog.collection("brunch").await.unwrap().unwrap();
    assert_eq!(brunch.recipe_ids, vec!["mimosa"]);
}

#[tokio::test]
async fn test_audits_never_write() {
    let store = Arc::new(catalogue().await);
    let before = store.rows("recipes").await;
    let audit = AuditService::new(Arc::new(store.read_only()));

    let ids = audit.recipe_ids().await.unwrap();
    assert_eq!(ids.total, 2);
    assert_eq!(ids.proposals.len(), 1);
    assert_eq!(ids.proposals[0].proposed, "mimosa");

    let subcategories = audit.subcategories().await.unwrap();
    assert_eq!(subcategories.missing.len(), 1);
    assert_eq!(subcategories.invalid.len(), 1);
    assert_eq!(subcategories.invalid[0].id, "campari");

    let coverage = audit.coverage().await.unwrap();
    assert_eq!(coverage.unmatched, vec!["sweet vermouth", "金酒"]);

    let gin_recipes = audit.base_spirit("gin").await.unwrap();
    assert_eq!(gin_recipes.len(), 1);

    assert_eq!(store.rows("recipes").await, before);
}

proptest! {
    #[test]
    fn prop_ilike_contains_matches_lowercase_contains(
        names in proptest::collection::vec("[A-Za-z ]{0,12}", 1..8),
        needle in "[A-Za-z]{1,3}",
    ) {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let rows = names
                .iter()
                .enumerate()
                .map(|(i, name)| row(json!({"id": i.to_string(), "name_en": name})))
                .collect();
            store.seed("ingredients", rows).await;

            let query = Query::new().filter(Filter::contains_ci("name_en", &needle));
            let selected = store.select("ingredients", &query).await.unwrap();
            let expected = names
                .iter()
                .filter(|n| n.to_lowercase().contains(&needle.to_lowercase()))
                .count();
            prop_assert_eq!(selected.len(), expected);
            Ok(())
        })?;
    }
}
