use barback::cli::commands::ingredient::IngredientCommands;
use barback::cli::commands::recipe::RecipeCommands;
use barback::cli::commands::sql::SqlCommands;
use barback::cli::{Cli, Commands};
use barback::domain::models::Filter;
use clap::Parser;

#[test]
fn test_parse_select_with_filters() {
    let cli = Cli::try_parse_from([
        "barback",
        "select",
        "ingredients",
        "--columns",
        "id,name_en",
        "--eq",
        "category=liqueur",
        "--ilike",
        "name_en=%gin%",
        "--limit",
        "10",
        "--order",
        "name_en.desc",
    ])
    .unwrap();

    match cli.command {
        Commands::Select(args) => {
            assert_eq!(args.table, "ingredients");
            assert_eq!(args.columns, "id,name_en");
            assert_eq!(args.limit, Some(10));
            assert_eq!(args.order.as_deref(), Some("name_en.desc"));
            let filters = args.filters.to_filters().unwrap();
            assert_eq!(
                filters,
                vec![
                    Filter::eq("category", "liqueur"),
                    Filter::ilike("name_en", "%gin%")
                ]
            );
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_update_requires_set() {
    assert!(Cli::try_parse_from(["barback", "update", "recipes", "--eq", "id=a"]).is_err());

    let cli = Cli::try_parse_from([
        "barback",
        "update",
        "recipes",
        "--set",
        "blurhash=\"LKO2\"",
        "--eq",
        "id=negroni",
    ])
    .unwrap();
    assert!(matches!(cli.command, Commands::Update(_)));
}

#[test]
fn test_parse_upsert_defaults_conflict_column() {
    let cli = Cli::try_parse_from(["barback", "upsert", "ingredients", "--file", "rows.json"])
        .unwrap();
    match cli.command {
        Commands::Upsert(args) => assert_eq!(args.on_conflict, "id"),
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_check_tables_without_names() {
    let cli = Cli::try_parse_from(["barback", "check-tables"]).unwrap();
    match cli.command {
        Commands::CheckTables(args) => assert!(args.tables.is_empty()),
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_ingredient_set_category() {
    let cli = Cli::try_parse_from([
        "barback",
        "ingredient",
        "set-category",
        "st-germain",
        "chartreuse",
        "--category",
        "liqueur",
        "--subcategory",
        "herbal",
    ])
    .unwrap();

    match cli.command {
        Commands::Ingredient(args) => match args.command {
            IngredientCommands::SetCategory {
                ids,
                category,
                subcategory,
            } => {
                assert_eq!(ids, vec!["st-germain", "chartreuse"]);
                assert_eq!(category, "liqueur");
                assert_eq!(subcategory.as_deref(), Some("herbal"));
            }
            _ => panic!("Wrong ingredient command"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_swap_spirit() {
    let cli = Cli::try_parse_from([
        "barback",
        "--json",
        "recipe",
        "swap-spirit",
        "--from",
        "champagne",
        "--to",
        "sparkling wine",
        "mimosa",
        "bellini",
    ])
    .unwrap();

    assert!(cli.json);
    match cli.command {
        Commands::Recipe(args) => match args.command {
            RecipeCommands::SwapSpirit { from, to, ids } => {
                assert_eq!(from, "champagne");
                assert_eq!(to, "sparkling wine");
                assert_eq!(ids.len(), 2);
            }
            _ => panic!("Wrong recipe command"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_sql_blurhash_default_output() {
    let cli = Cli::try_parse_from(["barback", "sql", "blurhash", "hashes.json"]).unwrap();
    match cli.command {
        Commands::Sql(args) => match args.command {
            SqlCommands::Blurhash { payload, output } => {
                assert_eq!(payload.to_str(), Some("hashes.json"));
                assert_eq!(output.to_str(), Some("update_blurhash.sql"));
            }
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_audit_commands() {
    for sub in ["recipe-ids", "subcategories", "coverage"] {
        assert!(Cli::try_parse_from(["barback", "audit", sub]).is_ok());
    }
    assert!(Cli::try_parse_from(["barback", "audit", "base-spirit", "gin"]).is_ok());
    assert!(Cli::try_parse_from(["barback", "audit", "base-spirit"]).is_err());
}
