//! Barback CLI entry point.

use clap::Parser;

use barback::cli::commands::{audit, collection, ingredient, recipe, rows, sql};
use barback::cli::{handle_error, Cli, CommandContext, Commands};
use barback::infrastructure::config::ConfigLoader;
use barback::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load(&cli.load_options()) {
        Ok(config) => config,
        Err(err) => handle_error(err.into(), cli.json),
    };

    let _logger = match LogConfig::try_from(&config.logging)
        .map_err(anyhow::Error::msg)
        .and_then(|log_config| LoggerImpl::init(&log_config))
    {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let context = CommandContext::new(config, cli.json);

    let result = match cli.command {
        Commands::Select(args) => rows::select(args, &context).await,
        Commands::Upsert(args) => rows::upsert(args, &context).await,
        Commands::Insert(args) => rows::insert(args, &context).await,
        Commands::Update(args) => rows::update(args, &context).await,
        Commands::Delete(args) => rows::delete(args, &context).await,
        Commands::CheckTables(args) => rows::check_tables(args, &context).await,
        Commands::Schema(args) => rows::schema(args, &context).await,
        Commands::Ingredient(args) => ingredient::execute(args, &context).await,
        Commands::Recipe(args) => recipe::execute(args, &context).await,
        Commands::Collection(args) => collection::execute(args, &context).await,
        Commands::Audit(args) => audit::execute(args, &context).await,
        Commands::Sql(args) => sql::execute(args, &context).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
