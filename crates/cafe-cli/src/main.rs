mod quote;
mod zones;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::quote::{parse_item, parse_location, QuoteItem};

#[derive(Debug, Parser)]
#[command(name = "cafe-cli")]
#[command(about = "Café delivery pricing command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Upsert zone pricing rules from a YAML file
    SeedZones {
        /// Zones file; defaults to CAFE_ZONES_PATH
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Inspect the pricing config
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Price a hypothetical order against the database
    Quote {
        /// Outlet coordinates as LAT,LNG
        #[arg(long, value_parser = parse_location, allow_hyphen_values = true)]
        outlet: cafe_core::Location,
        /// Delivery coordinates as LAT,LNG
        #[arg(long, value_parser = parse_location, allow_hyphen_values = true)]
        delivery: cafe_core::Location,
        /// Order line as PRICE:QTY; repeat for more lines
        #[arg(long = "item", value_parser = parse_item, required = true)]
        items: Vec<QuoteItem>,
        /// Print the breakdown as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Print the current pricing config, creating it with defaults if absent
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = cafe_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = cafe_db::PoolConfig::from_app_config(&config);
    let pool = cafe_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Migrate => {
            let applied = cafe_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::SeedZones { path } => {
            let path = path.unwrap_or_else(|| config.zones_path.clone());
            zones::run_seed_zones(&pool, &path).await?;
        }
        Commands::Config {
            command: ConfigCommands::Show,
        } => {
            let engine = quote::build_engine(&pool, &config)?;
            let pricing = engine.config_provider().get_config().await?;
            println!("{}", serde_json::to_string_pretty(&pricing)?);
        }
        Commands::Quote {
            outlet,
            delivery,
            items,
            json,
        } => {
            quote::run_quote(&pool, &config, outlet, delivery, &items, json).await?;
        }
    }

    Ok(())
}
