//! Recipe Costing
//!
//! Resolves a catalog snapshot (ingredients, sub-recipes, recipes and
//! categories exported from the document store) and prints costs, suggested
//! prices and margins.

use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{Environment, FromEnv};
use domain_costing::{CatalogSnapshot, CostingService, InMemoryCatalogRepository};
use eyre::{Result, WrapErr};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

mod config;
mod render;

use config::Config;

#[derive(Parser)]
#[command(name = "recipe-costing")]
#[command(about = "Cost recipes and sub-recipes from a catalog snapshot")]
struct Cli {
    /// Catalog snapshot (JSON). Defaults to COSTING_SNAPSHOT or ./catalog.json
    #[arg(short, long, global = true)]
    snapshot: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the whole catalog
    Report,

    /// Cost breakdown of one recipe
    Recipe {
        id: Uuid,
    },

    /// Cost breakdown of one sub-recipe
    SubRecipe {
        id: Uuid,
    },

    /// Average margins overall and per category
    Margins,

    /// Items that can be added to a composition
    Candidates {
        /// Sub-recipe being edited; excluded from the list
        #[arg(short, long)]
        editing: Option<Uuid>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    let environment = Environment::from_env();
    init_tracing(&environment);

    observability::init_metrics();

    let cli = Cli::parse();

    let path = cli.snapshot.unwrap_or(config.snapshot_path);
    info!(path = %path.display(), "Loading catalog snapshot");
    let raw = tokio::fs::read_to_string(&path)
        .await
        .wrap_err_with(|| format!("Failed to read snapshot {}", path.display()))?;
    let snapshot = CatalogSnapshot::from_json(&raw)
        .wrap_err_with(|| format!("Failed to parse snapshot {}", path.display()))?;

    let service = CostingService::new(InMemoryCatalogRepository::from_snapshot(snapshot));

    let output = match cli.command {
        Commands::Report => {
            let report = service.cost_report().await?;
            emit(cli.json, &report, render::report)?
        }
        Commands::Recipe { id } => {
            let recipe = service.recipe_costing(id).await?;
            emit(cli.json, &recipe, render::recipe)?
        }
        Commands::SubRecipe { id } => {
            let sub_recipe = service.sub_recipe_costing(id).await?;
            emit(cli.json, &sub_recipe, render::sub_recipe)?
        }
        Commands::Margins => {
            let summary = service.margin_summary().await?;
            emit(cli.json, &summary, render::margins)?
        }
        Commands::Candidates { editing } => {
            let candidates = service.component_candidates(editing).await?;
            emit(cli.json, &candidates, render::candidates)?
        }
    };
    println!("{output}");

    if config.emit_metrics {
        eprintln!("{}", observability::render_metrics());
    }

    Ok(())
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl Fn(&T) -> String) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(text(value))
    }
}
