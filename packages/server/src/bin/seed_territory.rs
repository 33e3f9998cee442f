// Seed the territorial reference table from a JSON file.
//
// The file is a flat array of nodes:
//   [{ "code": 1, "libelle": "Adamaoua", "kind": "region", "parent_code": null }, ...]
//
// The whole file is validated as a tree before anything is written, so a
// malformed seed never lands partially.

use anyhow::{Context, Result};
use clap::Parser;
use scrutin_core::domains::territory::{self, TerritoryIndex, TerritorialNode};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "seed_territory", about = "Load territorial reference data")]
struct Args {
    /// Path to the JSON seed file
    #[arg(long)]
    file: String,

    /// Database URL; falls back to DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    /// Validate the file without writing anything
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let raw = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read seed file {}", args.file))?;
    let nodes: Vec<TerritorialNode> =
        serde_json::from_str(&raw).context("Seed file is not a valid node array")?;

    // Reject duplicate codes, dangling parents and kind skips up front
    let index = TerritoryIndex::build(nodes.clone()).context("Seed file is not a valid tree")?;
    tracing::info!("Seed file valid: {} nodes", index.len());

    if args.dry_run {
        tracing::info!("Dry run, nothing written");
        return Ok(());
    }

    let database_url = match args.database_url {
        Some(url) => url,
        None => std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
    };
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    let inserted = territory::data::insert_nodes(&pool, &nodes).await?;
    tracing::info!(
        "Inserted {} nodes ({} already present)",
        inserted,
        nodes.len() as u64 - inserted
    );

    Ok(())
}
