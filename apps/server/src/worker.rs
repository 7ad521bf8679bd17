//! Catalog Import - batch worker entry point
//!
//! Parses an XML product feed, upserts it into PostgreSQL in one
//! transaction, then rebuilds the Redis facet index wholesale. Imports
//! must be serialized externally; the rebuild assumes it is the only
//! writer.

use anyhow::Context;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use std::sync::Arc;
use vitryna::config::Config;
use vitryna::facet::builder::FacetIndexBuilder;
use vitryna::facet::store::RedisFacetStore;
use vitryna::import::{feed, FeedImporter};
use vitryna::logging;

#[derive(Parser, Debug)]
#[command(
    name = "catalog-import",
    about = "Import products from an XML feed and rebuild the facet index"
)]
struct Args {
    /// Path to the XML feed file
    feed: Option<PathBuf>,

    /// Skip the import and only rebuild the facet index from the
    /// primary store
    #[arg(long)]
    rebuild_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_simple_logging();

    let config = Config::load().context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    if !args.rebuild_only {
        let Some(path) = args.feed.as_deref() else {
            anyhow::bail!("FEED argument is required unless --rebuild-only is set");
        };

        tracing::info!(feed = %path.display(), "Parsing feed");
        let feed = feed::parse_feed(path)?;
        if feed.skipped > 0 {
            tracing::warn!(skipped = feed.skipped, "Some offers were skipped");
        }

        let importer = FeedImporter::new(pool.clone());
        let summary = importer.import(&feed).await?;
        tracing::info!(
            categories = summary.categories,
            products = summary.products,
            "Import completed successfully"
        );
    }

    let store = RedisFacetStore::connect(&config.index.redis_url)
        .await
        .context("Failed to connect to Redis")?;
    let builder = FacetIndexBuilder::new(pool, Arc::new(store));
    let summary = builder.rebuild().await?;
    tracing::info!(
        products = summary.products,
        facet_keys = summary.facet_keys,
        "Facet index updated"
    );

    Ok(())
}
