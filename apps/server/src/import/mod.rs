//! Feed import pipeline
//!
//! Parses an XML product feed and upserts it into the primary store in
//! a single transaction: categories first (parent-before-child), then
//! products with wholesale replacement of their attributes, images and
//! category links. The facet index rebuild runs separately, after the
//! transaction commits.

pub mod categories;
pub mod feed;
pub mod products;

use crate::Result;
use feed::Feed;
use sqlx::PgPool;

#[derive(Debug, Clone, Copy)]
pub struct ImportSummary {
    pub categories: usize,
    pub products: usize,
}

pub struct FeedImporter {
    db: PgPool,
}

impl FeedImporter {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Upsert a parsed feed into the primary store
    ///
    /// The whole import is one transaction: a failure rolls everything
    /// back and leaves the store at its pre-import state.
    pub async fn import(&self, feed: &Feed) -> Result<ImportSummary> {
        let mut tx = self.db.begin().await?;

        let imported = categories::upsert_categories(&mut tx, &feed.categories).await?;
        tracing::info!(count = imported, "Categories imported");

        // Existence cache for membership links, covering the whole
        // store: partial feeds reference categories imported earlier.
        let known_categories = categories::known_ids(&mut tx).await?;

        for offer in &feed.offers {
            products::upsert_offer(&mut tx, offer, &known_categories).await?;
        }

        tx.commit().await?;

        let summary = ImportSummary {
            categories: imported,
            products: feed.offers.len(),
        };
        tracing::info!(
            categories = summary.categories,
            products = summary.products,
            "Feed import committed"
        );
        Ok(summary)
    }
}
