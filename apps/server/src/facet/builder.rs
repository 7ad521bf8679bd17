//! Facet index builder
//!
//! Produces a complete facet index from the current contents of the
//! primary store. This is a full rebuild, not an incremental update:
//! the managed namespace is cleared first, then repopulated. The two
//! phases are not atomic as a whole; a crash mid-rebuild leaves stale
//! or missing keys, never wrong-but-plausible data, and recovery is
//! simply running the rebuild again.

use crate::db::products::{AttributeSourceRow, ProductFacetRow, ProductRepository};
use crate::facet::key::{facet_key, ALL_PRODUCTS_KEY, AVAILABLE_PRODUCTS_KEY, FACET_PREFIX};
use crate::facet::slug::slugify;
use crate::facet::store::FacetStore;
use crate::facet::{CATEGORY_FACET, PRICE_FACET};
use crate::Result;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Fixed, ascending, half-open price bucket bounds (policy constants)
pub const PRICE_BUCKET_LABELS: [&str; 5] =
    ["0-1000", "1000-5000", "5000-10000", "10000-50000", "50000+"];

/// Bucket label for a price; lower bound inclusive, upper exclusive
///
/// A product priced exactly 1000.00 falls in `1000-5000`, and 50000.00
/// in `50000+`.
pub fn price_bucket(price: Decimal) -> &'static str {
    if price < Decimal::from(1_000) {
        "0-1000"
    } else if price < Decimal::from(5_000) {
        "1000-5000"
    } else if price < Decimal::from(10_000) {
        "5000-10000"
    } else if price < Decimal::from(50_000) {
        "10000-50000"
    } else {
        "50000+"
    }
}

/// Outcome of one full rebuild, for operator logs
#[derive(Debug, Clone, Copy)]
pub struct RebuildSummary {
    pub products: usize,
    pub facet_keys: usize,
}

/// Rebuilds the facet index from the primary store
pub struct FacetIndexBuilder {
    db: PgPool,
    store: Arc<dyn FacetStore>,
}

impl FacetIndexBuilder {
    pub fn new(db: PgPool, store: Arc<dyn FacetStore>) -> Self {
        Self { db, store }
    }

    /// Clear the managed namespace and rebuild every facet set
    ///
    /// Single-writer by deployment contract: imports are serialized
    /// externally, so at most one rebuild runs at a time.
    pub async fn rebuild(&self) -> Result<RebuildSummary> {
        let repo = ProductRepository::new(self.db.clone());

        let products = repo.facet_product_rows().await?;
        let attributes = repo.attribute_source_rows().await?;
        let memberships = repo.category_memberships().await?;

        tracing::info!(
            products = products.len(),
            attribute_rows = attributes.len(),
            category_links = memberships.len(),
            "Rebuilding facet index"
        );

        // Destroy the previous index before writing the new one.
        self.store.clear_namespace(FACET_PREFIX).await?;
        self.store.delete(ALL_PRODUCTS_KEY).await?;
        self.store.delete(AVAILABLE_PRODUCTS_KEY).await?;

        let entries = build_entries(&products, &attributes, &memberships);
        let mut facet_keys = 0;
        for (key, members) in &entries {
            if key.starts_with(FACET_PREFIX) {
                facet_keys += 1;
            }
            let members: Vec<String> = members.iter().cloned().collect();
            self.store.add_members(key, &members).await?;
        }

        let summary = RebuildSummary {
            products: products.len(),
            facet_keys,
        };
        tracing::info!(
            products = summary.products,
            facet_keys = summary.facet_keys,
            "Facet index rebuild complete"
        );
        Ok(summary)
    }
}

/// Pure index construction: rows in, key -> member-set map out
///
/// Shared by the rebuild write loop and the tests, so the set algebra
/// has a single definition. Ordered maps keep rebuilds reproducible.
pub fn build_entries(
    products: &[ProductFacetRow],
    attributes: &[AttributeSourceRow],
    memberships: &[(String, String)],
) -> BTreeMap<String, BTreeSet<String>> {
    let mut entries: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for product in products {
        entries
            .entry(ALL_PRODUCTS_KEY.to_string())
            .or_default()
            .insert(product.id.clone());
        if product.available {
            entries
                .entry(AVAILABLE_PRODUCTS_KEY.to_string())
                .or_default()
                .insert(product.id.clone());
        }
        entries
            .entry(facet_key(PRICE_FACET, price_bucket(product.price)))
            .or_default()
            .insert(product.id.clone());
    }

    for row in attributes {
        let value_slug = slugify(&row.value);
        if row.filter_key.is_empty() || value_slug.is_empty() {
            continue;
        }
        entries
            .entry(facet_key(&row.filter_key, &value_slug))
            .or_default()
            .insert(row.product_id.clone());
    }

    for (product_id, category_id) in memberships {
        entries
            .entry(facet_key(CATEGORY_FACET, category_id))
            .or_default()
            .insert(product_id.clone());
    }

    entries
}
