//! Product repository - catalog page queries and facet source reads

use crate::models::{AttributeView, Product, SortBy};
use crate::Result;
use rust_decimal::Decimal;
use sqlx::PgPool;

const PRODUCT_COLUMNS: &str = "id, name, price, currency_id, stock_quantity, description, \
     vendor, vendor_code, barcode, available, created_at, updated_at";

/// Source row for attribute facets: one per (product, attribute)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttributeSourceRow {
    pub product_id: String,
    pub filter_key: String,
    pub value: String,
}

/// Source row for corpus and price facets
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductFacetRow {
    pub id: String,
    pub price: Decimal,
    pub available: bool,
}

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Count products, optionally restricted to a candidate id set
    pub async fn count(&self, ids: Option<&[String]>) -> Result<u64> {
        let count: i64 = match ids {
            Some(ids) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE id = ANY($1)")
                    .bind(ids)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM products")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count.max(0) as u64)
    }

    /// One page of products, optionally restricted to a candidate id set
    ///
    /// The sort is always id-tiebroken (see [`SortBy::order_by_sql`]) so
    /// a full pagination sweep visits every matching product exactly
    /// once.
    pub async fn page(
        &self,
        ids: Option<&[String]>,
        sort: SortBy,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>> {
        let products = match ids {
            Some(ids) => {
                let sql = format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) {} LIMIT $2 OFFSET $3",
                    sort.order_by_sql()
                );
                sqlx::query_as::<_, Product>(&sql)
                    .bind(ids)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products {} LIMIT $1 OFFSET $2",
                    sort.order_by_sql()
                );
                sqlx::query_as::<_, Product>(&sql)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(products)
    }

    /// Attributes for a set of products: (product_id, attribute)
    pub async fn attributes_for(&self, ids: &[String]) -> Result<Vec<(String, AttributeView)>> {
        let rows: Vec<(String, String, String, Option<String>)> = sqlx::query_as(
            "SELECT product_id, name, value, filter_key FROM product_attributes \
             WHERE product_id = ANY($1) ORDER BY product_id, name",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(product_id, name, value, filter_key)| {
                (
                    product_id,
                    AttributeView {
                        name,
                        value,
                        filter_key: filter_key.unwrap_or_default(),
                    },
                )
            })
            .collect())
    }

    /// Image URLs for a set of products: (product_id, image_url)
    pub async fn images_for(&self, ids: &[String]) -> Result<Vec<(String, String)>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT product_id, image_url FROM product_images \
             WHERE product_id = ANY($1) ORDER BY product_id, image_url",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Category links for a set of products: (product_id, category_id)
    pub async fn category_links_for(&self, ids: &[String]) -> Result<Vec<(String, String)>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT product_id, category_id FROM product_categories \
             WHERE product_id = ANY($1) ORDER BY product_id, category_id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Every attribute row usable as a facet source (bulk read for the
    /// index builder)
    pub async fn attribute_source_rows(&self) -> Result<Vec<AttributeSourceRow>> {
        let rows = sqlx::query_as::<_, AttributeSourceRow>(
            "SELECT product_id, filter_key, value FROM product_attributes \
             WHERE filter_key IS NOT NULL AND filter_key <> ''",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Every (product_id, category_id) association
    pub async fn category_memberships(&self) -> Result<Vec<(String, String)>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT product_id, category_id FROM product_categories")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    /// id/price/availability for every product
    pub async fn facet_product_rows(&self) -> Result<Vec<ProductFacetRow>> {
        let rows =
            sqlx::query_as::<_, ProductFacetRow>("SELECT id, price, available FROM products")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    /// Distinct (filter_key, attribute name) pairs, for facet labels
    ///
    /// Ordered so callers resolving name collisions first-wins get the
    /// same winner on every request.
    pub async fn attribute_display_names(&self) -> Result<Vec<(String, String)>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT DISTINCT filter_key, name FROM product_attributes \
             WHERE filter_key IS NOT NULL AND filter_key <> '' \
             ORDER BY filter_key, name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Distinct (filter_key, raw value) pairs, for value labels; same
    /// ordering contract as [`Self::attribute_display_names`]
    pub async fn attribute_display_values(&self) -> Result<Vec<(String, String)>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT DISTINCT filter_key, value FROM product_attributes \
             WHERE filter_key IS NOT NULL AND filter_key <> '' \
             ORDER BY filter_key, value",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
