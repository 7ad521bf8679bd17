//! Product import
//!
//! Each offer upserts its product row and replaces the product's
//! attributes, images and category links wholesale: rows absent from
//! the latest feed are deleted.

use crate::facet::slug::slugify;
use crate::import::feed::FeedOffer;
use crate::Result;
use sqlx::{PgConnection, Postgres, Transaction};
use std::collections::HashSet;

/// Upsert one offer and its relations
pub async fn upsert_offer(
    tx: &mut Transaction<'_, Postgres>,
    offer: &FeedOffer,
    known_categories: &HashSet<String>,
) -> Result<()> {
    upsert_product(&mut **tx, offer).await?;
    replace_attributes(&mut **tx, offer).await?;
    replace_images(&mut **tx, offer).await?;
    replace_category_links(&mut **tx, offer, known_categories).await?;
    Ok(())
}

async fn upsert_product(conn: &mut PgConnection, offer: &FeedOffer) -> Result<()> {
    // created_at is written once and preserved across re-imports
    sqlx::query(
        "INSERT INTO products \
         (id, name, price, currency_id, stock_quantity, description, vendor, \
          vendor_code, barcode, available, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now(), now()) \
         ON CONFLICT (id) DO UPDATE SET \
          name = EXCLUDED.name, price = EXCLUDED.price, \
          currency_id = EXCLUDED.currency_id, \
          stock_quantity = EXCLUDED.stock_quantity, \
          description = EXCLUDED.description, vendor = EXCLUDED.vendor, \
          vendor_code = EXCLUDED.vendor_code, barcode = EXCLUDED.barcode, \
          available = EXCLUDED.available, updated_at = now()",
    )
    .bind(&offer.id)
    .bind(&offer.name)
    .bind(offer.price)
    .bind(&offer.currency_id)
    .bind(offer.stock_quantity)
    .bind(&offer.description)
    .bind(&offer.vendor)
    .bind(&offer.vendor_code)
    .bind(&offer.barcode)
    .bind(offer.available)
    .execute(conn)
    .await?;
    Ok(())
}

async fn replace_attributes(conn: &mut PgConnection, offer: &FeedOffer) -> Result<()> {
    let names: Vec<String> = offer.params.iter().map(|(name, _)| name.clone()).collect();

    // Attributes not present in the latest feed are deleted
    sqlx::query("DELETE FROM product_attributes WHERE product_id = $1 AND name <> ALL($2)")
        .bind(&offer.id)
        .bind(&names)
        .execute(&mut *conn)
        .await?;

    for (name, value) in &offer.params {
        sqlx::query(
            "INSERT INTO product_attributes \
             (product_id, name, value, filter_key, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, now(), now()) \
             ON CONFLICT (product_id, name) DO UPDATE SET \
              value = EXCLUDED.value, filter_key = EXCLUDED.filter_key, \
              updated_at = now()",
        )
        .bind(&offer.id)
        .bind(name)
        .bind(value)
        .bind(slugify(name))
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn replace_images(conn: &mut PgConnection, offer: &FeedOffer) -> Result<()> {
    sqlx::query("DELETE FROM product_images WHERE product_id = $1")
        .bind(&offer.id)
        .execute(&mut *conn)
        .await?;

    for image_url in &offer.images {
        sqlx::query(
            "INSERT INTO product_images (product_id, image_url, created_at, updated_at) \
             VALUES ($1, $2, now(), now())",
        )
        .bind(&offer.id)
        .bind(image_url)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn replace_category_links(
    conn: &mut PgConnection,
    offer: &FeedOffer,
    known_categories: &HashSet<String>,
) -> Result<()> {
    sqlx::query("DELETE FROM product_categories WHERE product_id = $1")
        .bind(&offer.id)
        .execute(&mut *conn)
        .await?;

    let (linkable, unknown) = split_links(&offer.category_ids, known_categories);
    for category_id in unknown {
        tracing::warn!(
            product_id = %offer.id,
            category_id = %category_id,
            "Category not found, skipping link"
        );
    }
    for category_id in linkable {
        sqlx::query(
            "INSERT INTO product_categories (product_id, category_id) VALUES ($1, $2)",
        )
        .bind(&offer.id)
        .bind(category_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Split an offer's category references into linkable and unknown ids
///
/// `known` holds every id present in the store, not just this feed's
/// batch, so references to categories from earlier imports survive.
fn split_links<'a>(
    category_ids: &'a [String],
    known: &HashSet<String>,
) -> (Vec<&'a str>, Vec<&'a str>) {
    let mut linkable = Vec::new();
    let mut unknown = Vec::new();
    for id in category_ids {
        if known.contains(id) {
            linkable.push(id.as_str());
        } else {
            unknown.push(id.as_str());
        }
    }
    (linkable, unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_to_store_resident_categories_survive_partial_feeds() {
        // "5" was imported in an earlier run; this feed carries no
        // <categories> section, so the existence cache comes from the
        // store and must still cover it.
        let known: HashSet<String> = HashSet::from(["5".to_string()]);
        let ids = vec!["5".to_string(), "9".to_string()];

        let (linkable, unknown) = split_links(&ids, &known);

        assert_eq!(linkable, vec!["5"]);
        assert_eq!(unknown, vec!["9"]);
    }
}
