//! Catalog query façade
//!
//! Combines the filter engine's candidate id set with the primary store
//! to produce a sorted, paginated product page.

use crate::db::ProductRepository;
use crate::facet::query::FilterEngine;
use crate::facet::FilterSelection;
use crate::models::{PageMeta, Product, ProductPage, ProductView, SortBy};
use crate::Result;
use sqlx::PgPool;
use std::collections::HashMap;

/// Hard cap on page size; larger requests are clamped down
pub const MAX_PAGE_SIZE: u32 = 100;

pub struct CatalogService {
    db: PgPool,
    engine: FilterEngine,
}

impl CatalogService {
    pub fn new(db: PgPool, engine: FilterEngine) -> Self {
        Self { db, engine }
    }

    /// One sorted, paginated page of products matching the filters
    ///
    /// Inputs arrive pre-validated by the HTTP layer; the clamps here
    /// are defensive. An empty candidate set yields a well-formed empty
    /// page, not an error.
    pub async fn get_products(
        &self,
        page: u32,
        limit: u32,
        sort_by: SortBy,
        filters: &FilterSelection,
    ) -> Result<ProductPage> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let repo = ProductRepository::new(self.db.clone());

        let ids = if filters.is_empty() {
            None
        } else {
            let candidate = self.engine.candidate_set(filters).await?;
            if candidate.is_empty() {
                tracing::info!("No products match the active filters");
                return Ok(ProductPage {
                    data: Vec::new(),
                    meta: PageMeta {
                        current_page: page,
                        last_page: 0,
                        per_page: limit,
                        total: 0,
                    },
                });
            }
            let mut ids: Vec<String> = candidate.into_iter().collect();
            // Stable bind order; the database applies the real sort
            ids.sort();
            Some(ids)
        };

        let total = repo.count(ids.as_deref()).await?;
        let offset = i64::from(page - 1) * i64::from(limit);
        let products = repo
            .page(ids.as_deref(), sort_by, i64::from(limit), offset)
            .await?;
        let data = self.attach_relations(&repo, products).await?;

        Ok(ProductPage {
            data,
            meta: PageMeta {
                current_page: page,
                last_page: last_page(total, limit),
                per_page: limit,
                total,
            },
        })
    }

    /// Eager-load attributes, images and category links for one page
    async fn attach_relations(
        &self,
        repo: &ProductRepository,
        products: Vec<Product>,
    ) -> Result<Vec<ProductView>> {
        if products.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = products.iter().map(|p| p.id.clone()).collect();

        let mut attributes: HashMap<String, Vec<_>> = HashMap::new();
        for (product_id, attribute) in repo.attributes_for(&ids).await? {
            attributes.entry(product_id).or_default().push(attribute);
        }
        let mut images: HashMap<String, Vec<String>> = HashMap::new();
        for (product_id, url) in repo.images_for(&ids).await? {
            images.entry(product_id).or_default().push(url);
        }
        let mut categories: HashMap<String, Vec<String>> = HashMap::new();
        for (product_id, category_id) in repo.category_links_for(&ids).await? {
            categories.entry(product_id).or_default().push(category_id);
        }

        Ok(products
            .into_iter()
            .map(|product| {
                let id = product.id.clone();
                ProductView {
                    product,
                    attributes: attributes.remove(&id).unwrap_or_default(),
                    images: images.remove(&id).unwrap_or_default(),
                    categories: categories.remove(&id).unwrap_or_default(),
                }
            })
            .collect())
    }
}

/// `ceil(total / per_page)`; zero matches means zero pages
pub fn last_page(total: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(u64::from(per_page)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_page_is_ceiling_division() {
        assert_eq!(last_page(25, 10), 3);
        assert_eq!(last_page(30, 10), 3);
        assert_eq!(last_page(31, 10), 4);
        assert_eq!(last_page(1, 100), 1);
        assert_eq!(last_page(0, 10), 0);
    }

    #[test]
    fn page_meta_for_a_sweep_of_25_ids_with_limit_10() {
        // 25 matches, limit 10: pages 1..3 carry data, page 4 is empty
        // but still reports the full total.
        let meta = PageMeta {
            current_page: 4,
            last_page: last_page(25, 10),
            per_page: 10,
            total: 25,
        };
        assert_eq!(meta.last_page, 3);
        assert_eq!(meta.total, 25);
    }
}
