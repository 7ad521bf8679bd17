//! Filter façade
//!
//! Renders the facet index as filter groups with display names and
//! per-value match counts, and exposes the raw counts map.

use crate::db::{CategoryRepository, ProductRepository};
use crate::facet::query::{FilterCounts, FilterEngine};
use crate::facet::slug::slugify;
use crate::facet::{FilterSelection, CATEGORY_FACET, PRICE_FACET};
use crate::models::{FacetGroup, FacetValue};
use crate::Result;
use sqlx::PgPool;
use std::collections::HashMap;

pub struct FilterService {
    db: PgPool,
    engine: FilterEngine,
}

impl FilterService {
    pub fn new(db: PgPool, engine: FilterEngine) -> Self {
        Self { db, engine }
    }

    /// Raw per-facet counts for the applied selection
    pub async fn get_filter_counts(&self, applied: &FilterSelection) -> Result<FilterCounts> {
        self.engine.filter_counts(applied).await
    }

    /// Filter groups with display names, counts, and active flags
    ///
    /// Facets are discovered from the index; display names are resolved
    /// from the primary store (category names, original attribute
    /// wording). Group order: category first, attribute facets
    /// alphabetically, price last.
    pub async fn get_filters(&self, active: &FilterSelection) -> Result<Vec<FacetGroup>> {
        let counts = self.engine.filter_counts(active).await?;
        if counts.is_empty() {
            return Ok(Vec::new());
        }

        let category_names = CategoryRepository::new(self.db.clone()).names().await?;
        let product_repo = ProductRepository::new(self.db.clone());
        let facet_names = display_name_map(product_repo.attribute_display_names().await?);
        // (filter_key, slug(value)) -> original value text; first wins
        let mut value_names: HashMap<(String, String), String> = HashMap::new();
        for (filter_key, value) in product_repo.attribute_display_values().await? {
            value_names
                .entry((filter_key, slugify(&value)))
                .or_insert(value);
        }

        let mut groups = Vec::with_capacity(counts.len());
        for (facet, values) in &counts {
            let mut rendered: Vec<FacetValue> = values
                .iter()
                .map(|(value, count)| {
                    let display_value = match facet.as_str() {
                        CATEGORY_FACET => category_names
                            .get(value)
                            .cloned()
                            .unwrap_or_else(|| value.clone()),
                        PRICE_FACET => value.clone(),
                        _ => value_names
                            .get(&(facet.clone(), value.clone()))
                            .cloned()
                            .unwrap_or_else(|| value.clone()),
                    };
                    let is_active = active
                        .get(facet)
                        .is_some_and(|selected| selected.iter().any(|v| v == value));
                    FacetValue {
                        value: value.clone(),
                        display_value,
                        count: *count,
                        active: is_active,
                    }
                })
                .collect();

            rendered.sort_by(|a, b| {
                a.display_value
                    .cmp(&b.display_value)
                    .then_with(|| a.value.cmp(&b.value))
            });

            let name = match facet.as_str() {
                CATEGORY_FACET => "Category".to_string(),
                PRICE_FACET => "Price".to_string(),
                _ => facet_names.get(facet).cloned().unwrap_or_else(|| facet.clone()),
            };

            groups.push(FacetGroup {
                name,
                slug: facet.clone(),
                values: rendered,
            });
        }

        groups.sort_by_key(|group| facet_rank(&group.slug));
        Ok(groups)
    }
}

/// Category first, attribute facets alphabetically, price last
fn facet_rank(slug: &str) -> (u8, String) {
    match slug {
        CATEGORY_FACET => (0, String::new()),
        PRICE_FACET => (2, String::new()),
        _ => (1, slug.to_string()),
    }
}

/// Fold (filter_key, name) rows into a label map, first row wins
///
/// Rows arrive sorted by (filter_key, name), so two attribute names
/// slugging to the same key resolve to the same label on every request.
fn display_name_map(rows: Vec<(String, String)>) -> HashMap<String, String> {
    let mut names = HashMap::with_capacity(rows.len());
    for (filter_key, name) in rows {
        names.entry(filter_key).or_insert(name);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facets_are_ordered_category_attributes_price() {
        let mut slugs = vec!["price", "kolir", "category", "brend"];
        slugs.sort_by_key(|s| facet_rank(s));
        assert_eq!(slugs, vec!["category", "brend", "kolir", "price"]);
    }

    #[test]
    fn colliding_facet_labels_resolve_deterministically() {
        // Two attribute spellings can collapse to one filter_key; with
        // sorted input the first spelling always wins.
        let rows = vec![
            ("vaha".to_string(), "Вага".to_string()),
            ("vaha".to_string(), "Вага (кг)".to_string()),
        ];
        let names = display_name_map(rows);
        assert_eq!(names["vaha"], "Вага");
    }
}
