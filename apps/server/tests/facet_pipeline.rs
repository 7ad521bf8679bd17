//! End-to-end facet pipeline tests against the in-memory store:
//! builder output -> index -> filter engine.

use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use vitryna::db::products::{AttributeSourceRow, ProductFacetRow};
use vitryna::facet::builder::build_entries;
use vitryna::facet::query::FilterEngine;
use vitryna::facet::store::{FacetStore, MemoryFacetStore};
use vitryna::facet::FilterSelection;

fn product(id: &str, price: &str, available: bool) -> ProductFacetRow {
    ProductFacetRow {
        id: id.to_string(),
        price: Decimal::from_str(price).unwrap(),
        available,
    }
}

fn attribute(product_id: &str, filter_key: &str, value: &str) -> AttributeSourceRow {
    AttributeSourceRow {
        product_id: product_id.to_string(),
        filter_key: filter_key.to_string(),
        value: value.to_string(),
    }
}

fn selection(entries: &[(&str, &[&str])]) -> FilterSelection {
    entries
        .iter()
        .map(|(facet, values)| {
            (
                facet.to_string(),
                values.iter().map(|v| v.to_string()).collect(),
            )
        })
        .collect()
}

fn ids(values: &[&str]) -> HashSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Writes the builder's entries into a fresh in-memory store, as the
/// rebuild write loop would.
async fn indexed_store(
    products: &[ProductFacetRow],
    attributes: &[AttributeSourceRow],
    memberships: &[(String, String)],
) -> Arc<MemoryFacetStore> {
    let store = Arc::new(MemoryFacetStore::new());
    for (key, members) in build_entries(products, attributes, memberships) {
        let members: Vec<String> = members.into_iter().collect();
        store.add_members(&key, &members).await.unwrap();
    }
    store
}

fn catalog_fixture() -> (
    Vec<ProductFacetRow>,
    Vec<AttributeSourceRow>,
    Vec<(String, String)>,
) {
    let products = vec![
        product("1", "500.00", true),
        product("2", "1000.00", true),
        product("3", "7500.00", false),
        product("4", "50000.00", true),
    ];
    let attributes = vec![
        attribute("1", "kolir", "Чорний"),
        attribute("2", "kolir", "Чорний"),
        attribute("3", "kolir", "Чорний"),
        attribute("4", "kolir", "Білий"),
        attribute("1", "brend", "Acme"),
    ];
    let memberships = vec![
        ("1".to_string(), "10".to_string()),
        ("4".to_string(), "10".to_string()),
        ("2".to_string(), "20".to_string()),
    ];
    (products, attributes, memberships)
}

#[tokio::test]
async fn candidate_sets_follow_the_and_of_ors_algebra() {
    let (products, attributes, memberships) = catalog_fixture();
    let store = indexed_store(&products, &attributes, &memberships).await;
    let engine = FilterEngine::new(store);

    // Empty selection: the full corpus
    let all = engine.candidate_set(&FilterSelection::new()).await.unwrap();
    assert_eq!(all, ids(&["1", "2", "3", "4"]));

    // OR within a facet
    let by_color = engine
        .candidate_set(&selection(&[("kolir", &["cornii", "bilii"])]))
        .await
        .unwrap();
    assert_eq!(by_color, ids(&["1", "2", "3", "4"]));

    // AND across facets
    let narrowed = engine
        .candidate_set(&selection(&[("kolir", &["cornii"]), ("category", &["10"])]))
        .await
        .unwrap();
    assert_eq!(narrowed, ids(&["1"]));

    // Every candidate id really carries the selected facet values
    for id in &narrowed {
        assert!(all.contains(id));
    }
}

#[tokio::test]
async fn price_buckets_partition_the_corpus() {
    let (products, attributes, memberships) = catalog_fixture();
    let store = indexed_store(&products, &attributes, &memberships).await;
    let engine = FilterEngine::new(store);

    // 1000.00 is in 1000-5000 (half-open lower-inclusive bound)
    let mid = engine
        .candidate_set(&selection(&[("price", &["1000-5000"])]))
        .await
        .unwrap();
    assert_eq!(mid, ids(&["2"]));

    // 50000.00 is in 50000+
    let top = engine
        .candidate_set(&selection(&[("price", &["50000+"])]))
        .await
        .unwrap();
    assert_eq!(top, ids(&["4"]));

    // Each product lands in exactly one bucket
    let mut seen: HashSet<String> = HashSet::new();
    for label in ["0-1000", "1000-5000", "5000-10000", "10000-50000", "50000+"] {
        let bucket = engine
            .candidate_set(&selection(&[("price", &[label])]))
            .await
            .unwrap_or_default();
        for id in bucket {
            assert!(seen.insert(id), "product indexed in two price buckets");
        }
    }
    assert_eq!(seen.len(), 4);
}

#[tokio::test]
async fn rebuilding_from_unchanged_rows_reproduces_the_index() {
    let (products, attributes, memberships) = catalog_fixture();
    let first = build_entries(&products, &attributes, &memberships);
    let second = build_entries(&products, &attributes, &memberships);
    assert_eq!(first, second);
}

#[tokio::test]
async fn absent_keys_do_not_disturb_other_facets() {
    let (products, attributes, memberships) = catalog_fixture();
    let store = indexed_store(&products, &attributes, &memberships).await;
    let engine = FilterEngine::new(store);

    // Unknown value inside a known facet: union unaffected
    let set = engine
        .candidate_set(&selection(&[("kolir", &["cornii", "missing"])]))
        .await
        .unwrap();
    assert_eq!(set, ids(&["1", "2", "3"]));

    // Entirely unknown facet: empties the intersection, no error
    let set = engine
        .candidate_set(&selection(&[
            ("kolir", &["cornii"]),
            ("material", &["wool"]),
        ]))
        .await
        .unwrap();
    assert!(set.is_empty());
}

#[tokio::test]
async fn counts_report_what_an_additional_selection_would_match() {
    // black {1,2,3}, white {4}, category 10 {1,4}
    let store = Arc::new(MemoryFacetStore::new());
    let seed = |key: &str, members: &[&str]| {
        (
            key.to_string(),
            members.iter().map(|m| m.to_string()).collect::<Vec<_>>(),
        )
    };
    for (key, members) in [
        seed("products:all", &["1", "2", "3", "4"]),
        seed("facet:kolir:black", &["1", "2", "3"]),
        seed("facet:kolir:white", &["4"]),
        seed("facet:category:10", &["1", "4"]),
    ] {
        store.add_members(&key, &members).await.unwrap();
    }
    let engine = FilterEngine::new(store);

    let counts = engine
        .filter_counts(&selection(&[("category", &["10"])]))
        .await
        .unwrap();

    assert_eq!(counts["kolir"]["black"], 1);
    assert_eq!(counts["kolir"]["white"], 1);
}
