//! Faceted-filter indexing and query engine
//!
//! The facet index is a derived, rebuildable cache: one Redis set per
//! `(facet, value)` pair holding the matching product ids, plus the
//! `products:all` / `products:available` corpus sets. It is rebuilt
//! wholesale from the primary store after each import and has no
//! independent source of truth.

pub mod builder;
pub mod key;
pub mod query;
pub mod slug;
pub mod store;

use std::collections::BTreeMap;

/// Active filter selection: facet name to selected values
///
/// Multiple values within one facet mean OR; facets are combined with
/// AND. A BTreeMap keeps evaluation order deterministic.
pub type FilterSelection = BTreeMap<String, Vec<String>>;

/// Facet name used for category membership
pub const CATEGORY_FACET: &str = "category";

/// Facet name used for price buckets
pub const PRICE_FACET: &str = "price";
