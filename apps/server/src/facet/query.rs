//! Filter query engine
//!
//! Evaluates an active filter selection against the facet index with
//! AND-of-ORs algebra: values selected within one facet are unioned,
//! the per-facet unions are intersected across facets. The set algebra
//! runs inside the store; multi-value unions and count bases land in
//! expiring scratch keys so member sets are never transferred just to
//! be counted. The engine never fails on index contents; absent keys
//! read as empty sets and only store transport errors propagate.

use crate::facet::key::{facet_key, split_key, ALL_PRODUCTS_KEY, FACET_PREFIX};
use crate::facet::store::FacetStore;
use crate::facet::FilterSelection;
use crate::Result;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Per-facet match counts: facet -> value -> count
pub type FilterCounts = BTreeMap<String, BTreeMap<String, u64>>;

/// Lifetime of scratch keys; generous against slow requests, short
/// enough that abandoned scratch sets do not pile up
const SCRATCH_TTL: Duration = Duration::from_secs(60);

fn scratch_prefix() -> String {
    format!("tmp:filters:{}", Uuid::new_v4())
}

#[derive(Clone)]
pub struct FilterEngine {
    store: Arc<dyn FacetStore>,
}

impl FilterEngine {
    pub fn new(store: Arc<dyn FacetStore>) -> Self {
        Self { store }
    }

    /// Product ids matching the selection
    ///
    /// An empty selection matches the full corpus, not nothing. A facet
    /// whose selected values all resolve to empty sets empties the
    /// whole result, and the evaluation short-circuits there.
    pub async fn candidate_set(&self, selection: &FilterSelection) -> Result<HashSet<String>> {
        if selection.is_empty() {
            return self.store.members(ALL_PRODUCTS_KEY).await;
        }

        let scratch = scratch_prefix();
        match self.facet_keys(selection, &scratch).await? {
            Some(keys) => self.store.intersect(&keys).await,
            None => Ok(HashSet::new()),
        }
    }

    /// One store key per facet: the value key itself for single-valued
    /// facets, a stored union under a scratch key otherwise
    ///
    /// Returns `None` when some facet's union is empty: that facet
    /// empties the whole intersection, so evaluation short-circuits.
    async fn facet_keys(
        &self,
        selection: &FilterSelection,
        scratch: &str,
    ) -> Result<Option<Vec<String>>> {
        let mut keys = Vec::with_capacity(selection.len());
        for (facet, values) in selection {
            if let [value] = values.as_slice() {
                keys.push(facet_key(facet, value));
                continue;
            }
            let sources: Vec<String> = values.iter().map(|v| facet_key(facet, v)).collect();
            let dest = format!("{scratch}:u:{facet}");
            if self.store.store_union(&dest, &sources, SCRATCH_TTL).await? == 0 {
                return Ok(None);
            }
            keys.push(dest);
        }
        Ok(Some(keys))
    }

    /// Candidate set with one facet removed from the selection
    ///
    /// Used for counts: the base set for a value excludes its own
    /// facet, so the other values of an active facet keep their counts.
    pub async fn candidate_set_excluding(
        &self,
        selection: &FilterSelection,
        facet: &str,
    ) -> Result<HashSet<String>> {
        if !selection.contains_key(facet) {
            return self.candidate_set(selection).await;
        }
        let mut remaining = selection.clone();
        remaining.remove(facet);
        self.candidate_set(&remaining).await
    }

    /// "N products would match if this value were also selected"
    ///
    /// For every facet value present in the index, reports the
    /// cardinality of its set intersected with the candidate set of the
    /// applied selection minus that value's own facet (or the full
    /// corpus when nothing else is selected). Zero counts are
    /// suppressed unless the value is currently selected, so an active
    /// filter can always be rendered for deselection.
    pub async fn filter_counts(&self, applied: &FilterSelection) -> Result<FilterCounts> {
        let keys = self.store.keys_with_prefix(FACET_PREFIX).await?;
        let scratch = scratch_prefix();
        let value_dest = format!("{scratch}:i");

        // Base scratch key per facet, stored once. `None` means "full
        // corpus": the count is then just the set's cardinality.
        let mut bases: HashMap<String, Option<String>> = HashMap::new();
        let mut counts: FilterCounts = BTreeMap::new();

        for key in keys {
            let Some((facet, value)) = split_key(&key) else {
                continue;
            };
            let facet = facet.to_string();

            if !bases.contains_key(&facet) {
                let mut remaining = applied.clone();
                remaining.remove(&facet);
                let base = if remaining.is_empty() {
                    None
                } else {
                    Some(self.store_base(&remaining, &scratch, &facet).await?)
                };
                bases.insert(facet.clone(), base);
            }

            // Each intersection stays inside the store; only its
            // cardinality comes back.
            let count = match bases.get(&facet) {
                Some(Some(base)) => {
                    self.store
                        .store_intersection(
                            &value_dest,
                            &[base.clone(), key.clone()],
                            SCRATCH_TTL,
                        )
                        .await?
                }
                _ => self.store.cardinality(&key).await?,
            };

            let active = applied
                .get(&facet)
                .is_some_and(|values| values.iter().any(|v| v == &value));

            if count > 0 || active {
                counts.entry(facet).or_default().insert(value, count);
            }
        }

        Ok(counts)
    }

    /// Store the base set for one facet's counts under a scratch key
    ///
    /// The base is the candidate set of the applied selection minus the
    /// facet itself. A facet with an empty union leaves the scratch key
    /// unwritten; absent keys read as the empty set, so every count
    /// against it comes out zero.
    async fn store_base(
        &self,
        remaining: &FilterSelection,
        scratch: &str,
        facet: &str,
    ) -> Result<String> {
        let dest = format!("{scratch}:base:{facet}");
        if let Some(keys) = self.facet_keys(remaining, &dest).await? {
            self.store
                .store_intersection(&dest, &keys, SCRATCH_TTL)
                .await?;
        }
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facet::store::MemoryFacetStore;

    async fn seeded_engine() -> FilterEngine {
        let store = MemoryFacetStore::new();
        let add = |key: &str, ids: &[&str]| {
            (
                key.to_string(),
                ids.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            )
        };
        let seeds = [
            add(ALL_PRODUCTS_KEY, &["1", "2", "3", "4"]),
            add("facet:kolir:black", &["1", "2", "3"]),
            add("facet:kolir:white", &["4"]),
            add("facet:category:10", &["1", "4"]),
            add("facet:price:0-1000", &["1", "2", "3", "4"]),
        ];
        for (key, ids) in seeds {
            store.add_members(&key, &ids).await.unwrap();
        }
        FilterEngine::new(Arc::new(store))
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

    #[tokio::test]
    async fn empty_selection_matches_the_full_corpus() {
        let engine = seeded_engine().await;
        let set = engine.candidate_set(&FilterSelection::new()).await.unwrap();
        assert_eq!(set, ids(&["1", "2", "3", "4"]));
    }

    #[tokio::test]
    async fn values_within_a_facet_are_unioned() {
        let engine = seeded_engine().await;
        let set = engine
            .candidate_set(&selection(&[("kolir", &["black", "white"])]))
            .await
            .unwrap();
        assert_eq!(set, ids(&["1", "2", "3", "4"]));
    }

    #[tokio::test]
    async fn facets_are_intersected() {
        let engine = seeded_engine().await;
        let set = engine
            .candidate_set(&selection(&[
                ("kolir", &["black"]),
                ("category", &["10"]),
            ]))
            .await
            .unwrap();
        assert_eq!(set, ids(&["1"]));
    }

    #[tokio::test]
    async fn unknown_value_contributes_an_empty_set_without_error() {
        let engine = seeded_engine().await;
        // Union with a known value: the unknown key is simply empty
        let set = engine
            .candidate_set(&selection(&[("kolir", &["black", "no-such"])]))
            .await
            .unwrap();
        assert_eq!(set, ids(&["1", "2", "3"]));
    }

    #[tokio::test]
    async fn empty_facet_union_empties_the_result() {
        let engine = seeded_engine().await;
        // The nonexistent facet does not get skipped; it empties the
        // intersection regardless of the other facets.
        let set = engine
            .candidate_set(&selection(&[
                ("kolir", &["black"]),
                ("material", &["no-such"]),
            ]))
            .await
            .unwrap();
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn counts_use_the_candidate_set_of_the_other_facets() {
        let engine = seeded_engine().await;
        let applied = selection(&[("category", &["10"])]);

        let counts = engine.filter_counts(&applied).await.unwrap();

        // candidate excluding kolir = {1,4}; black {1,2,3} -> 1, white {4} -> 1
        assert_eq!(counts["kolir"]["black"], 1);
        assert_eq!(counts["kolir"]["white"], 1);
        // category's own base excludes the category facet -> full corpus
        assert_eq!(counts["category"]["10"], 2);
        assert_eq!(counts["price"]["0-1000"], 2);
    }

    #[tokio::test]
    async fn zero_counts_are_suppressed_unless_active() {
        let store = MemoryFacetStore::new();
        store
            .add_members(ALL_PRODUCTS_KEY, &["1".to_string()])
            .await
            .unwrap();
        store
            .add_members("facet:kolir:black", &["1".to_string()])
            .await
            .unwrap();
        store
            .add_members("facet:kolir:white", &["2".to_string()])
            .await
            .unwrap();
        store
            .add_members("facet:category:10", &["1".to_string()])
            .await
            .unwrap();
        let engine = FilterEngine::new(Arc::new(store));

        // white ∩ {1} is empty and white is not selected: suppressed
        let counts = engine
            .filter_counts(&selection(&[("category", &["10"])]))
            .await
            .unwrap();
        assert!(!counts["kolir"].contains_key("white"));

        // white selected: kept at zero so the UI can offer deselection
        let counts = engine
            .filter_counts(&selection(&[
                ("category", &["10"]),
                ("kolir", &["white"]),
            ]))
            .await
            .unwrap();
        assert_eq!(counts["kolir"]["white"], 0);
    }

    #[tokio::test]
    async fn counts_with_multi_value_selections_use_stored_unions() {
        let engine = seeded_engine().await;
        let applied = selection(&[("category", &["10"]), ("kolir", &["black", "white"])]);

        let counts = engine.filter_counts(&applied).await.unwrap();

        // kolir base = category:10 = {1,4}
        assert_eq!(counts["kolir"]["black"], 1);
        assert_eq!(counts["kolir"]["white"], 1);
        // category base = black ∪ white = {1,2,3,4}
        assert_eq!(counts["category"]["10"], 2);
        // price base = category:10 ∩ (black ∪ white) = {1,4}
        assert_eq!(counts["price"]["0-1000"], 2);
    }

    #[tokio::test]
    async fn scratch_keys_stay_outside_the_facet_namespace() {
        let store = Arc::new(MemoryFacetStore::new());
        let seeds = [
            (ALL_PRODUCTS_KEY, vec!["1", "2"]),
            ("facet:kolir:black", vec!["1"]),
            ("facet:kolir:white", vec!["2"]),
            ("facet:category:10", vec!["1", "2"]),
        ];
        for (key, ids) in seeds {
            let ids: Vec<String> = ids.into_iter().map(|s| s.to_string()).collect();
            store.add_members(key, &ids).await.unwrap();
        }
        let engine = FilterEngine::new(store.clone());

        let before = store.keys_with_prefix(FACET_PREFIX).await.unwrap();
        engine
            .filter_counts(&selection(&[
                ("category", &["10"]),
                ("kolir", &["black", "white"]),
            ]))
            .await
            .unwrap();
        let after = store.keys_with_prefix(FACET_PREFIX).await.unwrap();

        // Scratch sets live under their own prefix, never among the
        // index keys a rebuild manages.
        assert_eq!(before, after);
        assert!(store
            .keys_with_prefix("tmp:filters:")
            .await
            .unwrap()
            .iter()
            .all(|k| !k.starts_with(FACET_PREFIX)));
    }

    #[tokio::test]
    async fn escaped_values_round_trip_through_counts() {
        let store = MemoryFacetStore::new();
        store
            .add_members(ALL_PRODUCTS_KEY, &["1".to_string()])
            .await
            .unwrap();
        store
            .add_members(&facet_key("rozmir", "36:38"), &["1".to_string()])
            .await
            .unwrap();
        let engine = FilterEngine::new(Arc::new(store));

        let counts = engine.filter_counts(&FilterSelection::new()).await.unwrap();
        assert_eq!(counts["rozmir"]["36:38"], 1);

        let set = engine
            .candidate_set(&selection(&[("rozmir", &["36:38"])]))
            .await
            .unwrap();
        assert_eq!(set, ids(&["1"]));
    }
}
