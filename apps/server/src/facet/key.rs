//! Facet index key construction
//!
//! Every index key is built through [`facet_key`] so the key grammar is
//! defined in exactly one place: `facet:{name}:{value}`. The value
//! segment is escaped (`%` -> `%25`, `:` -> `%3A`) so a value containing
//! the delimiter cannot alias another key.

/// Prefix under which all facet-value sets live
pub const FACET_PREFIX: &str = "facet:";

/// Corpus set holding every product id
pub const ALL_PRODUCTS_KEY: &str = "products:all";

/// Corpus set holding ids of products with `available = true`
pub const AVAILABLE_PRODUCTS_KEY: &str = "products:available";

/// Build the index key for a facet value
pub fn facet_key(facet: &str, value: &str) -> String {
    format!("{FACET_PREFIX}{facet}:{}", escape_value(value))
}

/// Split an index key back into `(facet, value)`
///
/// Returns `None` for keys outside the facet namespace or without a
/// value segment. Facet names never contain `:` (they are slugs or the
/// literals `category`/`price`), so the first delimiter after the
/// prefix is unambiguous.
pub fn split_key(key: &str) -> Option<(&str, String)> {
    let rest = key.strip_prefix(FACET_PREFIX)?;
    let (facet, value) = rest.split_once(':')?;
    if facet.is_empty() {
        return None;
    }
    Some((facet, unescape_value(value)))
}

fn escape_value(value: &str) -> String {
    value.replace('%', "%25").replace(':', "%3A")
}

fn unescape_value(value: &str) -> String {
    value.replace("%3A", ":").replace("%25", "%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_plain_keys() {
        assert_eq!(facet_key("kolir", "black"), "facet:kolir:black");
        assert_eq!(facet_key("category", "10"), "facet:category:10");
        assert_eq!(facet_key("price", "1000-5000"), "facet:price:1000-5000");
    }

    #[test]
    fn escapes_delimiters_in_values() {
        let key = facet_key("rozmir", "36:38");
        assert_eq!(key, "facet:rozmir:36%3A38");
        assert_eq!(split_key(&key), Some(("rozmir", "36:38".to_string())));
    }

    #[test]
    fn escape_round_trips_percent_signs() {
        let key = facet_key("sklad", "100% cotton");
        assert_eq!(split_key(&key), Some(("sklad", "100% cotton".to_string())));
        // Escaping is injective: a literal "%3A" survives the round trip
        let tricky = facet_key("sklad", "a%3Ab");
        assert_eq!(split_key(&tricky), Some(("sklad", "a%3Ab".to_string())));
    }

    #[test]
    fn rejects_foreign_keys() {
        assert_eq!(split_key("products:all"), None);
        assert_eq!(split_key("facet:"), None);
        assert_eq!(split_key("facet:kolir"), None);
    }
}
