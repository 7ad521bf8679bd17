//! Filter selection parsing from the query string
//!
//! Filters arrive as `filter[facet]=value` pairs (with optional
//! bracketed array suffixes: `filter[facet][]=v`, `filter[facet][0]=v`).
//! They are normalized into the typed [`FilterSelection`] at this
//! boundary; anything malformed is dropped so the core never sees an
//! untyped blob.

use crate::facet::FilterSelection;
use url::form_urlencoded;

/// Parse the active filter selection out of a raw query string
pub fn parse_filter_selection(raw_query: Option<&str>) -> FilterSelection {
    let mut selection = FilterSelection::new();
    let Some(raw) = raw_query else {
        return selection;
    };

    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        let Some(facet) = filter_param_facet(&key) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        let values = selection.entry(facet.to_string()).or_default();
        if !values.iter().any(|v| v == value.as_ref()) {
            values.push(value.into_owned());
        }
    }

    selection
}

/// Extract the facet name from a `filter[...]` parameter key
fn filter_param_facet(key: &str) -> Option<&str> {
    let rest = key.strip_prefix("filter[")?;
    let (facet, suffix) = rest.split_once(']')?;
    if facet.is_empty() {
        return None;
    }
    match suffix {
        "" => Some(facet),
        s if s.starts_with('[') && s.ends_with(']') => Some(facet),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_and_array_styles() {
        let selection = parse_filter_selection(Some(
            "filter[kolir]=black&filter[category][]=10&filter[category][]=11&filter[price][0]=0-1000",
        ));
        assert_eq!(selection["kolir"], vec!["black"]);
        assert_eq!(selection["category"], vec!["10", "11"]);
        assert_eq!(selection["price"], vec!["0-1000"]);
    }

    #[test]
    fn decodes_percent_encoding() {
        let selection =
            parse_filter_selection(Some("filter%5Bkolir%5D%5B%5D=black&filter[rozmir]=36%3A38"));
        assert_eq!(selection["kolir"], vec!["black"]);
        assert_eq!(selection["rozmir"], vec!["36:38"]);
    }

    #[test]
    fn ignores_malformed_and_foreign_parameters() {
        let selection = parse_filter_selection(Some(
            "page=2&limit=10&filter[]=x&filter[kolir=black&filter[kolir]extra=bad&filter[sklad]=",
        ));
        assert!(selection.is_empty());
    }

    #[test]
    fn deduplicates_repeated_values_preserving_order() {
        let selection = parse_filter_selection(Some(
            "filter[kolir][]=black&filter[kolir][]=white&filter[kolir][]=black",
        ));
        assert_eq!(selection["kolir"], vec!["black", "white"]);
    }

    #[test]
    fn empty_query_yields_empty_selection() {
        assert!(parse_filter_selection(None).is_empty());
        assert!(parse_filter_selection(Some("")).is_empty());
    }
}
