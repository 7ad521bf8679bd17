//! XML feed parsing
//!
//! Streams a YML-style feed (`<category>` elements followed by
//! `<offer>` elements) into typed records with quick-xml. Offers
//! missing an id, name or parsable price are skipped with a warning
//! rather than failing the import.

use crate::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rust_decimal::Decimal;
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct FeedCategory {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FeedOffer {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub currency_id: String,
    pub stock_quantity: i32,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub vendor_code: Option<String>,
    pub barcode: Option<String>,
    pub available: bool,
    /// (attribute name, value) pairs from `<param name="...">` elements
    pub params: Vec<(String, String)>,
    pub images: Vec<String>,
    pub category_ids: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Feed {
    pub categories: Vec<FeedCategory>,
    pub offers: Vec<FeedOffer>,
    /// Offers dropped for missing required fields
    pub skipped: usize,
}

/// Parse a feed file from disk
pub fn parse_feed(path: &Path) -> Result<Feed> {
    let mut reader = Reader::from_file(path)
        .map_err(|e| Error::Feed(format!("Cannot open feed {}: {e}", path.display())))?;
    parse(&mut reader)
}

/// Parse a feed from an in-memory document
pub fn parse_feed_str(xml: &str) -> Result<Feed> {
    let mut reader = Reader::from_str(xml);
    parse(&mut reader)
}

#[derive(Debug, Default)]
struct OfferDraft {
    id: String,
    available: bool,
    name: String,
    price_text: String,
    currency_id: String,
    stock_quantity: i32,
    description: Option<String>,
    vendor: Option<String>,
    vendor_code: Option<String>,
    barcode: Option<String>,
    params: Vec<(String, String)>,
    images: Vec<String>,
    category_ids: Vec<String>,
}

impl OfferDraft {
    fn finish(self) -> Option<FeedOffer> {
        if self.id.is_empty() || self.name.is_empty() {
            return None;
        }
        let price = Decimal::from_str(self.price_text.trim()).ok()?;
        Some(FeedOffer {
            id: self.id,
            name: self.name,
            price: price.round_dp(2),
            currency_id: self.currency_id,
            stock_quantity: self.stock_quantity,
            description: self.description,
            vendor: self.vendor,
            vendor_code: self.vendor_code,
            barcode: self.barcode,
            available: self.available,
            params: self.params,
            images: self.images,
            category_ids: self.category_ids,
        })
    }
}

fn parse<R: BufRead>(reader: &mut Reader<R>) -> Result<Feed> {
    let mut feed = Feed::default();
    let mut buf = Vec::new();

    let mut category: Option<FeedCategory> = None;
    let mut offer: Option<OfferDraft> = None;
    let mut param_name: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                text.clear();
                match e.name().as_ref() {
                    b"category" => {
                        let id = attribute(&e, "id")?.unwrap_or_default();
                        let parent_id = attribute(&e, "parentId")?.filter(|p| !p.is_empty());
                        category = Some(FeedCategory {
                            id,
                            name: String::new(),
                            parent_id,
                        });
                    }
                    b"offer" => {
                        let mut draft = OfferDraft {
                            id: attribute(&e, "id")?.unwrap_or_default(),
                            ..OfferDraft::default()
                        };
                        draft.available =
                            attribute(&e, "available")?.as_deref() == Some("true");
                        offer = Some(draft);
                    }
                    b"param" if offer.is_some() => {
                        param_name = attribute(&e, "name")?;
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(t)) => {
                let chunk = t
                    .unescape()
                    .map_err(|e| Error::Feed(format!("Bad text content: {e}")))?;
                text.push_str(&chunk);
            }
            // Descriptions are commonly wrapped in CDATA
            Ok(Event::CData(t)) => {
                text.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            Ok(Event::End(e)) => {
                let value = text.trim().to_string();
                text.clear();
                match e.name().as_ref() {
                    b"category" => {
                        if let Some(mut cat) = category.take() {
                            cat.name = value;
                            if cat.id.is_empty() || cat.name.is_empty() {
                                tracing::warn!("Skipping category without id or name");
                            } else {
                                feed.categories.push(cat);
                            }
                        }
                    }
                    b"offer" => {
                        if let Some(draft) = offer.take() {
                            let id = draft.id.clone();
                            match draft.finish() {
                                Some(parsed) => feed.offers.push(parsed),
                                None => {
                                    tracing::warn!(
                                        offer_id = %id,
                                        "Skipping offer with missing required fields"
                                    );
                                    feed.skipped += 1;
                                }
                            }
                        }
                    }
                    tag => {
                        if let Some(draft) = offer.as_mut() {
                            assign_offer_field(draft, tag, value, &mut param_name);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(Error::Feed(format!(
                    "XML error at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
        }
        buf.clear();
    }

    Ok(feed)
}

fn assign_offer_field(
    draft: &mut OfferDraft,
    tag: &[u8],
    value: String,
    param_name: &mut Option<String>,
) {
    match tag {
        b"name" => draft.name = value,
        b"price" => draft.price_text = value,
        b"currencyId" => draft.currency_id = value,
        b"stock_quantity" => draft.stock_quantity = value.parse().unwrap_or(0),
        b"description" => draft.description = non_empty(value),
        b"vendor" => draft.vendor = non_empty(value),
        b"vendor_code" => draft.vendor_code = non_empty(value),
        b"barcode" => draft.barcode = non_empty(value),
        b"picture" => {
            if !value.is_empty() {
                draft.images.push(value);
            }
        }
        b"categoryId" => {
            if !value.is_empty() {
                draft.category_ids.push(value);
            }
        }
        b"param" => {
            if let Some(name) = param_name.take() {
                if !name.is_empty() {
                    draft.params.push((name, value));
                }
            }
        }
        _ => {}
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    let attr = element
        .try_get_attribute(name)
        .map_err(|e| Error::Feed(format!("Bad attribute {name}: {e}")))?;
    match attr {
        Some(attr) => {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Feed(format!("Bad attribute value for {name}: {e}")))?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<yml_catalog date="2026-08-01 12:00">
  <shop>
    <categories>
      <category id="1">Одяг</category>
      <category id="2" parentId="1">Куртки</category>
    </categories>
    <offers>
      <offer id="101" available="true">
        <name>Куртка зимова</name>
        <price>2499.90</price>
        <currencyId>UAH</currencyId>
        <stock_quantity>7</stock_quantity>
        <vendor>Acme</vendor>
        <categoryId>2</categoryId>
        <picture>https://cdn.example/101-front.jpg</picture>
        <picture>https://cdn.example/101-back.jpg</picture>
        <param name="Колір">Чорний</param>
        <param name="Розмір постачальника">XL</param>
      </offer>
      <offer id="102" available="false">
        <name>Без ціни</name>
        <price>not-a-number</price>
      </offer>
    </offers>
  </shop>
</yml_catalog>"#;

    #[test]
    fn parses_categories_and_offers() {
        let feed = parse_feed_str(SAMPLE).unwrap();

        assert_eq!(feed.categories.len(), 2);
        assert_eq!(feed.categories[0].id, "1");
        assert_eq!(feed.categories[0].name, "Одяг");
        assert_eq!(feed.categories[0].parent_id, None);
        assert_eq!(feed.categories[1].parent_id.as_deref(), Some("1"));

        assert_eq!(feed.offers.len(), 1);
        let offer = &feed.offers[0];
        assert_eq!(offer.id, "101");
        assert_eq!(offer.name, "Куртка зимова");
        assert_eq!(offer.price, Decimal::from_str("2499.90").unwrap());
        assert_eq!(offer.currency_id, "UAH");
        assert_eq!(offer.stock_quantity, 7);
        assert!(offer.available);
        assert_eq!(offer.images.len(), 2);
        assert_eq!(offer.category_ids, vec!["2".to_string()]);
        assert_eq!(
            offer.params,
            vec![
                ("Колір".to_string(), "Чорний".to_string()),
                ("Розмір постачальника".to_string(), "XL".to_string()),
            ]
        );
    }

    #[test]
    fn skips_offers_with_unparsable_price() {
        let feed = parse_feed_str(SAMPLE).unwrap();
        assert_eq!(feed.skipped, 1);
        assert!(feed.offers.iter().all(|o| o.id != "102"));
    }

    #[test]
    fn rounds_prices_to_two_fraction_digits() {
        let xml = r#"<offers><offer id="1" available="true">
            <name>Test</name><price>10.999</price>
        </offer></offers>"#;
        let feed = parse_feed_str(xml).unwrap();
        assert_eq!(feed.offers[0].price, Decimal::from_str("11.00").unwrap());
    }
}
