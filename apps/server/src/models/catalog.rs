//! Catalog row types and API response shapes

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

/// A product row as stored in the primary store
///
/// Identifiers are externally assigned by the feed and stable across
/// imports. The facet index only ever reads these rows.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product attribute as rendered in API responses
#[derive(Debug, Clone, Serialize)]
pub struct AttributeView {
    pub name: String,
    pub value: String,
    pub filter_key: String,
}

/// A product together with its eagerly-loaded relations
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub attributes: Vec<AttributeView>,
    pub images: Vec<String>,
    pub categories: Vec<String>,
}

/// Pagination metadata echoed alongside each product page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,
}

/// One page of catalog results
#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub data: Vec<ProductView>,
    pub meta: PageMeta,
}

/// Sort orders accepted by the catalog listing
///
/// Every order is made total by an ascending id tiebreak, so repeated
/// pagination sweeps are deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    PriceAsc,
    PriceDesc,
    #[default]
    IdAsc,
}

impl FromStr for SortBy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price_asc" => Ok(SortBy::PriceAsc),
            "price_desc" => Ok(SortBy::PriceDesc),
            "id_asc" => Ok(SortBy::IdAsc),
            other => Err(crate::Error::Validation(format!(
                "Unsupported sort_by value: {other}"
            ))),
        }
    }
}

impl SortBy {
    /// ORDER BY clause for this sort, id-tiebroken
    pub fn order_by_sql(self) -> &'static str {
        match self {
            SortBy::PriceAsc => "ORDER BY price ASC, id ASC",
            SortBy::PriceDesc => "ORDER BY price DESC, id ASC",
            SortBy::IdAsc => "ORDER BY id ASC",
        }
    }
}

/// One selectable value within a facet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetValue {
    pub value: String,
    pub display_value: String,
    pub count: u64,
    pub active: bool,
}

/// A filterable dimension with its selectable values
#[derive(Debug, Clone, Serialize)]
pub struct FacetGroup {
    pub name: String,
    pub slug: String,
    pub values: Vec<FacetValue>,
}
