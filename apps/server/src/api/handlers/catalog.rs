//! Product listing handler
//!
//! `GET /api/catalog/products?page=&limit=&sort_by=&filter[facet][]=v`

use crate::api::query::parse_filter_selection;
use crate::facet::query::FilterEngine;
use crate::models::{ProductPage, SortBy};
use crate::services::CatalogService;
use crate::state::AppState;
use crate::Result;
use axum::{
    extract::{Query, State},
    http::Uri,
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ProductListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
}

pub async fn get_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
    uri: Uri,
) -> Result<Json<ProductPage>> {
    let page = params.page.unwrap_or(1);
    if page < 1 {
        return Err(crate::Error::Validation("page must be at least 1".to_string()));
    }
    let limit = params.limit.unwrap_or(10);
    if !(1..=100).contains(&limit) {
        return Err(crate::Error::Validation(
            "limit must be between 1 and 100".to_string(),
        ));
    }
    let sort_by: SortBy = params.sort_by.as_deref().unwrap_or("id_asc").parse()?;
    let filters = parse_filter_selection(uri.query());

    let service = CatalogService::new(state.db.clone(), FilterEngine::new(state.facets.clone()));
    let result = service.get_products(page, limit, sort_by, &filters).await?;
    Ok(Json(result))
}
