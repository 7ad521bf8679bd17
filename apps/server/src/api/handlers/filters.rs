//! Filter handlers
//!
//! `GET /api/catalog/filters` renders filter groups with display names
//! and counts; `GET /api/catalog/filter-counts` returns the raw counts
//! map. Both accept the same `filter[facet][]=v` selection parameters.

use crate::api::query::parse_filter_selection;
use crate::facet::query::{FilterCounts, FilterEngine};
use crate::models::FacetGroup;
use crate::services::FilterService;
use crate::state::AppState;
use crate::Result;
use axum::{extract::State, http::Uri, Json};

pub async fn get_filters(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Json<Vec<FacetGroup>>> {
    let active = parse_filter_selection(uri.query());
    let service = FilterService::new(state.db.clone(), FilterEngine::new(state.facets.clone()));
    Ok(Json(service.get_filters(&active).await?))
}

pub async fn get_filter_counts(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Json<FilterCounts>> {
    let applied = parse_filter_selection(uri.query());
    let service = FilterService::new(state.db.clone(), FilterEngine::new(state.facets.clone()));
    Ok(Json(service.get_filter_counts(&applied).await?))
}
