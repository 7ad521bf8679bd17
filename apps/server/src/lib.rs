//! Vitryna - product catalog backend
//!
//! A catalog API server with:
//! - XML product feed import into PostgreSQL
//! - Redis-backed faceted filter index (full rebuild after each import)
//! - AND-of-ORs filter queries with per-value match counts
//! - Sorted, paginated catalog browsing

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod facet;
pub mod import;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
