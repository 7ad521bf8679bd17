//! Service layer - orchestrates the filter engine and the primary store

pub mod catalog;
pub mod filter;

pub use catalog::CatalogService;
pub use filter::FilterService;
