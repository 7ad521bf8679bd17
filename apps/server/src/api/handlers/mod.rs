//! Request handlers for the catalog API

pub mod catalog;
pub mod filters;
