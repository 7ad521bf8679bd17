//! Domain models

pub mod catalog;

pub use catalog::{
    AttributeView, FacetGroup, FacetValue, PageMeta, Product, ProductPage, ProductView, SortBy,
};
