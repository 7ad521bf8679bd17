//! Database layer - repositories and data access
//!
//! The catalog only ever performs bulk reads against these tables at
//! query time; writes happen in the import pipeline.

pub mod categories;
pub mod products;

pub use categories::CategoryRepository;
pub use products::ProductRepository;
