//! Track catalog: the data model, the store with its filtered view, and the
//! sources tracks are fetched from.
//!
//! The store owns the tracks. Everything else reads them through
//! `CatalogStore::filtered` or by id.

mod fetch;
mod filter;
mod model;
mod store;

pub use fetch::{CatalogSource, source_for};
pub use model::*;
pub use store::{CatalogGeneration, CatalogStore};

#[cfg(test)]
mod tests;
