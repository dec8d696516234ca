//! Application module: exposes the view model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the active tab, search
//! query and cursor over the catalog.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
