//! Enhanced Grid - selection, editing, filtering and sorting for data grids.
//!
//! This crate is the controller layer that sits between a tabular or tree
//! display widget and its rows. It decides which rows may be selected and
//! edited, runs the single edit session with its confirmation protocol, and
//! turns per-column filters and sort keys into queries against in-memory or
//! backend data sources.
//!
//! # Example
//!
//! ```ignore
//! use enhanced_grid::prelude::*;
//!
//! let mut grid = EnhancedGrid::new(
//!     RowIdentity::new(|p: &Person| p.id),
//!     DataSource::in_memory(people),
//! );
//! grid.set_selection_predicate(|p: &Person| p.active);
//! grid.set_confirm_dialog(|prompt: &ConfirmPrompt| show_dialog(prompt));
//!
//! grid.edit_item(&bob);
//! // Opening another row asks before discarding Bob's edits.
//! grid.edit_item(&ann);
//! ```

pub use enhanced_grid_core::*;

pub mod config;
mod grid;
pub mod model;
pub mod prelude;

pub use config::GridConfig;
pub use grid::{ConfirmDialog, EnhancedGrid, NavigationOutcome, RowView};
