//! Prelude module for Enhanced Grid.
//!
//! ```ignore
//! use enhanced_grid::prelude::*;
//! ```

// ============================================================================
// Grid
// ============================================================================

pub use crate::config::GridConfig;
pub use crate::grid::{ConfirmDialog, EnhancedGrid, NavigationOutcome, RowView};

// ============================================================================
// Signals and errors
// ============================================================================

pub use enhanced_grid_core::{ConnectionId, GridError, Property, Result, Signal};

// ============================================================================
// Model
// ============================================================================

pub use crate::model::{
    Column, ConfirmChoice, ConfirmPrompt, ConfirmationId, DataSource, EditorConfig, Filter,
    FilterFieldDto, FilterIndicator, ParentKey, Query, QuerySortOrder, RangeFilter, RowIdentity,
    SelectionChange, SelectionMode, SortDirection, SortOrder, TextFilter,
};
