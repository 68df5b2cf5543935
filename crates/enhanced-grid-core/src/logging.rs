//! Logging facilities for Enhanced Grid.
//!
//! Enhanced Grid uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("enhanced_grid::editor=debug")
//!         .init();
//! }
//! ```
//!
//! Rejected selection and edit requests are routine and logged at `debug`.
//! Edit session transitions are logged at `debug`, signal emission at
//! `trace`, and recoverable oddities (truncated backend pages, invalid
//! filter expressions) at `warn`.

/// Span names used throughout Enhanced Grid for tracing.
pub mod span_names {
    /// Query execution against a data source.
    pub const QUERY: &str = "enhanced_grid::query";
    /// Filter composition.
    pub const COMPOSE_FILTER: &str = "enhanced_grid::compose_filter";
    /// Signal emission span.
    pub const SIGNAL: &str = "enhanced_grid_core::signal";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "enhanced_grid_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "enhanced_grid_core::signal";
    /// Selection model and gate.
    pub const SELECTION: &str = "enhanced_grid::selection";
    /// Edit session controller.
    pub const EDITOR: &str = "enhanced_grid::editor";
    /// Column filters and the filter composer.
    pub const FILTER: &str = "enhanced_grid::filter";
    /// Sort composer.
    pub const SORT: &str = "enhanced_grid::sort";
    /// Data source adapters and fetch sequencing.
    pub const DATA: &str = "enhanced_grid::data";
    /// Grid facade.
    pub const GRID: &str = "enhanced_grid::grid";
}
