//! Model layer of Enhanced Grid.
//!
//! The types here are independent of any widget toolkit: they decide which
//! rows are shown, in which order, which of them are selected and which one is
//! being edited.
//!
//! # Core Types
//!
//! - `Column`: value accessor with optional filter and sort keys
//! - `FilterFieldDto`, `TextFilter`, `RangeFilter`: pluggable column filters
//! - `FilterComposer`: combines column filters into one `Filter`
//! - `SortComposer`: ordered sort keys, comparators and backend sort orders
//! - `SelectionModel`: none/single/multi selection guarded by a gate
//! - `EditController`: the single edit session and its confirmation protocol
//! - `DataSource`: in-memory or backend rows, flat or hierarchical
//!
//! # Architecture Overview
//!
//! ```text
//! ┌──────────┐  filter   ┌────────────────┐
//! │ Column[] │──────────>│ FilterComposer │──┐
//! └──────────┘           └────────────────┘  │   ┌───────┐    ┌────────────┐
//!       │        sort    ┌──────────────┐    ├──>│ Query │───>│ DataSource │
//!       └───────────────>│ SortComposer │────┘   └───────┘    └────────────┘
//!                        └──────────────┘
//! ┌────────────────┐   ┌────────────────┐
//! │ SelectionModel │   │ EditController │   consulted per row for RowView
//! └────────────────┘   └────────────────┘
//! ```

mod column;
pub mod data_source;
pub mod editor;
mod filter;
mod identity;
pub mod selection;
mod sort;

pub use column::{Column, FilterIndicator, RowComparator, ValueAccessor};
pub use data_source::{
    CountFn, DataSource, FetchFn, FetchSequencer, FetchTicket, HasChildrenFn, ParentAccessor,
    ParentKey, Query,
};
pub use editor::{
    ConfirmChoice, ConfirmPrompt, ConfirmationId, EditController, EditSession, EditState,
    EditableGate, EditorConfig, EditorEffect, NavigationContinuation, PendingRequest,
};
pub use filter::{
    Filter, FilterComposer, FilterFieldDto, RangeFilter, RowPredicate, TextFilter, ValuePredicate,
};
pub use identity::RowIdentity;
pub use selection::{SelectionChange, SelectionGate, SelectionMode, SelectionModel};
pub use sort::{QuerySort, QuerySortOrder, SortComposer, SortDirection, SortOrder};
