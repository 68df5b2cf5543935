//! The grid controller.
//!
//! [`EnhancedGrid`] wires the model layer together: column filters feed the
//! composite filter, sort keys feed the comparator or backend orders, both
//! feed every query against the data source, and the selection model and
//! edit controller decide the per-row state a display renders.
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
//! grid.add_column(
//!     Column::new("name")
//!         .with_ordered_value(|p: &Person| p.name.clone())
//!         .with_filter(TextFilter::default())?,
//! )?;
//!
//! grid.apply_filter("name", TextFilter::new("bo"))?;
//! grid.sort("name", SortDirection::Descending)?;
//! for view in grid.row_views(&grid.fetch(0, 50)?) {
//!     println!("{:?} selected={}", view.row, view.selected);
//! }
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use enhanced_grid_core::logging::targets;
use enhanced_grid_core::{GridError, Result, Signal};

use crate::config::GridConfig;
use crate::model::{
    Column, ConfirmChoice, ConfirmPrompt, ConfirmationId, DataSource, EditController, EditorEffect,
    FetchSequencer, FetchTicket, Filter, FilterComposer, ParentKey, Query, QuerySort, RowIdentity,
    SelectionMode, SelectionModel, SortComposer, SortDirection, SortOrder,
};

/// Shows confirmation dialogs on behalf of the grid.
///
/// The host answers through [`EnhancedGrid::resolve_confirmation`] with the
/// id carried by the prompt.
pub trait ConfirmDialog: Send + Sync {
    fn open(&self, prompt: &ConfirmPrompt);
}

impl<F> ConfirmDialog for F
where
    F: Fn(&ConfirmPrompt) + Send + Sync,
{
    fn open(&self, prompt: &ConfirmPrompt) {
        self(prompt)
    }
}

/// Result of [`EnhancedGrid::before_navigation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The continuation already ran.
    Proceeded,
    /// The continuation waits for a confirmation.
    Postponed,
}

/// Per-row display state.
#[derive(Debug, Clone, PartialEq)]
pub struct RowView<T> {
    pub row: T,
    pub selected: bool,
    pub selection_disabled: bool,
    pub editable: bool,
    pub editing: bool,
}

/// Data grid controller.
///
/// # Signals
///
/// - `filter_changed`: the composite filter was recomputed, carries the ids
///   of the columns with an active filter
/// - `sort_changed`: the sort keys changed
/// - `popup_changed`: the open filter popup changed, carries its column
///
/// Selection and editor signals live on [`selection`](Self::selection) and
/// [`editor`](Self::editor).
pub struct EnhancedGrid<T, K> {
    identity: RowIdentity<T, K>,
    columns: Vec<Column<T>>,
    filter: Filter<T>,
    sort: SortComposer,
    selection: SelectionModel<T, K>,
    editor: EditController<T, K>,
    data: DataSource<T, K>,
    fetches: FetchSequencer,
    config: GridConfig,
    dialog: Option<Arc<dyn ConfirmDialog>>,
    popup: Option<String>,

    pub filter_changed: Signal<Vec<String>>,
    pub sort_changed: Signal<Vec<SortOrder>>,
    pub popup_changed: Signal<Option<String>>,
}

impl<T, K> EnhancedGrid<T, K>
where
    T: Clone + Send + Sync + 'static,
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    /// Creates a grid with the default configuration.
    pub fn new(identity: RowIdentity<T, K>, data: DataSource<T, K>) -> Self {
        Self::with_config(identity, data, GridConfig::default())
    }

    pub fn with_config(
        identity: RowIdentity<T, K>,
        data: DataSource<T, K>,
        config: GridConfig,
    ) -> Self {
        let mut selection = SelectionModel::new(identity.clone());
        selection.set_selection_mode(config.selection_mode);
        selection.set_deselect_allowed(config.deselect_allowed);

        Self {
            editor: EditController::new(identity.clone(), config.editor.clone()),
            sort: SortComposer::new(config.multi_sort),
            identity,
            columns: Vec::new(),
            filter: Filter::identity(),
            selection,
            data,
            fetches: FetchSequencer::new(),
            config,
            dialog: None,
            popup: None,
            filter_changed: Signal::new(),
            sort_changed: Signal::new(),
            popup_changed: Signal::new(),
        }
    }

    pub fn set_confirm_dialog(&mut self, dialog: impl ConfirmDialog + 'static) {
        self.dialog = Some(Arc::new(dialog));
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Applies a new configuration in one step.
    ///
    /// A changed selection mode clears the selection. An open edit session
    /// keeps running under the new editor flags.
    pub fn reconfigure(&mut self, config: GridConfig) {
        self.selection.set_selection_mode(config.selection_mode);
        self.selection.set_deselect_allowed(config.deselect_allowed);
        if self.sort.set_multi_sort(config.multi_sort) {
            self.sort_updated();
        }
        self.editor.set_config(config.editor.clone());
        tracing::debug!(target: targets::GRID, ?config, "grid reconfigured");
        self.config = config;
    }

    pub fn identity(&self) -> &RowIdentity<T, K> {
        &self.identity
    }

    pub fn data_source(&self) -> &DataSource<T, K> {
        &self.data
    }

    pub fn selection(&self) -> &SelectionModel<T, K> {
        &self.selection
    }

    pub fn editor(&self) -> &EditController<T, K> {
        &self.editor
    }

    // =========================================================================
    // Columns & filters
    // =========================================================================

    /// Adds a column. A non-empty initial filter takes effect immediately.
    pub fn add_column(&mut self, column: Column<T>) -> Result<()> {
        if self.column(column.id()).is_some() {
            return Err(GridError::DuplicateColumn(column.id().to_string()));
        }
        let filtered = !column.is_filter_empty();
        self.columns.push(column);
        if filtered {
            self.recompose_filter();
        }
        Ok(())
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    pub fn column(&self, id: &str) -> Option<&Column<T>> {
        self.columns.iter().find(|c| c.id() == id)
    }

    fn column_mut(&mut self, id: &str) -> Result<&mut Column<T>> {
        self.columns
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or_else(|| GridError::UnknownColumn(id.to_string()))
    }

    /// The composite filter currently applied to queries.
    pub fn filter(&self) -> &Filter<T> {
        &self.filter
    }

    /// Sets a column's filter value and recomposes.
    ///
    /// Returns `Ok(false)` if the value equals the current one; nothing is
    /// recomputed or re-queried in that case.
    pub fn apply_filter<D: 'static>(&mut self, column: &str, value: D) -> Result<bool> {
        let changed = self.column_mut(column)?.apply_filter(value)?;
        if changed {
            self.recompose_filter();
        }
        Ok(changed)
    }

    /// Resets a column's filter to its empty value.
    pub fn clear_filter(&mut self, column: &str) -> Result<bool> {
        let changed = self.column_mut(column)?.clear_filter()?;
        if changed {
            self.recompose_filter();
        }
        Ok(changed)
    }

    /// Resets every column filter, then recomposes once.
    pub fn clear_all_filters(&mut self) -> bool {
        let mut changed = false;
        for column in self.columns.iter_mut().filter(|c| c.has_filter()) {
            changed |= column.clear_filter().unwrap_or(false);
        }
        if changed {
            self.recompose_filter();
        }
        changed
    }

    fn recompose_filter(&mut self) {
        self.filter = FilterComposer::compose(&self.columns);
        self.fetches.invalidate();
        self.filter_changed.emit(self.filter.active_columns().to_vec());
    }

    // =========================================================================
    // Filter popup
    // =========================================================================

    /// Column whose filter popup is open.
    pub fn open_popup(&self) -> Option<&str> {
        self.popup.as_deref()
    }

    /// Opens a column's filter popup.
    ///
    /// While a row is being edited this goes through the confirmation
    /// protocol; the popup opens once the host confirms.
    pub fn open_filter_popup(&mut self, column: &str) -> Result<()> {
        let has_filter = self
            .column(column)
            .ok_or_else(|| GridError::UnknownColumn(column.to_string()))?
            .has_filter();
        if !has_filter {
            return Err(GridError::NoFilter {
                column: column.to_string(),
            });
        }
        if self.popup.as_deref() == Some(column) {
            return Ok(());
        }
        let effect = self.editor.request_filter_popup(column);
        self.dispatch(effect);
        Ok(())
    }

    pub fn close_filter_popup(&mut self) {
        self.set_popup(None);
    }

    /// Applies a value from the open popup and closes it.
    pub fn apply_popup_filter<D: 'static>(&mut self, value: D) -> Result<bool> {
        let Some(column) = self.popup.clone() else {
            return Ok(false);
        };
        let changed = self.apply_filter(&column, value)?;
        self.close_filter_popup();
        Ok(changed)
    }

    /// Clears the filter of the open popup. The popup stays open.
    pub fn reset_popup_filter(&mut self) -> Result<bool> {
        match self.popup.clone() {
            Some(column) => self.clear_filter(&column),
            None => Ok(false),
        }
    }

    fn set_popup(&mut self, popup: Option<String>) {
        if self.popup != popup {
            self.popup = popup;
            self.popup_changed.emit(self.popup.clone());
        }
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    pub fn sort_orders(&self) -> &[SortOrder] {
        self.sort.orders()
    }

    /// Sorts by one column, replacing all keys.
    pub fn sort(&mut self, column: &str, direction: SortDirection) -> Result<()> {
        self.set_sort(vec![SortOrder::new(column, direction)])
    }

    /// Adds a key; with multi-sort disabled it replaces the others.
    pub fn add_sort(&mut self, column: &str, direction: SortDirection) -> Result<()> {
        self.check_sortable(column)?;
        if self.sort.add(SortOrder::new(column, direction)) {
            self.sort_updated();
        }
        Ok(())
    }

    /// Cycles a column through ascending, descending and unsorted.
    pub fn toggle_sort(&mut self, column: &str) -> Result<()> {
        self.check_sortable(column)?;
        if self.sort.toggle(column) {
            self.sort_updated();
        }
        Ok(())
    }

    pub fn set_sort(&mut self, orders: Vec<SortOrder>) -> Result<()> {
        for order in &orders {
            self.check_sortable(&order.column)?;
        }
        if self.sort.set(orders)? {
            self.sort_updated();
        }
        Ok(())
    }

    pub fn clear_sort(&mut self) {
        if self.sort.clear() {
            self.sort_updated();
        }
    }

    fn check_sortable(&self, id: &str) -> Result<()> {
        let column = self.column(id).ok_or_else(|| GridError::UnknownColumn(id.to_string()))?;
        let in_memory_without_comparator =
            self.data.is_in_memory() && column.comparator().is_none();
        if !column.is_sortable() || in_memory_without_comparator {
            return Err(GridError::NotSortable { column: id.to_string() });
        }
        Ok(())
    }

    fn sort_updated(&mut self) {
        self.fetches.invalidate();
        self.sort_changed.emit(self.sort.orders().to_vec());
    }

    fn query_sort(&self) -> Result<QuerySort<T>> {
        if self.data.is_in_memory() {
            self.sort.in_memory_sort(&self.columns)
        } else {
            self.sort.backend_sort(&self.columns)
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn select(&mut self, row: &T) -> bool {
        self.selection.select(row)
    }

    pub fn deselect(&mut self, row: &T) -> bool {
        self.selection.deselect(row)
    }

    pub fn toggle_selection(&mut self, row: &T) -> bool {
        self.selection.toggle(row)
    }

    pub fn update_selection(&mut self, added: &[T], removed: &[T]) -> bool {
        self.selection.update_selection(added, removed)
    }

    pub fn deselect_all(&mut self) -> bool {
        self.selection.clear()
    }

    /// Selects every row matching the current filter. Multi mode only.
    pub fn select_all(&mut self) -> Result<bool> {
        if self.selection.selection_mode() != SelectionMode::Multi {
            return Ok(false);
        }
        let count = self.count()?;
        let rows = self.fetch(0, count)?;
        Ok(self.selection.select_all(&rows))
    }

    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.config.selection_mode = mode;
        self.selection.set_selection_mode(mode);
    }

    pub fn set_deselect_allowed(&mut self, allowed: bool) {
        self.config.deselect_allowed = allowed;
        self.selection.set_deselect_allowed(allowed);
    }

    /// Replaces the selection gate, revoking rows that fail it.
    pub fn set_selection_predicate<F>(&mut self, gate: F)
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.selection.set_selection_predicate(gate);
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Replaces the editable gate. An open session is not affected.
    pub fn set_editable_predicate<F>(&mut self, gate: F)
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.editor.set_editable_predicate(gate);
    }

    pub fn edit_item(&mut self, row: &T) {
        let effect = self.editor.edit_item(row);
        self.dispatch(effect);
    }

    pub fn cancel_edit(&mut self) {
        let effect = self.editor.cancel_edit();
        self.dispatch(effect);
    }

    /// Changes the working copy of the edited row.
    ///
    /// With an unbuffered editor the change is written to the data source
    /// right away.
    pub fn modify_edited<F>(&mut self, change: F)
    where
        F: FnOnce(&mut T),
    {
        if let Some(row) = self.editor.modify(change) {
            self.commit_row(row);
        }
    }

    /// Commits the edited row and returns it.
    pub fn save_edit(&mut self) -> Option<T> {
        let row = self.editor.save()?;
        self.commit_row(row.clone());
        Some(row)
    }

    /// Answers a confirmation dialog. Stale ids are ignored.
    pub fn resolve_confirmation(&mut self, id: ConfirmationId, choice: ConfirmChoice) {
        let effect = self.editor.resolve(id, choice);
        self.dispatch(effect);
    }

    /// Runs `continuation` now, or after the host confirms discarding the
    /// current edits. A declined confirmation drops it.
    pub fn before_navigation<F>(&mut self, continuation: F) -> NavigationOutcome
    where
        F: FnOnce() + Send + 'static,
    {
        match self.editor.request_navigation(Box::new(continuation)) {
            EditorEffect::Navigate(continuation) => {
                continuation();
                NavigationOutcome::Proceeded
            }
            effect => {
                self.dispatch(effect);
                NavigationOutcome::Postponed
            }
        }
    }

    fn commit_row(&mut self, row: T) {
        if self.data.update_row(&self.identity, row.clone()) {
            self.fetches.invalidate();
        }
        self.selection.refresh_row(&row);
    }

    fn dispatch(&mut self, effect: EditorEffect) {
        match effect {
            EditorEffect::None => {}
            EditorEffect::Prompt(prompt) => match &self.dialog {
                Some(dialog) => dialog.open(&prompt),
                None => tracing::warn!(
                    target: targets::GRID,
                    id = %prompt.id,
                    "confirmation required but no dialog is attached"
                ),
            },
            EditorEffect::Navigate(continuation) => continuation(),
            EditorEffect::OpenPopup { column } => self.set_popup(Some(column)),
            EditorEffect::ClosePopup { column } => {
                if self.popup.as_deref() == Some(column.as_str()) {
                    self.set_popup(None);
                }
            }
        }
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Builds a top-level query with the current filter and sort.
    pub fn query(&self, offset: usize, limit: usize) -> Result<Query<T, K>> {
        Ok(Query::new(offset, limit)
            .with_filter(self.filter.clone())
            .with_sort(self.query_sort()?))
    }

    /// Number of top-level rows matching the current filter.
    pub fn count(&self) -> Result<usize> {
        self.data.count(&self.query(0, 0)?)
    }

    pub fn fetch(&self, offset: usize, limit: usize) -> Result<Vec<T>> {
        self.data.fetch(&self.query(offset, limit)?)
    }

    /// Fetches page `index` of the configured page size.
    pub fn page(&self, index: usize) -> Result<Vec<T>> {
        let size = self.config.page_size;
        self.fetch(index.saturating_mul(size), size)
    }

    pub fn child_count(&self, parent: ParentKey<K>) -> Result<usize> {
        self.data.child_count(&self.query(0, 0)?.with_parent(parent))
    }

    pub fn fetch_children(
        &self,
        parent: ParentKey<K>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<T>> {
        self.data.fetch_children(&self.query(offset, limit)?.with_parent(parent))
    }

    pub fn has_children(&self, row: &T) -> Result<bool> {
        self.data.has_children(row)
    }

    /// Starts an asynchronous fetch.
    ///
    /// The host runs the query wherever it likes and hands the rows back to
    /// [`complete_fetch`](Self::complete_fetch) with the ticket.
    pub fn begin_fetch(&self, offset: usize, limit: usize) -> Result<(FetchTicket, Query<T, K>)> {
        Ok((self.fetches.issue(), self.query(offset, limit)?))
    }

    /// Accepts fetched rows, or drops them if the filter or sort changed
    /// since the fetch began.
    pub fn complete_fetch(&self, ticket: FetchTicket, rows: Vec<T>) -> Option<Vec<T>> {
        self.fetches.accept(ticket, rows)
    }

    /// Forces every in-flight fetch to be treated as stale.
    pub fn refresh_all(&mut self) {
        self.fetches.invalidate();
    }

    pub fn row_view(&self, row: &T) -> RowView<T> {
        RowView {
            row: row.clone(),
            selected: self.selection.is_selected(row),
            selection_disabled: self.selection.is_selection_disabled(row),
            editable: self.editor.is_editable(row),
            editing: self.editor.is_editing_row(row),
        }
    }

    pub fn row_views(&self, rows: &[T]) -> Vec<RowView<T>> {
        rows.iter().map(|row| self.row_view(row)).collect()
    }
}

impl<T, K> fmt::Debug for EnhancedGrid<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnhancedGrid")
            .field("columns", &self.columns)
            .field("filter", &self.filter)
            .field("sort", &self.sort)
            .field("data", &self.data)
            .field("popup", &self.popup)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(EnhancedGrid<String, String>: Send);
