//! Selection model guarded by a selection gate.
//!
//! [`SelectionModel`] holds the selected rows for a grid. Every mutation is
//! checked against the gate (`can_select(row)`), so a row the gate rejects is
//! never in the selection, not even between two operations.
//!
//! # Example
//!
//! ```ignore
//! use enhanced_grid::model::{RowIdentity, SelectionMode, SelectionModel};
//!
//! let mut selection = SelectionModel::new(RowIdentity::new(|p: &Person| p.id));
//! selection.set_selection_mode(SelectionMode::Multi);
//!
//! selection.selection_changed.connect(|change| {
//!     println!("Selection changed: +{} -{}", change.added.len(), change.removed.len());
//! });
//!
//! selection.select(&bob);
//! // Revokes every selected row that no longer passes
//! selection.set_selection_predicate(|p: &Person| p.age >= 18);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use enhanced_grid_core::Signal;
use enhanced_grid_core::logging::targets;
use serde::{Deserialize, Serialize};

use super::identity::RowIdentity;

/// Predicate deciding whether a row may be selected.
pub type SelectionGate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// How many rows can be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Nothing can be selected.
    None,
    /// At most one row is selected (default).
    #[default]
    Single,
    /// Any number of rows can be selected.
    Multi,
}

/// Payload of [`SelectionModel::selection_changed`].
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChange<T> {
    pub added: Vec<T>,
    pub removed: Vec<T>,
}

impl<T> SelectionChange<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Manages the selected rows of a grid.
///
/// The selection keeps insertion order. Rows are stored by value and matched
/// through the [`RowIdentity`].
///
/// # Signals
///
/// - `selection_changed`: emitted once per accepted mutation, never for a
///   rejected one
pub struct SelectionModel<T, K> {
    mode: SelectionMode,
    identity: RowIdentity<T, K>,
    gate: SelectionGate<T>,
    deselect_allowed: bool,
    selected_keys: HashSet<K>,
    selected: Vec<T>,

    /// Emitted when rows are added to or removed from the selection.
    pub selection_changed: Signal<SelectionChange<T>>,
}

impl<T, K> SelectionModel<T, K>
where
    T: Clone + Send + Sync + 'static,
    K: Eq + Hash + Clone,
{
    /// Creates a single-selection model that accepts every row.
    pub fn new(identity: RowIdentity<T, K>) -> Self {
        Self {
            mode: SelectionMode::default(),
            identity,
            gate: Arc::new(|_| true),
            deselect_allowed: true,
            selected_keys: HashSet::new(),
            selected: Vec::new(),
            selection_changed: Signal::new(),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub fn selection_mode(&self) -> SelectionMode {
        self.mode
    }

    /// Changes the selection mode, clearing the current selection.
    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        if self.mode == mode {
            return;
        }
        tracing::debug!(
            target: targets::SELECTION,
            from = ?self.mode,
            to = ?mode,
            "selection mode changed"
        );
        self.mode = mode;
        self.clear();
    }

    pub fn is_deselect_allowed(&self) -> bool {
        self.deselect_allowed
    }

    /// Controls whether the selected row can be deselected in single mode.
    pub fn set_deselect_allowed(&mut self, allowed: bool) {
        self.deselect_allowed = allowed;
    }

    /// Replaces the selection gate.
    ///
    /// Selected rows that fail the new gate are deselected immediately, with a
    /// single change event listing all of them.
    pub fn set_selection_predicate<F>(&mut self, gate: F)
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.gate = Arc::new(gate);

        let gate = self.gate.clone();
        let (kept, revoked): (Vec<T>, Vec<T>) = std::mem::take(&mut self.selected)
            .into_iter()
            .partition(|row| gate(row));
        self.selected = kept;
        for row in &revoked {
            self.selected_keys.remove(&self.identity.key(row));
        }

        if !revoked.is_empty() {
            tracing::debug!(
                target: targets::SELECTION,
                revoked = revoked.len(),
                "selection gate revoked rows"
            );
            self.emit(Vec::new(), revoked);
        }
    }

    /// Returns true if the gate accepts `row`.
    pub fn can_select(&self, row: &T) -> bool {
        (self.gate)(row)
    }

    /// Returns true if the gate rejects `row`.
    pub fn is_selection_disabled(&self, row: &T) -> bool {
        !self.can_select(row)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn is_selected(&self, row: &T) -> bool {
        self.selected_keys.contains(&self.identity.key(row))
    }

    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Selected rows in selection order.
    pub fn selected_items(&self) -> &[T] {
        &self.selected
    }

    pub fn first_selected(&self) -> Option<&T> {
        self.selected.first()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Selects a row. In single mode the previous row is deselected.
    ///
    /// Returns true if the selection changed.
    pub fn select(&mut self, row: &T) -> bool {
        if !self.accepts(row, "select") || self.is_selected(row) {
            return false;
        }

        let removed = if self.mode == SelectionMode::Single {
            self.take_all()
        } else {
            Vec::new()
        };
        self.insert(row.clone());
        self.emit(vec![row.clone()], removed);
        true
    }

    /// Deselects a row.
    pub fn deselect(&mut self, row: &T) -> bool {
        if !self.accepts(row, "deselect") || !self.is_selected(row) {
            return false;
        }
        if self.mode == SelectionMode::Single && !self.deselect_allowed {
            tracing::debug!(
                target: targets::SELECTION,
                "deselect rejected: not allowed in single mode"
            );
            return false;
        }

        self.remove(row).is_some_and(|removed| {
            self.emit(Vec::new(), vec![removed]);
            true
        })
    }

    pub fn toggle(&mut self, row: &T) -> bool {
        if self.is_selected(row) {
            self.deselect(row)
        } else {
            self.select(row)
        }
    }

    /// Selects every given row the gate accepts. Multi mode only.
    pub fn select_all<'a, I>(&mut self, rows: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
    {
        self.update_selection(rows, std::iter::empty())
    }

    /// Adds and removes rows in one step, with one change event. Multi mode
    /// only; rows the gate rejects are skipped.
    pub fn update_selection<'a, A, R>(&mut self, added: A, removed: R) -> bool
    where
        A: IntoIterator<Item = &'a T>,
        R: IntoIterator<Item = &'a T>,
    {
        if self.mode != SelectionMode::Multi {
            tracing::debug!(
                target: targets::SELECTION,
                mode = ?self.mode,
                "batch selection rejected: not in multi mode"
            );
            return false;
        }

        let mut newly_removed = Vec::new();
        for row in removed {
            if self.can_select(row)
                && let Some(row) = self.remove(row)
            {
                newly_removed.push(row);
            }
        }

        let mut newly_added = Vec::new();
        for row in added {
            if self.can_select(row) && !self.is_selected(row) {
                self.insert(row.clone());
                newly_added.push(row.clone());
            }
        }

        if newly_added.is_empty() && newly_removed.is_empty() {
            return false;
        }
        self.emit(newly_added, newly_removed);
        true
    }

    /// Deselects everything. Always allowed.
    pub fn clear(&mut self) -> bool {
        let removed = self.take_all();
        if removed.is_empty() {
            return false;
        }
        self.emit(Vec::new(), removed);
        true
    }

    /// Replaces the stored copy of a selected row with a fresh one.
    ///
    /// If the fresh copy fails the gate the row is deselected.
    pub fn refresh_row(&mut self, row: &T) {
        let key = self.identity.key(row);
        if !self.selected_keys.contains(&key) {
            return;
        }
        if !self.can_select(row) {
            if let Some(removed) = self.remove(row) {
                self.emit(Vec::new(), vec![removed]);
            }
            return;
        }
        if let Some(slot) = self.selected.iter_mut().find(|r| self.identity.key(r) == key) {
            *slot = row.clone();
        }
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    fn accepts(&self, row: &T, operation: &'static str) -> bool {
        if self.mode == SelectionMode::None {
            tracing::debug!(
                target: targets::SELECTION,
                operation,
                "selection rejected: mode is none"
            );
            return false;
        }
        if !self.can_select(row) {
            tracing::debug!(target: targets::SELECTION, operation, "selection rejected by gate");
            return false;
        }
        true
    }

    fn insert(&mut self, row: T) {
        if self.selected_keys.insert(self.identity.key(&row)) {
            self.selected.push(row);
        }
    }

    fn remove(&mut self, row: &T) -> Option<T> {
        let key = self.identity.key(row);
        if !self.selected_keys.remove(&key) {
            return None;
        }
        let position = self.selected.iter().position(|r| self.identity.key(r) == key)?;
        Some(self.selected.remove(position))
    }

    fn take_all(&mut self) -> Vec<T> {
        self.selected_keys.clear();
        std::mem::take(&mut self.selected)
    }

    fn emit(&self, added: Vec<T>, removed: Vec<T>) {
        self.selection_changed.emit(SelectionChange { added, removed });
    }
}

impl<T, K> fmt::Debug for SelectionModel<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionModel")
            .field("mode", &self.mode)
            .field("deselect_allowed", &self.deselect_allowed)
            .field("selected", &self.selected.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        id: u32,
        age: u32,
    }

    fn person(id: u32, age: u32) -> Person {
        Person { id, age }
    }

    fn model(mode: SelectionMode) -> SelectionModel<Person, u32> {
        let mut model = SelectionModel::new(RowIdentity::new(|p: &Person| p.id));
        model.set_selection_mode(mode);
        model
    }

    fn record(model: &SelectionModel<Person, u32>) -> Arc<Mutex<Vec<SelectionChange<Person>>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        model
            .selection_changed
            .connect(move |change| events_clone.lock().push(change.clone()));
        events
    }

    #[test]
    fn test_single_select_replaces_previous() {
        let mut model = model(SelectionMode::Single);
        let events = record(&model);

        assert!(model.select(&person(1, 30)));
        assert!(model.select(&person(2, 40)));
        assert!(!model.select(&person(2, 40)));

        assert_eq!(model.selected_items(), &[person(2, 40)]);
        let events = events.lock();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].removed, vec![person(1, 30)]);
        assert_eq!(events[1].added, vec![person(2, 40)]);
    }

    #[test]
    fn test_none_mode_rejects_everything() {
        let mut model = model(SelectionMode::None);
        let events = record(&model);
        assert!(!model.select(&person(1, 30)));
        assert!(!model.select_all(&[person(1, 30)]));
        assert!(events.lock().is_empty());
    }

    #[test]
    fn test_gate_rejection_is_silent() {
        let mut model = model(SelectionMode::Multi);
        model.set_selection_predicate(|p: &Person| p.age >= 18);
        let events = record(&model);

        assert!(!model.select(&person(1, 10)));
        assert!(!model.toggle(&person(1, 10)));
        assert!(model.is_selection_disabled(&person(1, 10)));
        assert!(events.lock().is_empty());
    }

    #[test]
    fn test_gate_change_revokes_in_one_event() {
        let mut model = model(SelectionMode::Multi);
        model.select_all(&[person(1, 30), person(2, 15), person(3, 12), person(4, 50)]);
        let events = record(&model);

        model.set_selection_predicate(|p: &Person| p.age >= 18);

        assert_eq!(model.selected_items(), &[person(1, 30), person(4, 50)]);
        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].removed, vec![person(2, 15), person(3, 12)]);
        assert!(events[0].added.is_empty());
    }

    #[test]
    fn test_gate_change_without_removals_is_silent() {
        let mut model = model(SelectionMode::Multi);
        model.select(&person(1, 30));
        let events = record(&model);
        model.set_selection_predicate(|p: &Person| p.age >= 18);
        assert!(events.lock().is_empty());
    }

    #[test]
    fn test_select_all_skips_gated_rows() {
        let mut model = model(SelectionMode::Multi);
        model.set_selection_predicate(|p: &Person| p.id != 2);
        assert!(model.select_all(&[person(1, 1), person(2, 2), person(3, 3)]));
        assert_eq!(model.selected_count(), 2);
        assert!(!model.is_selected(&person(2, 2)));
    }

    #[test]
    fn test_select_all_ignored_in_single_mode() {
        let mut model = model(SelectionMode::Single);
        assert!(!model.select_all(&[person(1, 1), person(2, 2)]));
        assert!(!model.has_selection());
    }

    #[test]
    fn test_update_selection_single_event() {
        let mut model = model(SelectionMode::Multi);
        model.select_all(&[person(1, 1), person(2, 2)]);
        let events = record(&model);

        assert!(model.update_selection(&[person(3, 3)], &[person(1, 1)]));
        assert_eq!(model.selected_items(), &[person(2, 2), person(3, 3)]);
        assert_eq!(events.lock().len(), 1);
    }

    #[test]
    fn test_deselect_not_allowed_in_single_mode() {
        let mut model = model(SelectionMode::Single);
        model.set_deselect_allowed(false);
        model.select(&person(1, 1));
        assert!(!model.deselect(&person(1, 1)));
        assert!(model.is_selected(&person(1, 1)));
        assert!(model.clear());
    }

    #[test]
    fn test_identity_matches_copies() {
        let mut model = model(SelectionMode::Multi);
        model.select(&person(1, 30));
        assert!(model.is_selected(&person(1, 31)));
        assert!(model.deselect(&person(1, 99)));
        assert!(!model.has_selection());
    }

    #[test]
    fn test_mode_switch_clears_selection() {
        let mut model = model(SelectionMode::Multi);
        model.select_all(&[person(1, 1), person(2, 2)]);
        let events = record(&model);

        model.set_selection_mode(SelectionMode::Single);
        assert!(!model.has_selection());
        assert_eq!(events.lock().len(), 1);
        assert_eq!(events.lock()[0].removed.len(), 2);
    }

    #[test]
    fn test_refresh_row_replaces_copy_or_revokes() {
        let mut model = model(SelectionMode::Multi);
        model.set_selection_predicate(|p: &Person| p.age >= 18);
        model.select_all(&[person(1, 30), person(2, 40)]);

        model.refresh_row(&person(1, 31));
        assert_eq!(model.selected_items()[0], person(1, 31));

        model.refresh_row(&person(2, 5));
        assert_eq!(model.selected_items(), &[person(1, 31)]);
    }
}
