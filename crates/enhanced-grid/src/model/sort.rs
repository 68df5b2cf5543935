//! Multi-column sort orders.
//!
//! The [`SortComposer`] keeps the ordered list of `(column, direction)` keys.
//! It turns that list into a row comparator for in-memory sources and into
//! ordered `(property, ascending)` pairs for backend queries.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use enhanced_grid_core::logging::targets;
use enhanced_grid_core::{GridError, Result};
use serde::{Deserialize, Serialize};

use super::column::{Column, RowComparator};

/// Direction of one sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    pub fn is_ascending(self) -> bool {
        self == Self::Ascending
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortOrder {
    pub column: String,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Ascending)
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Descending)
    }
}

/// Backend-facing sort key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuerySortOrder {
    pub property: String,
    pub ascending: bool,
}

/// Sort part of a query.
///
/// In-memory sources use the comparator. Backends should honour `orders`;
/// the comparator is also provided when every sorted column has one.
pub struct QuerySort<T> {
    comparator: Option<RowComparator<T>>,
    orders: Vec<QuerySortOrder>,
}

impl<T> Clone for QuerySort<T> {
    fn clone(&self) -> Self {
        Self {
            comparator: self.comparator.clone(),
            orders: self.orders.clone(),
        }
    }
}

impl<T> Default for QuerySort<T> {
    fn default() -> Self {
        Self::unsorted()
    }
}

impl<T> fmt::Debug for QuerySort<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySort")
            .field("orders", &self.orders)
            .field("has_comparator", &self.comparator.is_some())
            .finish()
    }
}

impl<T> QuerySort<T> {
    /// No sorting; source order is preserved.
    pub fn unsorted() -> Self {
        Self {
            comparator: None,
            orders: Vec::new(),
        }
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn comparator(&self) -> Option<&RowComparator<T>> {
        self.comparator.as_ref()
    }

    pub fn orders(&self) -> &[QuerySortOrder] {
        &self.orders
    }

    /// Sorts `rows` in place. The sort is stable.
    pub fn sort_rows(&self, rows: &mut [T]) {
        if let Some(comparator) = &self.comparator {
            rows.sort_by(|a, b| comparator(a, b));
        }
    }
}

/// Ordered list of sort keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortComposer {
    orders: Vec<SortOrder>,
    multi_sort: bool,
}

impl SortComposer {
    pub fn new(multi_sort: bool) -> Self {
        Self {
            orders: Vec::new(),
            multi_sort,
        }
    }

    pub fn orders(&self) -> &[SortOrder] {
        &self.orders
    }

    pub fn is_multi_sort(&self) -> bool {
        self.multi_sort
    }

    /// Switches multi-sort on or off. Turning it off keeps only the primary key.
    pub fn set_multi_sort(&mut self, multi_sort: bool) -> bool {
        self.multi_sort = multi_sort;
        if !multi_sort && self.orders.len() > 1 {
            self.orders.truncate(1);
            return true;
        }
        false
    }

    pub fn direction_of(&self, column: &str) -> Option<SortDirection> {
        self.position(column).map(|i| self.orders[i].direction)
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.orders.iter().position(|o| o.column == column)
    }

    /// Adds a sort key.
    ///
    /// With multi-sort, an existing key for the column is updated in place and
    /// a new one is appended. Without it, the key replaces the whole list.
    /// Returns true if the orders changed.
    pub fn add(&mut self, order: SortOrder) -> bool {
        let changed = if self.multi_sort {
            match self.position(&order.column) {
                Some(i) if self.orders[i] == order => false,
                Some(i) => {
                    self.orders[i] = order;
                    true
                }
                None => {
                    self.orders.push(order);
                    true
                }
            }
        } else if self.orders.len() == 1 && self.orders[0] == order {
            false
        } else {
            self.orders = vec![order];
            true
        };
        if changed {
            tracing::debug!(target: targets::SORT, orders = ?self.orders, "sort order changed");
        }
        changed
    }

    /// Cycles a column through ascending, descending and unsorted.
    pub fn toggle(&mut self, column: &str) -> bool {
        match self.direction_of(column) {
            None => self.add(SortOrder::asc(column)),
            Some(SortDirection::Ascending) => self.add(SortOrder::desc(column)),
            Some(SortDirection::Descending) => self.remove(column),
        }
    }

    /// Removes the key for a column.
    pub fn remove(&mut self, column: &str) -> bool {
        match self.position(column) {
            Some(i) => {
                self.orders.remove(i);
                tracing::debug!(target: targets::SORT, column, "sort key removed");
                true
            }
            None => false,
        }
    }

    /// Replaces the whole list.
    ///
    /// Each column may appear once. Without multi-sort only the first key is
    /// kept. Returns true if the orders changed.
    pub fn set(&mut self, mut orders: Vec<SortOrder>) -> Result<bool> {
        for (i, order) in orders.iter().enumerate() {
            if orders[..i].iter().any(|o| o.column == order.column) {
                return Err(GridError::DuplicateSortKey(order.column.clone()));
            }
        }
        if !self.multi_sort {
            orders.truncate(1);
        }
        Ok(self.replace(orders))
    }

    pub fn clear(&mut self) -> bool {
        self.replace(Vec::new())
    }

    fn replace(&mut self, orders: Vec<SortOrder>) -> bool {
        if self.orders == orders {
            return false;
        }
        self.orders = orders;
        tracing::debug!(target: targets::SORT, orders = ?self.orders, "sort order replaced");
        true
    }

    /// Builds the sort for an in-memory source.
    ///
    /// Every sorted column must have a comparator.
    pub fn in_memory_sort<T: 'static>(&self, columns: &[Column<T>]) -> Result<QuerySort<T>> {
        let comparator = self.comparator(columns)?;
        Ok(QuerySort {
            comparator,
            orders: self.query_orders(columns)?,
        })
    }

    /// Builds the sort for a backend source.
    pub fn backend_sort<T: 'static>(&self, columns: &[Column<T>]) -> Result<QuerySort<T>> {
        let orders = self.query_orders(columns)?;
        let comparator = self.comparator(columns).ok().flatten();
        Ok(QuerySort { comparator, orders })
    }

    /// Folds the keys into one comparator, `None` when unsorted.
    ///
    /// A descending key reverses only its own term.
    pub fn comparator<T: 'static>(
        &self,
        columns: &[Column<T>],
    ) -> Result<Option<RowComparator<T>>> {
        if self.orders.is_empty() {
            return Ok(None);
        }

        let mut terms: Vec<(RowComparator<T>, SortDirection)> =
            Vec::with_capacity(self.orders.len());
        for order in &self.orders {
            let column = find_column(columns, &order.column)?;
            let comparator = column
                .comparator()
                .filter(|_| column.is_sortable())
                .ok_or_else(|| GridError::NotSortable {
                    column: order.column.clone(),
                })?;
            terms.push((comparator.clone(), order.direction));
        }

        Ok(Some(Arc::new(move |a: &T, b: &T| {
            terms
                .iter()
                .map(|(compare, direction)| direction.apply(compare(a, b)))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        })))
    }

    /// Translates the keys into backend sort properties.
    pub fn query_orders<T: 'static>(&self, columns: &[Column<T>]) -> Result<Vec<QuerySortOrder>> {
        let mut orders = Vec::new();
        for order in &self.orders {
            let column = find_column(columns, &order.column)?;
            if !column.is_sortable() {
                return Err(GridError::NotSortable {
                    column: order.column.clone(),
                });
            }
            orders.extend(column.sort_properties().into_iter().map(|property| QuerySortOrder {
                property,
                ascending: order.direction.is_ascending(),
            }));
        }
        Ok(orders)
    }
}

fn find_column<'a, T>(columns: &'a [Column<T>], id: &str) -> Result<&'a Column<T>>
where
    T: 'static,
{
    columns
        .iter()
        .find(|c| c.id() == id)
        .ok_or_else(|| GridError::UnknownColumn(id.to_string()))
}
