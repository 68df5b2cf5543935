//! Column filters and filter composition.
//!
//! A column filter is any value type implementing [`FilterFieldDto`]: it
//! yields a predicate over the column's cell value and reports whether it is
//! empty. The [`FilterComposer`] turns the non-empty filters of a set of
//! columns into one [`Filter`] over whole rows.
//!
//! # Example
//!
//! ```ignore
//! use enhanced_grid::model::{Column, FilterComposer, TextFilter};
//!
//! let mut name = Column::new("name").with_value(|p: &Person| p.name.clone());
//! name = name.with_filter(TextFilter::default())?;
//! name.apply_filter(TextFilter::new("bo"))?;
//!
//! let filter = FilterComposer::compose([&name]);
//! assert!(filter.test(&Person::new("Bob", 30)));
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use enhanced_grid_core::logging::{span_names, targets};
use regex::RegexBuilder;

use super::column::Column;

/// Predicate over a single cell value.
pub type ValuePredicate<V> = Arc<dyn Fn(&V) -> bool + Send + Sync>;

/// Predicate over a whole row.
pub type RowPredicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Contract for a pluggable column filter value.
///
/// Implementors are plain values with value-based equality and hashing:
/// applying a filter that is equal to the current one is a no-op for the
/// column. `Default` is the declared empty value a column resets to.
pub trait FilterFieldDto<V>: Clone + Eq + Hash + Default + fmt::Debug + Send + Sync + 'static {
    /// Returns the predicate testing a cell value.
    fn predicate(&self) -> ValuePredicate<V>;

    /// Returns true if this filter does not restrict anything.
    fn is_empty(&self) -> bool;
}

/// Free-text filter for string columns.
///
/// Without options the filter keeps cells that contain the text, ignoring
/// case, so `"ann"` keeps both `"Ann"` and `"Joanna"`. This is looser than an
/// exact case-insensitive comparison, which is what `whole_field` gives.
/// `whole_field` requires the entire cell to match, `regular_expression`
/// treats the text as a pattern that must match the whole cell, and
/// `invert_result` negates the outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TextFilter {
    /// The text (or pattern) to look for.
    pub value: String,
    /// Match the whole cell instead of a substring.
    pub whole_field: bool,
    /// Compare case-sensitively.
    pub case_sensitive: bool,
    /// Interpret `value` as a regular expression.
    pub regular_expression: bool,
    /// Keep the cells that do not match.
    pub invert_result: bool,
}

impl TextFilter {
    /// Creates a substring filter for the given text.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    /// Requires the whole cell to match.
    pub fn whole_field(mut self) -> Self {
        self.whole_field = true;
        self
    }

    /// Compares case-sensitively.
    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    /// Interprets the text as a regular expression.
    pub fn regular_expression(mut self) -> Self {
        self.regular_expression = true;
        self
    }

    /// Inverts the filter result.
    pub fn inverted(mut self) -> Self {
        self.invert_result = true;
        self
    }

    fn base_predicate(&self) -> ValuePredicate<String> {
        if self.regular_expression {
            let pattern = format!("^(?:{})$", self.value);
            return match RegexBuilder::new(&pattern)
                .case_insensitive(!self.case_sensitive)
                .build()
            {
                Ok(regex) => Arc::new(move |cell: &String| regex.is_match(cell)),
                Err(err) => {
                    tracing::warn!(
                        target: targets::FILTER,
                        pattern = %self.value,
                        error = %err,
                        "invalid filter expression, no rows will match"
                    );
                    Arc::new(|_: &String| false)
                }
            };
        }

        if self.value.trim().is_empty() {
            return Arc::new(|_: &String| true);
        }

        let needle = self.value.clone();
        match (self.whole_field, self.case_sensitive) {
            (true, true) => Arc::new(move |cell: &String| *cell == needle),
            (true, false) => {
                let needle = needle.to_lowercase();
                Arc::new(move |cell: &String| cell.to_lowercase() == needle)
            }
            (false, true) => Arc::new(move |cell: &String| cell.contains(needle.as_str())),
            (false, false) => {
                let needle = needle.to_lowercase();
                Arc::new(move |cell: &String| cell.to_lowercase().contains(needle.as_str()))
            }
        }
    }
}

impl FilterFieldDto<String> for TextFilter {
    fn predicate(&self) -> ValuePredicate<String> {
        let base = self.base_predicate();
        if self.invert_result {
            Arc::new(move |cell: &String| !base(cell))
        } else {
            base
        }
    }

    fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
            && !self.invert_result
            && !self.regular_expression
            && !self.case_sensitive
            && !self.whole_field
    }
}

/// Inclusive range filter for ordered values.
///
/// Bounds must be hashable, so floating point columns need a wrapper with a
/// total order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeFilter<V> {
    /// Lower bound, inclusive.
    pub min: Option<V>,
    /// Upper bound, inclusive.
    pub max: Option<V>,
}

impl<V> Default for RangeFilter<V> {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
        }
    }
}

impl<V> RangeFilter<V> {
    /// Creates a range with both bounds.
    pub fn between(min: V, max: V) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Creates a range with only a lower bound.
    pub fn at_least(min: V) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Creates a range with only an upper bound.
    pub fn at_most(max: V) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }
}

impl<V> FilterFieldDto<V> for RangeFilter<V>
where
    V: PartialOrd + Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
    fn predicate(&self) -> ValuePredicate<V> {
        let min = self.min.clone();
        let max = self.max.clone();
        Arc::new(move |value: &V| {
            min.as_ref().is_none_or(|min| value >= min)
                && max.as_ref().is_none_or(|max| value <= max)
        })
    }

    fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Combined filter over rows, handed to data sources.
///
/// In memory the predicate is evaluated locally. Lazy sources receive the
/// same token and are responsible for applying it on their side; the list of
/// active columns is available for backends that translate filters into
/// their own query language.
pub struct Filter<T> {
    predicate: Option<RowPredicate<T>>,
    columns: Vec<String>,
}

impl<T> Clone for Filter<T> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
            columns: self.columns.clone(),
        }
    }
}

impl<T> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("columns", &self.columns)
            .field("identity", &self.is_identity())
            .finish()
    }
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<T> Filter<T> {
    /// The filter that matches every row.
    pub fn identity() -> Self {
        Self {
            predicate: None,
            columns: Vec::new(),
        }
    }

    /// Creates a filter from an arbitrary row predicate.
    pub fn from_predicate<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Some(Arc::new(predicate)),
            columns: Vec::new(),
        }
    }

    /// Returns true if the filter matches every row.
    pub fn is_identity(&self) -> bool {
        self.predicate.is_none()
    }

    /// Tests a row against the filter.
    pub fn test(&self, row: &T) -> bool {
        self.predicate.as_ref().is_none_or(|predicate| predicate(row))
    }

    /// Returns the row predicate, if the filter restricts anything.
    pub fn predicate(&self) -> Option<&RowPredicate<T>> {
        self.predicate.as_ref()
    }

    /// Returns the ids of the columns contributing to this filter.
    pub fn active_columns(&self) -> &[String] {
        &self.columns
    }
}

/// Builds the composite filter from column filters.
pub struct FilterComposer;

impl FilterComposer {
    /// Combines the non-empty filters of `columns` with logical AND.
    ///
    /// Each contribution tests the filter predicate against the value the
    /// column's own accessor extracts from the row. With no active filters
    /// the result is [`Filter::identity`].
    pub fn compose<'a, T, I>(columns: I) -> Filter<T>
    where
        T: 'static,
        I: IntoIterator<Item = &'a Column<T>>,
    {
        let _span =
            tracing::debug_span!(target: targets::FILTER, span_names::COMPOSE_FILTER).entered();

        let mut ids = Vec::new();
        let mut predicates: Vec<RowPredicate<T>> = Vec::new();
        for column in columns {
            if let Some(predicate) = column.row_predicate() {
                ids.push(column.id().to_string());
                predicates.push(predicate);
            }
        }

        tracing::debug!(target: targets::FILTER, active = ?ids, "composed filter");

        if predicates.is_empty() {
            return Filter::identity();
        }

        Filter {
            predicate: Some(Arc::new(move |row: &T| predicates.iter().all(|p| p(row)))),
            columns: ids,
        }
    }
}
