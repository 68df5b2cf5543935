//! Column configuration records.
//!
//! A [`Column`] binds a value accessor (row to cell value) to an optional
//! filter and optional sort keys. Columns carry no rendering state apart from
//! the [`FilterIndicator`] that tells a header whether its filter restricts
//! the rows.
//!
//! The accessor, comparator and filter are type-erased so that columns of
//! different value types can live in one grid. Type mistakes surface as
//! configuration errors when the column is set up, not when rows are fetched.

use std::any::{Any, type_name};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use enhanced_grid_core::logging::targets;
use enhanced_grid_core::{GridError, Property, Result, Signal};

use super::filter::{FilterFieldDto, RowPredicate};

/// Extracts a cell value from a row.
pub type ValueAccessor<T, V> = Arc<dyn Fn(&T) -> V + Send + Sync>;

/// Total order over rows, as used by the sort composer.
pub type RowComparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Display state of a column's filter affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterIndicator {
    /// The column filter restricts the rows.
    Active,
    /// No filter, or the filter is empty.
    #[default]
    Inactive,
}

struct ErasedAccessor {
    accessor: Arc<dyn Any + Send + Sync>,
    value_type: &'static str,
}

/// Object-safe view of a filter bound to its column accessor.
trait ColumnFilter<T>: Send + Sync {
    fn is_empty(&self) -> bool;
    fn row_predicate(&self) -> RowPredicate<T>;
    /// Resets to the declared empty value. Returns true if the value changed.
    fn reset(&mut self) -> bool;
    fn value_any(&self) -> &dyn Any;
    /// Replaces the value, handing it back if it has the wrong type.
    fn apply_any(&mut self, value: Box<dyn Any>) -> std::result::Result<bool, Box<dyn Any>>;
    fn filter_type(&self) -> &'static str;
}

struct BoundFilter<T, V, D> {
    accessor: ValueAccessor<T, V>,
    value: D,
}

impl<T, V, D> ColumnFilter<T> for BoundFilter<T, V, D>
where
    T: 'static,
    V: 'static,
    D: FilterFieldDto<V>,
{
    fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    fn row_predicate(&self) -> RowPredicate<T> {
        let accessor = self.accessor.clone();
        let predicate = self.value.predicate();
        Arc::new(move |row: &T| predicate(&accessor(row)))
    }

    fn reset(&mut self) -> bool {
        let empty = D::default();
        if self.value == empty {
            return false;
        }
        self.value = empty;
        true
    }

    fn value_any(&self) -> &dyn Any {
        &self.value
    }

    fn apply_any(&mut self, value: Box<dyn Any>) -> std::result::Result<bool, Box<dyn Any>> {
        let value = value.downcast::<D>()?;
        if self.value == *value {
            return Ok(false);
        }
        self.value = *value;
        Ok(true)
    }

    fn filter_type(&self) -> &'static str {
        type_name::<D>()
    }
}

/// A grid column.
///
/// # Example
///
/// ```ignore
/// let age = Column::new("age")
///     .with_header("Age")
///     .with_ordered_value(|p: &Person| p.age)
///     .with_filter(RangeFilter::<u32>::default())?;
/// ```
pub struct Column<T> {
    id: String,
    header: Option<String>,
    accessor: Option<ErasedAccessor>,
    comparator: Option<RowComparator<T>>,
    sort_properties: Vec<String>,
    sortable: bool,
    filter: Option<Box<dyn ColumnFilter<T>>>,
    filter_active: Property<bool>,

    /// Emitted when the column's filter switches between empty and non-empty.
    pub filter_indicator_changed: Signal<FilterIndicator>,
}

impl<T: 'static> Column<T> {
    /// Creates a column with the given id and nothing else configured.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            header: None,
            accessor: None,
            comparator: None,
            sort_properties: Vec::new(),
            sortable: false,
            filter: None,
            filter_active: Property::new(false),
            filter_indicator_changed: Signal::new(),
        }
    }

    /// Sets the header caption.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Sets the value accessor without making the column sortable.
    pub fn with_value<V, F>(mut self, accessor: F) -> Self
    where
        V: 'static,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let accessor: ValueAccessor<T, V> = Arc::new(accessor);
        self.accessor = Some(ErasedAccessor {
            accessor: Arc::new(accessor),
            value_type: type_name::<V>(),
        });
        self
    }

    /// Sets the value accessor and sorts by the value's natural order.
    pub fn with_ordered_value<V, F>(self, accessor: F) -> Self
    where
        V: Ord + 'static,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let accessor: ValueAccessor<T, V> = Arc::new(accessor);
        let by_value = accessor.clone();
        let mut column = self.with_value(move |row: &T| accessor(row));
        column.comparator = Some(Arc::new(move |a: &T, b: &T| by_value(a).cmp(&by_value(b))));
        column.sortable = true;
        column
    }

    /// Sets an explicit comparator, overriding the natural order.
    pub fn with_comparator<F>(mut self, comparator: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.comparator = Some(Arc::new(comparator));
        self.sortable = true;
        self
    }

    /// Sets the backend sort properties used when sorting a lazy source.
    pub fn with_sort_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort_properties = properties.into_iter().map(Into::into).collect();
        self.sortable = true;
        self
    }

    /// Enables or disables sorting by this column.
    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    /// Attaches a filter with its initial value.
    ///
    /// The filter operates on the values produced by this column's accessor,
    /// which must already be set and must produce `V`.
    pub fn with_filter<V, D>(mut self, initial: D) -> Result<Self>
    where
        V: 'static,
        D: FilterFieldDto<V>,
    {
        let accessor = self.value_accessor::<V>()?;
        self.filter = Some(Box::new(BoundFilter {
            accessor,
            value: initial,
        }));
        self.filter_active.set_silent(!self.is_filter_empty());
        Ok(self)
    }

    /// Column id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Header caption, falling back to the id.
    pub fn header(&self) -> &str {
        self.header.as_deref().unwrap_or(&self.id)
    }

    /// Returns the typed value accessor.
    pub fn value_accessor<V: 'static>(&self) -> Result<ValueAccessor<T, V>> {
        let erased = self
            .accessor
            .as_ref()
            .ok_or_else(|| GridError::missing_value_accessor(&self.id))?;
        erased
            .accessor
            .downcast_ref::<ValueAccessor<T, V>>()
            .cloned()
            .ok_or_else(|| GridError::AccessorTypeMismatch {
                column: self.id.clone(),
                expected: type_name::<V>(),
            })
    }

    /// Name of the type the accessor produces, if one is set.
    pub fn value_type(&self) -> Option<&'static str> {
        self.accessor.as_ref().map(|a| a.value_type)
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    pub fn comparator(&self) -> Option<&RowComparator<T>> {
        self.comparator.as_ref()
    }

    /// Backend sort properties. Defaults to the column id.
    pub fn sort_properties(&self) -> Vec<String> {
        if self.sort_properties.is_empty() {
            vec![self.id.clone()]
        } else {
            self.sort_properties.clone()
        }
    }

    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    /// Returns true if the column has no filter or its filter is empty.
    pub fn is_filter_empty(&self) -> bool {
        self.filter.as_ref().is_none_or(|f| f.is_empty())
    }

    /// Returns the current filter value if it is a `D`.
    pub fn filter_value<D: 'static>(&self) -> Option<&D> {
        self.filter.as_ref()?.value_any().downcast_ref::<D>()
    }

    /// Replaces the filter value.
    ///
    /// Returns `Ok(false)` when the value equals the current one.
    pub fn apply_filter<D: 'static>(&mut self, value: D) -> Result<bool> {
        let filter = self.filter.as_mut().ok_or_else(|| GridError::NoFilter {
            column: self.id.clone(),
        })?;
        let expected = filter.filter_type();
        let changed = filter
            .apply_any(Box::new(value))
            .map_err(|_| GridError::FilterTypeMismatch {
                column: self.id.clone(),
                expected,
            })?;
        tracing::debug!(target: targets::FILTER, column = %self.id, changed, "filter applied");
        self.refresh_indicator();
        Ok(changed)
    }

    /// Resets the filter to its empty value.
    pub fn clear_filter(&mut self) -> Result<bool> {
        let filter = self.filter.as_mut().ok_or_else(|| GridError::NoFilter {
            column: self.id.clone(),
        })?;
        let changed = filter.reset();
        self.refresh_indicator();
        Ok(changed)
    }

    /// This column's contribution to the composite filter, if any.
    pub fn row_predicate(&self) -> Option<RowPredicate<T>> {
        self.filter
            .as_ref()
            .filter(|f| !f.is_empty())
            .map(|f| f.row_predicate())
    }

    pub fn filter_indicator(&self) -> FilterIndicator {
        if self.filter_active.get() {
            FilterIndicator::Active
        } else {
            FilterIndicator::Inactive
        }
    }

    fn refresh_indicator(&self) {
        if self.filter_active.set(!self.is_filter_empty()) {
            self.filter_indicator_changed.emit(self.filter_indicator());
        }
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("value_type", &self.accessor.as_ref().map(|a| a.value_type))
            .field("sortable", &self.sortable)
            .field("filter", &self.filter.as_ref().map(|f| f.filter_type()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::filter::{RangeFilter, TextFilter};
    use parking_lot::Mutex;

    #[derive(Debug, Clone)]
    struct Person {
        name: String,
        age: u32,
    }

    fn bob() -> Person {
        Person {
            name: "Bob".into(),
            age: 30,
        }
    }

    fn name_column() -> Column<Person> {
        Column::new("name")
            .with_ordered_value(|p: &Person| p.name.clone())
            .with_filter(TextFilter::default())
            .unwrap()
    }

    #[test]
    fn test_filter_requires_value_accessor() {
        let err = Column::<Person>::new("name")
            .with_filter(TextFilter::default())
            .unwrap_err();
        assert!(matches!(err, GridError::MissingValueAccessor { ref column } if column == "name"));
    }

    #[test]
    fn test_filter_requires_matching_value_type() {
        let err = Column::new("age")
            .with_value(|p: &Person| p.age)
            .with_filter(TextFilter::default())
            .unwrap_err();
        assert!(matches!(err, GridError::AccessorTypeMismatch { .. }));
    }

    #[test]
    fn test_apply_filter_of_wrong_type() {
        let mut column = name_column();
        let err = column.apply_filter(RangeFilter::at_least(3u32)).unwrap_err();
        assert!(matches!(err, GridError::FilterTypeMismatch { .. }));
    }

    #[test]
    fn test_apply_filter_without_filter() {
        let mut column = Column::new("age").with_value(|p: &Person| p.age);
        assert!(matches!(
            column.apply_filter(RangeFilter::at_least(3u32)),
            Err(GridError::NoFilter { .. })
        ));
        assert!(column.row_predicate().is_none());
    }

    #[test]
    fn test_apply_filter_is_idempotent() {
        let mut column = name_column();
        assert!(column.apply_filter(TextFilter::new("bo")).unwrap());
        assert!(!column.apply_filter(TextFilter::new("bo")).unwrap());
        assert_eq!(column.filter_value::<TextFilter>().map(|f| f.value.as_str()), Some("bo"));
    }

    #[test]
    fn test_filter_indicator_follows_emptiness() {
        let mut column = name_column();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        column
            .filter_indicator_changed
            .connect(move |indicator| seen_clone.lock().push(*indicator));

        assert_eq!(column.filter_indicator(), FilterIndicator::Inactive);
        column.apply_filter(TextFilter::new("b")).unwrap();
        column.apply_filter(TextFilter::new("bo")).unwrap();
        assert_eq!(column.filter_indicator(), FilterIndicator::Active);
        assert!(column.clear_filter().unwrap());
        assert!(!column.clear_filter().unwrap());

        assert_eq!(*seen.lock(), vec![FilterIndicator::Active, FilterIndicator::Inactive]);
    }

    #[test]
    fn test_initial_filter_sets_indicator() {
        let column = Column::new("name")
            .with_value(|p: &Person| p.name.clone())
            .with_filter(TextFilter::new("b"))
            .unwrap();
        assert_eq!(column.filter_indicator(), FilterIndicator::Active);
        assert!(column.row_predicate().unwrap()(&bob()));
    }

    #[test]
    fn test_row_predicate_uses_column_accessor() {
        let mut column = Column::new("age")
            .with_ordered_value(|p: &Person| p.age)
            .with_filter(RangeFilter::<u32>::default())
            .unwrap();
        assert!(column.row_predicate().is_none());

        column.apply_filter(RangeFilter::at_least(31u32)).unwrap();
        let predicate = column.row_predicate().unwrap();
        assert!(!predicate(&bob()));
    }

    #[test]
    fn test_sort_properties_default_to_id() {
        let column = name_column();
        assert!(column.is_sortable());
        assert_eq!(column.sort_properties(), vec!["name".to_string()]);

        let column = Column::<Person>::new("full_name").with_sort_properties(["last", "first"]);
        assert_eq!(column.sort_properties(), vec!["last".to_string(), "first".to_string()]);
        assert!(column.comparator().is_none());
    }

    #[test]
    fn test_plain_value_column_is_not_sortable() {
        let column = Column::new("age").with_value(|p: &Person| p.age);
        assert!(!column.is_sortable());
        assert_eq!(column.header(), "age");
        assert!(column.value_type().unwrap().contains("u32"));
    }
}
