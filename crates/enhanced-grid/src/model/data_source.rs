//! Data source adapters.
//!
//! A grid reads its rows through a [`DataSource`], chosen once when the grid
//! is built:
//!
//! - [`DataSource::InMemory`]: a list that is filtered, sorted and sliced
//!   locally on every query.
//! - [`DataSource::InMemoryTree`]: a list of rows arranged by a parent
//!   accessor, queried one level at a time.
//! - [`DataSource::LazyFlat`] and [`DataSource::LazyHierarchical`]: backend
//!   functions receiving a [`Query`] and returning counts and pages.
//!
//! Fetches are sequenced with [`FetchSequencer`]: results of a fetch issued
//! before the latest filter or sort change are dropped.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use enhanced_grid_core::logging::{span_names, targets};
use enhanced_grid_core::{BackendError, GridError, Result};

use super::filter::Filter;
use super::identity::RowIdentity;
use super::sort::QuerySort;

/// Position in a hierarchy a query is made for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParentKey<K> {
    /// The top level.
    Root,
    /// The children of the row with this key.
    Item(K),
}

/// Returns the parent of a row. `None` means the row is detached and is
/// listed nowhere, not even at the root.
pub type ParentAccessor<T, K> = Arc<dyn Fn(&T) -> Option<ParentKey<K>> + Send + Sync>;

/// Backend count function.
pub type CountFn<T, K> =
    Box<dyn Fn(&Query<T, K>) -> std::result::Result<usize, BackendError> + Send + Sync>;

/// Backend page function.
pub type FetchFn<T, K> =
    Box<dyn Fn(&Query<T, K>) -> std::result::Result<Vec<T>, BackendError> + Send + Sync>;

/// Backend function telling whether a row has children.
pub type HasChildrenFn<T> =
    Box<dyn Fn(&T) -> std::result::Result<bool, BackendError> + Send + Sync>;

/// One request against a data source.
pub struct Query<T, K> {
    pub offset: usize,
    pub limit: usize,
    pub filter: Filter<T>,
    pub sort: QuerySort<T>,
    pub parent: ParentKey<K>,
}

impl<T, K> Query<T, K> {
    /// A query for the top level with no filter and no sort.
    pub fn new(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit,
            filter: Filter::identity(),
            sort: QuerySort::unsorted(),
            parent: ParentKey::Root,
        }
    }

    pub fn with_filter(mut self, filter: Filter<T>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_sort(mut self, sort: QuerySort<T>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_parent(mut self, parent: ParentKey<K>) -> Self {
        self.parent = parent;
        self
    }
}

impl<T, K: Clone> Clone for Query<T, K> {
    fn clone(&self) -> Self {
        Self {
            offset: self.offset,
            limit: self.limit,
            filter: self.filter.clone(),
            sort: self.sort.clone(),
            parent: self.parent.clone(),
        }
    }
}

impl<T, K: fmt::Debug> fmt::Debug for Query<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .field("filter", &self.filter)
            .field("sort", &self.sort)
            .field("parent", &self.parent)
            .finish()
    }
}

/// Rows held in memory.
pub struct InMemorySource<T> {
    rows: Vec<T>,
}

/// Rows held in memory, arranged in a hierarchy.
pub struct InMemoryTreeSource<T, K> {
    rows: Vec<T>,
    identity: RowIdentity<T, K>,
    parent_of: ParentAccessor<T, K>,
}

/// Flat backend.
pub struct LazyFlatSource<T, K> {
    count: CountFn<T, K>,
    fetch: FetchFn<T, K>,
}

/// Hierarchical backend.
pub struct LazyHierarchicalSource<T, K> {
    child_count: CountFn<T, K>,
    fetch_children: FetchFn<T, K>,
    has_children: HasChildrenFn<T>,
}

/// Where the grid's rows come from.
pub enum DataSource<T, K> {
    InMemory(InMemorySource<T>),
    InMemoryTree(InMemoryTreeSource<T, K>),
    LazyFlat(LazyFlatSource<T, K>),
    LazyHierarchical(LazyHierarchicalSource<T, K>),
}

impl<T, K> DataSource<T, K>
where
    T: Clone + Send + Sync + 'static,
    K: Eq + Hash + Clone,
{
    pub fn in_memory(rows: Vec<T>) -> Self {
        Self::InMemory(InMemorySource { rows })
    }

    pub fn in_memory_tree<F>(rows: Vec<T>, identity: RowIdentity<T, K>, parent_of: F) -> Self
    where
        F: Fn(&T) -> Option<ParentKey<K>> + Send + Sync + 'static,
    {
        Self::InMemoryTree(InMemoryTreeSource {
            rows,
            identity,
            parent_of: Arc::new(parent_of),
        })
    }

    pub fn lazy<C, F>(count: C, fetch: F) -> Self
    where
        C: Fn(&Query<T, K>) -> std::result::Result<usize, BackendError> + Send + Sync + 'static,
        F: Fn(&Query<T, K>) -> std::result::Result<Vec<T>, BackendError> + Send + Sync + 'static,
    {
        Self::LazyFlat(LazyFlatSource {
            count: Box::new(count),
            fetch: Box::new(fetch),
        })
    }

    pub fn lazy_tree<C, F, H>(child_count: C, fetch_children: F, has_children: H) -> Self
    where
        C: Fn(&Query<T, K>) -> std::result::Result<usize, BackendError> + Send + Sync + 'static,
        F: Fn(&Query<T, K>) -> std::result::Result<Vec<T>, BackendError> + Send + Sync + 'static,
        H: Fn(&T) -> std::result::Result<bool, BackendError> + Send + Sync + 'static,
    {
        Self::LazyHierarchical(LazyHierarchicalSource {
            child_count: Box::new(child_count),
            fetch_children: Box::new(fetch_children),
            has_children: Box::new(has_children),
        })
    }

    pub fn is_in_memory(&self) -> bool {
        matches!(self, Self::InMemory(_) | Self::InMemoryTree(_))
    }

    pub fn is_hierarchical(&self) -> bool {
        matches!(self, Self::InMemoryTree(_) | Self::LazyHierarchical(_))
    }

    /// All rows of an in-memory source, unfiltered.
    pub fn items(&self) -> Option<&[T]> {
        match self {
            Self::InMemory(source) => Some(&source.rows),
            Self::InMemoryTree(source) => Some(&source.rows),
            _ => None,
        }
    }

    /// Number of top-level rows matching the query's filter.
    pub fn count(&self, query: &Query<T, K>) -> Result<usize> {
        self.child_count(&Query {
            parent: ParentKey::Root,
            ..query.clone()
        })
    }

    /// One page of top-level rows.
    pub fn fetch(&self, query: &Query<T, K>) -> Result<Vec<T>> {
        self.fetch_children(&Query {
            parent: ParentKey::Root,
            ..query.clone()
        })
    }

    /// Number of rows under `query.parent` matching the query's filter.
    pub fn child_count(&self, query: &Query<T, K>) -> Result<usize> {
        let _span =
            tracing::debug_span!(target: targets::DATA, span_names::QUERY, op = "count").entered();
        match self {
            Self::InMemory(source) => Ok(match query.parent {
                ParentKey::Root => source.rows.iter().filter(|row| query.filter.test(row)).count(),
                ParentKey::Item(_) => 0,
            }),
            Self::InMemoryTree(source) => Ok(source.children(&query.parent, &query.filter).count()),
            Self::LazyFlat(source) => match query.parent {
                ParentKey::Root => (source.count)(query).map_err(GridError::Backend),
                ParentKey::Item(_) => Ok(0),
            },
            Self::LazyHierarchical(source) => {
                (source.child_count)(query).map_err(GridError::Backend)
            }
        }
    }

    /// One page of the rows under `query.parent`.
    pub fn fetch_children(&self, query: &Query<T, K>) -> Result<Vec<T>> {
        let _span = tracing::debug_span!(
            target: targets::DATA,
            span_names::QUERY,
            op = "fetch",
            offset = query.offset,
            limit = query.limit
        )
        .entered();
        match self {
            Self::InMemory(source) => Ok(match query.parent {
                ParentKey::Root => {
                    page(source.rows.iter().filter(|row| query.filter.test(row)), query)
                }
                ParentKey::Item(_) => Vec::new(),
            }),
            Self::InMemoryTree(source) => {
                Ok(page(source.children(&query.parent, &query.filter), query))
            }
            Self::LazyFlat(source) => match query.parent {
                ParentKey::Root => (source.fetch)(query)
                    .map(|rows| truncate(rows, query.limit))
                    .map_err(GridError::Backend),
                ParentKey::Item(_) => Ok(Vec::new()),
            },
            Self::LazyHierarchical(source) => (source.fetch_children)(query)
                .map(|rows| truncate(rows, query.limit))
                .map_err(GridError::Backend),
        }
    }

    pub fn has_children(&self, row: &T) -> Result<bool> {
        match self {
            Self::InMemory(_) | Self::LazyFlat(_) => Ok(false),
            Self::InMemoryTree(source) => {
                let key = ParentKey::Item(source.identity.key(row));
                Ok(source
                    .rows
                    .iter()
                    .any(|r| (source.parent_of)(r).as_ref() == Some(&key)))
            }
            Self::LazyHierarchical(source) => {
                (source.has_children)(row).map_err(GridError::Backend)
            }
        }
    }

    /// Replaces a row in an in-memory source, matched by identity.
    ///
    /// Returns true if a row was replaced. Lazy sources return false; the
    /// host persists committed rows itself.
    pub fn update_row(&mut self, identity: &RowIdentity<T, K>, row: T) -> bool {
        let rows = match self {
            Self::InMemory(source) => &mut source.rows,
            Self::InMemoryTree(source) => &mut source.rows,
            _ => return false,
        };
        let key = identity.key(&row);
        match rows.iter_mut().find(|r| identity.key(r) == key) {
            Some(slot) => {
                *slot = row;
                true
            }
            None => {
                tracing::debug!(target: targets::DATA, "updated row not found in source");
                false
            }
        }
    }
}

impl<T, K> InMemoryTreeSource<T, K>
where
    K: Eq + Hash + Clone,
{
    fn children<'a>(
        &'a self,
        parent: &'a ParentKey<K>,
        filter: &'a Filter<T>,
    ) -> impl Iterator<Item = &'a T> + 'a {
        self.rows
            .iter()
            .filter(move |row| (self.parent_of)(row).as_ref() == Some(parent))
            .filter(move |row| filter.test(row))
    }
}

fn page<'a, T, K, I>(rows: I, query: &Query<T, K>) -> Vec<T>
where
    T: Clone + 'a,
    I: Iterator<Item = &'a T>,
{
    let mut rows: Vec<T> = rows.cloned().collect();
    query.sort.sort_rows(&mut rows);

    let start = query.offset.min(rows.len());
    let end = query.offset.saturating_add(query.limit).min(rows.len());
    rows.drain(start..end).collect()
}

fn truncate<T>(mut rows: Vec<T>, limit: usize) -> Vec<T> {
    if rows.len() > limit {
        tracing::warn!(
            target: targets::DATA,
            returned = rows.len(),
            limit,
            "backend returned more rows than requested, truncating"
        );
        rows.truncate(limit);
    }
    rows
}

impl<T, K> fmt::Debug for DataSource<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InMemory(source) => f
                .debug_struct("InMemory")
                .field("rows", &source.rows.len())
                .finish(),
            Self::InMemoryTree(source) => f
                .debug_struct("InMemoryTree")
                .field("rows", &source.rows.len())
                .finish(),
            Self::LazyFlat(_) => f.write_str("LazyFlat"),
            Self::LazyHierarchical(_) => f.write_str("LazyHierarchical"),
        }
    }
}

/// Generation stamp of a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// Hands out fetch tickets and decides which results are still wanted.
#[derive(Debug, Default)]
pub struct FetchSequencer {
    generation: u64,
}

impl FetchSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticket for a fetch issued now.
    pub fn issue(&self) -> FetchTicket {
        FetchTicket(self.generation)
    }

    /// Supersedes every ticket issued so far.
    pub fn invalidate(&mut self) -> FetchTicket {
        self.generation += 1;
        tracing::trace!(
            target: targets::DATA,
            generation = self.generation,
            "fetch generation bumped"
        );
        self.issue()
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Passes `result` through if `ticket` is current, drops it otherwise.
    pub fn accept<R>(&self, ticket: FetchTicket, result: R) -> Option<R> {
        if self.is_current(ticket) {
            Some(result)
        } else {
            tracing::debug!(
                target: targets::DATA,
                ticket = ticket.0,
                current = self.generation,
                "dropping stale fetch result"
            );
            None
        }
    }
}
