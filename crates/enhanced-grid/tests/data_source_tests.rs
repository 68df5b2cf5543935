//! Integration tests for data sources: paging, hierarchy, lazy backends and
//! fetch sequencing.

mod common;

use std::io;
use std::sync::Arc;

use common::*;
use enhanced_grid::BackendError;
use enhanced_grid::model::QuerySort;
use enhanced_grid::prelude::*;
use parking_lot::Mutex;

/// A backend that applies the query tokens the way a remote service would.
fn lazy_people(log: Arc<Mutex<Vec<Vec<QuerySortOrder>>>>) -> DataSource<Person, u32> {
    let rows = Arc::new(people());
    let count_rows = rows.clone();
    DataSource::lazy(
        move |query: &Query<Person, u32>| {
            Ok(count_rows.iter().filter(|p| query.filter.test(p)).count())
        },
        move |query: &Query<Person, u32>| {
            log.lock().push(query.sort.orders().to_vec());
            let mut matching: Vec<Person> =
                rows.iter().filter(|p| query.filter.test(p)).cloned().collect();
            query.sort.sort_rows(&mut matching);
            Ok(matching.into_iter().skip(query.offset).take(query.limit).collect())
        },
    )
}

#[test]
fn test_paging_past_the_end() {
    init_tracing();
    let source: DataSource<u32, u32> = DataSource::in_memory((0..10).collect());
    assert_eq!(source.fetch(&Query::new(8, 5)).unwrap().len(), 2);
    assert!(source.fetch(&Query::new(10, 5)).unwrap().is_empty());
    assert!(source.fetch(&Query::new(usize::MAX, usize::MAX)).unwrap().is_empty());
}

#[test]
fn test_in_memory_and_lazy_agree() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut memory = in_memory_grid(GridConfig::default());
    let mut lazy = grid_over(lazy_people(log), GridConfig::default());

    let name_filters = [
        TextFilter::default(),
        TextFilter::new("b"),
        TextFilter::new("bob").whole_field(),
        TextFilter::new("a").inverted(),
        TextFilter::new("[A-C].*").regular_expression().case_sensitive(),
    ];
    let age_filters = [
        RangeFilter::default(),
        RangeFilter::at_least(21u32),
        RangeFilter::between(18u32, 30),
    ];

    for name in &name_filters {
        for age in &age_filters {
            for grid in [&mut memory, &mut lazy] {
                grid.apply_filter("name", name.clone()).unwrap();
                grid.apply_filter("age", age.clone()).unwrap();
                grid.sort("age", SortDirection::Descending).unwrap();
            }
            assert_eq!(memory.count().unwrap(), lazy.count().unwrap(), "{name:?} {age:?}");
            assert_eq!(
                ids(&memory.fetch(0, 10).unwrap()),
                ids(&lazy.fetch(0, 10).unwrap()),
                "{name:?} {age:?}"
            );
        }
    }
}

#[test]
fn test_lazy_receives_sort_properties() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut grid = grid_over(lazy_people(log.clone()), GridConfig::default());
    grid.add_column(Column::new("department").with_sort_properties(["dept.name", "dept.id"]))
        .unwrap();

    grid.sort("department", SortDirection::Descending).unwrap();
    grid.fetch(0, 10).unwrap();

    let orders = log.lock().last().cloned().unwrap();
    assert_eq!(
        orders,
        vec![
            QuerySortOrder {
                property: "dept.name".into(),
                ascending: false
            },
            QuerySortOrder {
                property: "dept.id".into(),
                ascending: false
            },
        ]
    );
}

#[test]
fn test_lazy_backend_failure_surfaces() {
    let source: DataSource<Person, u32> = DataSource::lazy(
        |_| Ok(3),
        |_| {
            let err = io::Error::new(io::ErrorKind::TimedOut, "backend timed out");
            Err(Box::new(err) as BackendError)
        },
    );
    let grid = grid_over(source, GridConfig::default());
    let err = grid.fetch(0, 10).unwrap_err();
    assert!(matches!(err, GridError::Backend(_)));
    assert!(err.to_string().contains("backend timed out"));
}

#[derive(Debug, Clone, PartialEq)]
struct Department {
    id: u32,
    name: &'static str,
    parent: Option<ParentKey<u32>>,
}

fn departments() -> Vec<Department> {
    let dept = |id, name, parent| Department { id, name, parent };
    vec![
        dept(1, "Engineering", Some(ParentKey::Root)),
        dept(2, "Platform", Some(ParentKey::Item(1))),
        dept(3, "Apps", Some(ParentKey::Item(1))),
        dept(4, "Sales", Some(ParentKey::Root)),
        dept(5, "Archived", None),
        dept(6, "Storage", Some(ParentKey::Item(2))),
    ]
}

fn department_grid() -> EnhancedGrid<Department, u32> {
    let identity = RowIdentity::new(|d: &Department| d.id);
    let source = DataSource::in_memory_tree(departments(), identity.clone(), |d: &Department| {
        d.parent.clone()
    });
    let mut grid = EnhancedGrid::new(identity, source);
    grid.add_column(
        Column::new("name")
            .with_header("Name")
            .with_ordered_value(|d: &Department| d.name.to_string())
            .with_filter(TextFilter::default())
            .unwrap(),
    )
    .unwrap();
    grid
}

#[test]
fn test_tree_root_and_children() {
    let grid = department_grid();
    let root: Vec<u32> = grid.fetch(0, 10).unwrap().iter().map(|d| d.id).collect();
    assert_eq!(root, vec![1, 4]);
    assert_eq!(grid.child_count(ParentKey::Root).unwrap(), 2);

    let children: Vec<u32> = grid
        .fetch_children(ParentKey::Item(1), 0, 10)
        .unwrap()
        .iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(children, vec![2, 3]);

    let all = departments();
    assert!(grid.has_children(&all[1]).unwrap());
    assert!(!grid.has_children(&all[3]).unwrap());
}

#[test]
fn test_tree_children_are_sorted_and_filtered() {
    let mut grid = department_grid();
    grid.sort("name", SortDirection::Ascending).unwrap();
    let children: Vec<&str> = grid
        .fetch_children(ParentKey::Item(1), 0, 10)
        .unwrap()
        .iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(children, vec!["Apps", "Platform"]);

    grid.apply_filter("name", TextFilter::new("plat")).unwrap();
    assert_eq!(grid.child_count(ParentKey::Item(1)).unwrap(), 1);
}

#[test]
fn test_lazy_tree_uses_parent_key() {
    let rows = Arc::new(departments());
    let count_rows = rows.clone();
    let child_rows = rows.clone();
    let source = DataSource::lazy_tree(
        move |query: &Query<Department, u32>| {
            Ok(count_rows
                .iter()
                .filter(|d| d.parent.as_ref() == Some(&query.parent))
                .count())
        },
        move |query: &Query<Department, u32>| {
            Ok(rows
                .iter()
                .filter(|d| d.parent.as_ref() == Some(&query.parent))
                .cloned()
                .collect())
        },
        move |d: &Department| {
            Ok(child_rows
                .iter()
                .any(|c| c.parent == Some(ParentKey::Item(d.id))))
        },
    );
    let grid = EnhancedGrid::new(RowIdentity::new(|d: &Department| d.id), source);

    assert_eq!(grid.count().unwrap(), 2);
    assert_eq!(grid.child_count(ParentKey::Item(2)).unwrap(), 1);
    assert_eq!(grid.fetch_children(ParentKey::Item(1), 0, 1).unwrap().len(), 1);
    assert!(grid.has_children(&departments()[0]).unwrap());
}

#[test]
fn test_stale_fetch_is_dropped() {
    let mut grid = in_memory_grid(GridConfig::default());
    let (stale_ticket, stale_query) = grid.begin_fetch(0, 10).unwrap();
    let stale_rows = grid.data_source().fetch(&stale_query).unwrap();

    grid.apply_filter("name", TextFilter::new("ann")).unwrap();
    let (ticket, query) = grid.begin_fetch(0, 10).unwrap();
    let rows = grid.data_source().fetch(&query).unwrap();

    assert!(grid.complete_fetch(stale_ticket, stale_rows).is_none());
    assert_eq!(grid.complete_fetch(ticket, rows).map(|r| ids(&r)), Some(vec![2]));
}

#[test]
fn test_sort_change_supersedes_fetch() {
    let mut grid = in_memory_grid(GridConfig::default());
    let (ticket, _) = grid.begin_fetch(0, 10).unwrap();
    grid.toggle_sort("age").unwrap();
    assert!(grid.complete_fetch(ticket, Vec::new()).is_none());

    let (ticket, _) = grid.begin_fetch(0, 10).unwrap();
    grid.refresh_all();
    assert!(grid.complete_fetch(ticket, Vec::new()).is_none());
}

#[test]
fn test_unsorted_query_sort() {
    let sort: QuerySort<Person> = QuerySort::unsorted();
    let mut rows = people();
    sort.sort_rows(&mut rows);
    assert_eq!(ids(&rows), ids(&people()));
    assert!(sort.is_unsorted());
}
