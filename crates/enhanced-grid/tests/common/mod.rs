//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use enhanced_grid::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: u32,
    pub name: String,
    pub age: u32,
}

pub fn person(id: u32, name: &str, age: u32) -> Person {
    Person {
        id,
        name: name.into(),
        age,
    }
}

pub fn people() -> Vec<Person> {
    vec![
        person(1, "Bob", 30),
        person(2, "Ann", 25),
        person(3, "Bob", 20),
        person(4, "Cid", 41),
        person(5, "Dana", 17),
    ]
}

pub fn identity() -> RowIdentity<Person, u32> {
    RowIdentity::new(|p: &Person| p.id)
}

/// Name and age columns, both filterable and sortable.
pub fn person_columns() -> Vec<Column<Person>> {
    vec![
        Column::new("name")
            .with_header("Name")
            .with_ordered_value(|p: &Person| p.name.clone())
            .with_filter(TextFilter::default())
            .expect("name filter"),
        Column::new("age")
            .with_header("Age")
            .with_ordered_value(|p: &Person| p.age)
            .with_filter(RangeFilter::<u32>::default())
            .expect("age filter"),
    ]
}

pub fn grid_over(source: DataSource<Person, u32>, config: GridConfig) -> EnhancedGrid<Person, u32> {
    let mut grid = EnhancedGrid::with_config(identity(), source, config);
    for column in person_columns() {
        grid.add_column(column).expect("add column");
    }
    grid
}

pub fn in_memory_grid(config: GridConfig) -> EnhancedGrid<Person, u32> {
    grid_over(DataSource::in_memory(people()), config)
}

/// Install a test subscriber; `RUST_LOG=enhanced_grid=debug` shows the logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn ids(rows: &[Person]) -> Vec<u32> {
    rows.iter().map(|p| p.id).collect()
}
