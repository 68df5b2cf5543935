//! Error types for Enhanced Grid.
//!
//! Only configuration mistakes and backend failures are errors. Requests that
//! fail a selection or editable gate are routine business rules and are
//! reported as no-ops by the component that rejected them.

/// Boxed error returned by backend fetch/count functions.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A specialized Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors that can occur while configuring or querying a grid.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// A column was asked for its value accessor before one was set.
    #[error(
        "Column '{column}' has no value accessor. Set one with `with_value` before using it for filtering or sorting"
    )]
    MissingValueAccessor { column: String },

    /// A column's value accessor produces a different type than requested.
    #[error("Column '{column}' value accessor does not produce values of type `{expected}`")]
    AccessorTypeMismatch {
        column: String,
        expected: &'static str,
    },

    /// A filter value of the wrong type was applied to a column.
    #[error("Column '{column}' filter is not of type `{expected}`")]
    FilterTypeMismatch {
        column: String,
        expected: &'static str,
    },

    /// A filter operation targeted a column that has no filter.
    #[error("Column '{column}' has no filter")]
    NoFilter { column: String },

    /// No column with the given id exists.
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    /// A column with the same id was already added.
    #[error("Duplicate column id '{0}'")]
    DuplicateColumn(String),

    /// A sort list named the same column twice.
    #[error("Column '{0}' appears more than once in the sort order")]
    DuplicateSortKey(String),

    /// Sorting was requested on a column without a comparator.
    #[error("Column '{column}' is not sortable")]
    NotSortable { column: String },

    /// Grid configuration could not be read or parsed.
    #[error("Invalid grid configuration: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BackendError>,
    },

    /// A backend fetch or count function failed.
    #[error("Backend request failed: {0}")]
    Backend(#[source] BackendError),
}

impl GridError {
    /// Create a missing accessor error.
    pub fn missing_value_accessor(column: impl Into<String>) -> Self {
        Self::MissingValueAccessor {
            column: column.into(),
        }
    }

    /// Create a configuration error with an underlying cause.
    pub fn config(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Wrap a backend failure.
    pub fn backend(source: impl Into<BackendError>) -> Self {
        Self::Backend(source.into())
    }

    /// Returns true for errors caused by grid misconfiguration.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::Backend(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_missing_accessor_message_names_column() {
        let err = GridError::missing_value_accessor("name");
        assert!(err.to_string().contains("'name'"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_backend_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
        let err = GridError::backend(io);
        assert!(!err.is_configuration());
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("connection reset"));
    }
}
