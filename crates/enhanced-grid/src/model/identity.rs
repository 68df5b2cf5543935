use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Maps a row to the key that identifies it.
///
/// Rows are compared through their key, never by reference. Two copies of the
/// same entity fetched in different pages are the same row.
pub struct RowIdentity<T, K> {
    key: Arc<dyn Fn(&T) -> K + Send + Sync>,
}

impl<T, K> Clone for RowIdentity<T, K> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
        }
    }
}

impl<T, K> fmt::Debug for RowIdentity<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowIdentity").finish_non_exhaustive()
    }
}

impl<T, K> RowIdentity<T, K>
where
    K: Eq + Hash + Clone,
{
    pub fn new<F>(key: F) -> Self
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self { key: Arc::new(key) }
    }

    pub fn key(&self, row: &T) -> K {
        (self.key)(row)
    }

    pub fn same(&self, a: &T, b: &T) -> bool {
        self.key(a) == self.key(b)
    }
}

impl<T> RowIdentity<T, T>
where
    T: Eq + Hash + Clone + 'static,
{
    /// Identity by value, for rows that are their own key.
    pub fn by_value() -> Self {
        Self::new(T::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_compares_keys() {
        let identity = RowIdentity::new(|row: &(u32, &str)| row.0);
        assert!(identity.same(&(1, "old"), &(1, "new")));
        assert!(!identity.same(&(1, "a"), &(2, "a")));
        assert_eq!(RowIdentity::<i32, i32>::by_value().key(&7), 7);
    }

    #[test]
    fn test_by_value_identity_for_owned_rows() {
        let identity = RowIdentity::<String, String>::by_value();
        let moved = identity.clone();
        let handle = std::thread::spawn(move || moved.key(&"ann".to_string()));
        assert_eq!(handle.join().unwrap(), "ann");
        assert!(identity.same(&"bob".to_string(), &"bob".to_string()));
    }
}
