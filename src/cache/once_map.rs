//! Single-flight memoising map.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

/// A map whose values are computed at most once per key.
///
/// The map lock is only held while fetching the key's cell; the factory runs
/// under the cell's own initialisation lock, so concurrent first requests for
/// one key block on a single computation and never see a partial value, while
/// other keys proceed independently.
#[derive(Debug)]
pub struct OnceMap<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> OnceMap<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        OnceMap {
            cells: Mutex::new(HashMap::new()),
        }
    }

    fn cell(&self, key: K) -> Arc<OnceCell<V>> {
        let mut cells = self.cells.lock();
        Arc::clone(cells.entry(key).or_default())
    }

    /// Return the value for `key`, computing it with `factory` on first use.
    pub fn get_or_compute<F>(&self, key: K, factory: F) -> V
    where
        F: FnOnce() -> V,
    {
        self.cell(key).get_or_init(factory).clone()
    }

    /// Fallible variant; on error the key stays uncomputed.
    pub fn get_or_try_compute<F, E>(&self, key: K, factory: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        self.cell(key).get_or_try_init(factory).cloned()
    }

    /// The value for `key`, if already computed.
    pub fn get(&self, key: &K) -> Option<V> {
        let cells = self.cells.lock();
        cells.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Store a value unless one is already present; returns the stored value.
    pub fn insert(&self, key: K, value: V) -> V {
        self.get_or_compute(key, || value)
    }

    /// Number of computed entries.
    pub fn len(&self) -> usize {
        self.cells
            .lock()
            .values()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for OnceMap<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_computes_once() {
        let map: OnceMap<&str, usize> = OnceMap::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let v = map.get_or_compute("a", || {
                calls.fetch_add(1, Ordering::SeqCst);
                7
            });
            assert_eq!(v, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(map.get(&"a"), Some(7));
        assert_eq!(map.get(&"b"), None);
    }

    #[test]
    fn test_failed_factory_leaves_key_empty() {
        let map: OnceMap<u32, String> = OnceMap::new();

        let err: Result<String, &str> = map.get_or_try_compute(1, || Err("boom"));
        assert!(err.is_err());
        assert!(map.is_empty());

        let ok: Result<String, &str> = map.get_or_try_compute(1, || Ok("fine".into()));
        assert_eq!(ok.unwrap(), "fine");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_concurrent_first_requests_share_result() {
        let map: Arc<OnceMap<u32, usize>> = Arc::new(OnceMap::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let map = Arc::clone(&map);
                let calls = Arc::clone(&calls);
                std::thread::spawn(move || {
                    map.get_or_compute(42, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(10));
                        99
                    })
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 99);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
