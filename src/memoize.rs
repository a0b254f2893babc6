//! A thread-safe, keyed single-flight cache.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// Caches the results of a pure function of one argument.
///
/// At most one construction per key is in flight at a time: the first caller
/// builds the value while later callers for the same key block on a condvar
/// and then read the shared `Arc`. Entries are retained for the process
/// lifetime; every key space in this crate is small and bounded.
pub(crate) struct Memoizer<K, V> {
    state: Mutex<State<K, V>>,
    ready: Condvar,
    build: fn(&K) -> V,
}

struct State<K, V> {
    cache: HashMap<K, Arc<V>>,
    pending: HashSet<K>,
}

impl<K: Eq + Hash + Clone, V> Memoizer<K, V> {
    /// Creates a memoizer over the given construction function.
    pub fn new(build: fn(&K) -> V) -> Self {
        Self {
            state: Mutex::new(State {
                cache: HashMap::new(),
                pending: HashSet::new(),
            }),
            ready: Condvar::new(),
            build,
        }
    }

    /// Returns the cached value for `key`, constructing it if absent.
    pub fn get(&self, key: K) -> Arc<V> {
        let mut state = self.state.lock();
        loop {
            if let Some(value) = state.cache.get(&key) {
                return Arc::clone(value);
            }
            if state.pending.insert(key.clone()) {
                break;
            }
            // Another caller is building this key; wait for it.
            self.ready.wait(&mut state);
        }
        drop(state);

        let value = Arc::new((self.build)(&key));

        let mut state = self.state.lock();
        state.pending.remove(&key);
        state.cache.insert(key, Arc::clone(&value));
        self.ready.notify_all();
        value
    }
}
