use dashmap::DashMap;

/// The node's in-memory key/value mapping, the only copy of its data.
///
/// Guarded by its own (sharded) locks, independent of the coordinator and of
/// every other node.
#[derive(Debug, Default)]
pub struct LocalStore {
    data: DashMap<String, String>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    /// Stores the value, returning the one it replaced.
    pub fn put(&self, key: &str, value: &str) -> Option<String> {
        self.data.insert(key.to_string(), value.to_string())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.data.get(key).map(|entry| entry.value().clone())
    }

    /// Removes the key if present, returning the old value.
    pub fn delete(&self, key: &str) -> Option<String> {
        self.data.remove(key).map(|(_, value)| value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sorted copy of the keys, for diagnostics.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }
}
