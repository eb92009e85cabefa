//! In-memory secret storage implementation.

use parking_lot::RwLock;
use std::collections::HashMap;

use super::{Secret, SecretStore, StoreError};

/// In-memory secret store for testing and development.
///
/// This store is not persistent; data is lost when the process exits.
/// The map is guarded by a `RwLock`, so the store can be shared across
/// threads.
pub struct MemoryStore {
    service_name: String,
    data: RwLock<HashMap<String, Secret>>,
}

impl MemoryStore {
    /// Create a new empty memory store for the given namespace.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self::with_data(service_name, HashMap::new())
    }

    /// Create a memory store with initial data.
    pub fn with_data(service_name: impl Into<String>, data: HashMap<String, Secret>) -> Self {
        Self {
            service_name: service_name.into(),
            data: RwLock::new(data),
        }
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("service_name", &self.service_name)
            .field("keys_count", &self.len())
            .finish()
    }
}

impl SecretStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Secret>, StoreError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn set(&self, key: &str, secret: &Secret) -> Result<(), StoreError> {
        self.data.write().insert(key.to_string(), secret.clone());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.data.write().remove(key);
        Ok(())
    }

    fn service_name(&self) -> &str {
        &self.service_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_set_get() {
        let store = MemoryStore::new("test");
        let secret = Secret::new("test-value");

        store.set("test-key", &secret).unwrap();
        let retrieved = store.get("test-key").unwrap();

        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap().expose(), "test-value");
    }

    #[test]
    fn test_memory_store_overwrite() {
        let store = MemoryStore::new("test");

        store.set("test-key", &Secret::new("first")).unwrap();
        store.set("test-key", &Secret::new("second")).unwrap();

        assert_eq!(store.get("test-key").unwrap().unwrap().expose(), "second");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_memory_store_get_nonexistent() {
        let store = MemoryStore::new("test");
        let result = store.get("nonexistent").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_memory_store_delete() {
        let store = MemoryStore::new("test");
        let secret = Secret::new("test-value");

        store.set("test-key", &secret).unwrap();
        store.delete("test-key").unwrap();

        let result = store.get("test-key").unwrap();
        assert!(result.is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_store_delete_nonexistent() {
        let store = MemoryStore::new("test");
        assert!(store.delete("never-set").is_ok());
    }

    #[test]
    fn test_memory_store_exists() {
        let store = MemoryStore::new("test");

        assert!(!store.exists("test-key").unwrap());

        store.set("test-key", &Secret::new("test-value")).unwrap();

        assert!(store.exists("test-key").unwrap());
    }

    #[test]
    fn test_memory_store_with_data() {
        let mut seed = HashMap::new();
        seed.insert("token".to_string(), Secret::new("abc"));
        let store = MemoryStore::with_data("seeded", seed);

        assert_eq!(store.service_name(), "seeded");
        assert_eq!(store.get("token").unwrap(), Some(Secret::new("abc")));
    }
}
