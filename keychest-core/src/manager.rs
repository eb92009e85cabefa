//! Typed accessors over a [`SecretStore`].
//!
//! [`KeychainManager`] is the entry point: it binds a store to one service
//! namespace and converts between Rust primitives and stored text.
//!
//! # Failure Model
//!
//! - A missing entry reads as `None`.
//! - Text that does not decode as the requested type reads as `None`.
//! - Store failures are logged and reported as `None` from reads and
//!   `false` from writes. The `try_*` variants return them instead.
//! - Writes with no value or a mismatched type tag are errors.
//!
//! # Example
//!
//! ```rust,ignore
//! use keychest_core::{KeychainManager, KeyDescriptor, ValueType};
//!
//! let keychain = KeychainManager::new(Some("com.example.app"));
//!
//! keychain.write("age", 30_i64);
//! let batch = keychain.read_batch(&[KeyDescriptor::request("age", ValueType::Integer)]);
//! assert_eq!(batch[0].value(), Some(&30_i64.into()));
//! ```

use std::path::Path;
use tracing::{debug, warn};

use crate::config::{Backend, KeychestConfig};
use crate::error::KeychestError;
use crate::model::{KeyDescriptor, KeychainValue, SecretValue, ValueType};
use crate::store::{create_store, Secret, SecretStore, StoreError};

/// Key under which [`KeychainManager::username`] is stored.
pub const USERNAME_KEY: &str = "username";

/// Key under which [`KeychainManager::password`] is stored.
pub const PASSWORD_KEY: &str = "password";

/// Typed keychain accessor scoped to a single service namespace.
pub struct KeychainManager {
    store: Box<dyn SecretStore>,
}

impl KeychainManager {
    /// Create a manager backed by the OS keychain.
    ///
    /// `service_name` defaults to the host application's name. Falls back to
    /// an in-memory store when no keychain is available.
    pub fn new(service_name: Option<&str>) -> Self {
        let service = service_name
            .map(str::to_string)
            .unwrap_or_else(crate::config::default_service_name);
        Self::with_store(create_store(&service, true))
    }

    /// Create a manager over an existing store.
    pub fn with_store(store: Box<dyn SecretStore>) -> Self {
        debug!(service = store.service_name(), "Keychain manager ready");
        Self { store }
    }

    /// Create a manager from `keychest.toml` in the platform config directory.
    ///
    /// A missing file means defaults; an unreadable or invalid one is an error.
    pub fn load() -> Result<Self, KeychestError> {
        let config = KeychestConfig::load()?;
        Ok(Self::from_config(&config))
    }

    /// Create a manager from a specific configuration file.
    pub fn load_from_path(path: &Path) -> Result<Self, KeychestError> {
        let config = KeychestConfig::load_from_path(path)?;
        Ok(Self::from_config(&config))
    }

    pub fn from_config(config: &KeychestConfig) -> Self {
        let service = config.service_name();
        let prefer_keyring = config.backend == Backend::Keyring;
        Self::with_store(create_store(&service, prefer_keyring))
    }

    /// The service namespace all keys are scoped to.
    pub fn service_name(&self) -> &str {
        self.store.service_name()
    }

    /// Read `key` as a `T`.
    ///
    /// Returns `None` if the entry is missing, does not decode as `T`, or
    /// the store failed.
    pub fn read<T: KeychainValue>(&self, key: &str) -> Option<T> {
        match self.try_read(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, "Keychain read failed: {}", e);
                None
            }
        }
    }

    /// Read `key` as a `T`, surfacing store failures.
    pub fn try_read<T: KeychainValue>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(stored) = self.store.get(key)? else {
            debug!(key, "No keychain entry");
            return Ok(None);
        };

        let value = T::decode(&stored);
        if value.is_none() {
            let expected = T::VALUE_TYPE;
            debug!(key, %expected, "Keychain entry does not decode");
        }
        Ok(value)
    }

    /// Store `value` under `key`, replacing any existing entry.
    ///
    /// Returns whether the store accepted the write.
    pub fn write<T: KeychainValue>(&self, key: &str, value: T) -> bool {
        accepted(key, self.try_write(key, value))
    }

    pub fn try_write<T: KeychainValue>(&self, key: &str, value: T) -> Result<(), StoreError> {
        self.write_value(key, &value.into_value())
    }

    /// Whether an entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.store.exists(key).unwrap_or_else(|e| {
            warn!(key, "Keychain lookup failed: {}", e);
            false
        })
    }

    pub fn try_delete(&self, key: &str) -> Result<(), StoreError> {
        self.store.delete(key)
    }

    /// Remove every listed entry. Keys without an entry are skipped.
    pub fn delete_keys<I, K>(&self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        for key in keys {
            let key = key.as_ref();
            if let Err(e) = self.try_delete(key) {
                warn!(key, "Keychain delete failed: {}", e);
            }
        }
    }

    /// Read every descriptor's key as its tagged type.
    ///
    /// Output order follows input order. Descriptors tagged
    /// [`ValueType::Unrecognized`] produce no output.
    pub fn read_batch(&self, descriptors: &[KeyDescriptor]) -> Vec<KeyDescriptor> {
        descriptors
            .iter()
            .filter_map(|descriptor| {
                let key = descriptor.key();
                let value_type = descriptor.value_type();
                if value_type == ValueType::Unrecognized {
                    warn!(key, "Skipping read of unrecognized value type");
                    return None;
                }
                let value = self.read_value(key, value_type);
                Some(KeyDescriptor::response(key, value_type, value))
            })
            .collect()
    }

    /// Write every descriptor's value.
    ///
    /// Produces one result per input, in input order. A descriptor that
    /// cannot be written fails on its own and the rest of the batch
    /// continues. Successful results echo the descriptor with
    /// [`write_success`](KeyDescriptor::write_success) set.
    pub fn write_batch(
        &self,
        descriptors: &[KeyDescriptor],
    ) -> Vec<Result<KeyDescriptor, KeychestError>> {
        descriptors
            .iter()
            .map(|descriptor| {
                let value = descriptor.writable_value().inspect_err(|e| {
                    warn!(key = descriptor.key(), "Rejected batch write: {}", e);
                })?;
                let write_success =
                    accepted(descriptor.key(), self.write_value(descriptor.key(), value));
                Ok(descriptor.clone().with_write_success(write_success))
            })
            .collect()
    }

    pub fn username(&self) -> Option<String> {
        self.read(USERNAME_KEY)
    }

    /// Store the username. `None` is rejected rather than ignored.
    pub fn set_username(&self, username: Option<&str>) -> Result<bool, KeychestError> {
        let username = username.ok_or_else(|| KeychestError::MissingValue {
            key: USERNAME_KEY.to_string(),
        })?;
        Ok(self.write(USERNAME_KEY, username.to_string()))
    }

    pub fn password(&self) -> Option<Secret> {
        self.read(PASSWORD_KEY)
    }

    /// Store the password. `None` is rejected rather than ignored.
    pub fn set_password(&self, password: Option<&str>) -> Result<bool, KeychestError> {
        let password = password.ok_or_else(|| KeychestError::MissingValue {
            key: PASSWORD_KEY.to_string(),
        })?;
        Ok(self.write(PASSWORD_KEY, Secret::new(password)))
    }

    fn read_value(&self, key: &str, value_type: ValueType) -> Option<SecretValue> {
        match value_type {
            ValueType::Integer => self.read::<i64>(key).map(SecretValue::Integer),
            ValueType::Bool => self.read::<bool>(key).map(SecretValue::Bool),
            ValueType::Double => self.read::<f64>(key).map(SecretValue::Double),
            ValueType::Float => self.read::<f32>(key).map(SecretValue::Float),
            ValueType::String => self.read::<Secret>(key).map(SecretValue::String),
            ValueType::Unrecognized => None,
        }
    }

    fn write_value(&self, key: &str, value: &SecretValue) -> Result<(), StoreError> {
        let encoded = match value {
            SecretValue::Integer(v) => v.encode(),
            SecretValue::Bool(v) => v.encode(),
            SecretValue::Double(v) => v.encode(),
            SecretValue::Float(v) => v.encode(),
            SecretValue::String(v) => v.encode(),
        };
        self.store.set(key, &encoded)
    }
}

impl std::fmt::Debug for KeychainManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeychainManager")
            .field("service_name", &self.service_name())
            .finish()
    }
}

fn accepted(key: &str, result: Result<(), StoreError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(key, "Keychain write failed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn test_manager() -> KeychainManager {
        KeychainManager::with_store(Box::new(MemoryStore::new("com.example.test")))
    }

    /// A store whose writes always fail, as a locked keychain would.
    struct RejectingStore;

    impl SecretStore for RejectingStore {
        fn get(&self, _key: &str) -> Result<Option<Secret>, StoreError> {
            Err(StoreError::AccessDenied {
                key: "locked".to_string(),
            })
        }

        fn set(&self, key: &str, _secret: &Secret) -> Result<(), StoreError> {
            Err(StoreError::AccessDenied {
                key: key.to_string(),
            })
        }

        fn delete(&self, key: &str) -> Result<(), StoreError> {
            Err(StoreError::AccessDenied {
                key: key.to_string(),
            })
        }

        fn service_name(&self) -> &str {
            "locked"
        }
    }

    #[test]
    fn test_service_name() {
        let manager = test_manager();
        assert_eq!(manager.service_name(), "com.example.test");
        assert!(format!("{:?}", manager).contains("com.example.test"));
    }

    #[test]
    fn test_read_missing() {
        let manager = test_manager();
        assert_eq!(manager.read::<i64>("nothing"), None);
        assert_eq!(manager.try_read::<String>("nothing").unwrap(), None);
        assert!(!manager.contains("nothing"));
    }

    #[test]
    fn test_read_undecodable_is_none() {
        let manager = test_manager();
        assert!(manager.write("age", "thirty".to_string()));
        assert_eq!(manager.read::<i64>("age"), None);
        assert_eq!(manager.read::<bool>("age"), None);
        assert_eq!(manager.read::<String>("age").as_deref(), Some("thirty"));
    }

    #[test]
    fn test_write_overwrites() {
        let manager = test_manager();
        assert!(manager.write("count", 1_i64));
        assert!(manager.write("count", 2_i64));
        assert_eq!(manager.read::<i64>("count"), Some(2));
    }

    #[test]
    fn test_integer_reads_as_double() {
        let manager = test_manager();
        manager.write("ratio", 3_i64);
        assert_eq!(manager.read::<f64>("ratio"), Some(3.0));
    }

    #[test]
    fn test_rejected_write_returns_false() {
        let manager = KeychainManager::with_store(Box::new(RejectingStore));
        assert!(!manager.write("age", 30_i64));
        assert!(manager.try_write("age", 30_i64).is_err());
        assert_eq!(manager.set_username(Some("alice")).unwrap(), false);
    }

    #[test]
    fn test_failed_read_is_none() {
        let manager = KeychainManager::with_store(Box::new(RejectingStore));
        assert_eq!(manager.read::<i64>("age"), None);
        assert!(matches!(
            manager.try_read::<i64>("age"),
            Err(StoreError::AccessDenied { .. })
        ));
        assert!(!manager.contains("age"));
    }

    #[test]
    fn test_delete_keys_tolerates_failures() {
        let manager = KeychainManager::with_store(Box::new(RejectingStore));
        manager.delete_keys(["a", "b"]);
    }

    #[test]
    fn test_read_value_dispatch() {
        let manager = test_manager();
        manager.write("flag", true);
        manager.write("ratio", 0.5_f32);

        assert_eq!(
            manager.read_value("flag", ValueType::Bool),
            Some(SecretValue::Bool(true))
        );
        assert_eq!(
            manager.read_value("ratio", ValueType::Float),
            Some(SecretValue::Float(0.5))
        );
        assert_eq!(manager.read_value("flag", ValueType::Integer), None);
        assert_eq!(manager.read_value("flag", ValueType::Unrecognized), None);
    }

    #[test]
    fn test_write_batch_reports_rejection() {
        let manager = KeychainManager::with_store(Box::new(RejectingStore));
        let results = manager.write_batch(&[KeyDescriptor::with_value("age", 30_i64)]);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().write_success(), Some(false));
    }

    #[test]
    fn test_password_is_secret() {
        let manager = test_manager();
        assert!(manager.set_password(Some("hunter2")).unwrap());

        let password = manager.password().unwrap();
        assert_eq!(password.expose(), "hunter2");
        assert!(!format!("{:?}", password).contains("hunter2"));
    }

    #[test]
    fn test_set_password_none_fails() {
        let manager = test_manager();
        let result = manager.set_password(None);
        assert!(matches!(
            result,
            Err(KeychestError::MissingValue { ref key }) if key == PASSWORD_KEY
        ));
        assert!(!manager.contains(PASSWORD_KEY));
    }
}
