//! # Keychest Core
//!
//! Typed accessors over the platform keychain.
//!
//! This crate provides:
//! - [`KeychainManager`] - Read and write strings, integers, booleans and
//!   floating-point values scoped to a service namespace
//! - [`KeyDescriptor`] batch reads and writes
//! - In-memory and (optionally) OS keychain storage backends
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use keychest_core::KeychainManager;
//!
//! let keychain = KeychainManager::new(Some("com.example.app"));
//!
//! keychain.set_username(Some("alice"))?;
//! keychain.write("launch_count", 3_i64);
//!
//! assert_eq!(keychain.username().as_deref(), Some("alice"));
//! assert_eq!(keychain.read::<i64>("launch_count"), Some(3));
//! ```

pub mod config;
pub mod error;
pub mod manager;
pub mod model;
pub mod store;

// Re-export commonly used types at crate root
pub use config::{
    Backend,
    ConfigError,
    KeychestConfig,
    default_service_name,
};

pub use error::KeychestError;

pub use manager::{
    KeychainManager,
    PASSWORD_KEY,
    USERNAME_KEY,
};

pub use model::{
    KeyDescriptor,
    KeychainValue,
    SecretValue,
    ValueType,
};

pub use store::{
    Secret,
    SecretStore,
    StoreError,
    MemoryStore,
    create_store,
};

#[cfg(feature = "keyring-store")]
pub use store::KeyringStore;
