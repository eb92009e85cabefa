//! Top-level error types for Keychest.

use thiserror::Error;

use crate::config::ConfigError;
use crate::model::ValueType;

/// Top-level error type for keychain accessor operations.
///
/// A missing entry is never an error; reads report it as `None`.
#[derive(Debug, Error)]
pub enum KeychestError {
    /// A write was requested without a value.
    #[error("no value given for key: {key}")]
    MissingValue { key: String },

    /// A value does not match the type tag it was declared with.
    #[error("type mismatch for key {key}: expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: ValueType,
        found: ValueType,
    },

    /// The descriptor carries a type tag that cannot be written.
    #[error("unrecognized value type for key: {key}")]
    UnrecognizedType { key: String },

    /// A numeric value cannot be held exactly by its tagged type.
    #[error("value for key {key} is out of range for {value_type}")]
    OutOfRange { key: String, value_type: ValueType },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
