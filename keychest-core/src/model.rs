//! Domain model types for Keychest.
//!
//! This module defines the core types used throughout Keychest:
//! - [`ValueType`] - Tag naming which primitive a keychain entry holds
//! - [`SecretValue`] - A typed value read from or written to the keychain
//! - [`KeyDescriptor`] - Request/response record for batch operations
//! - [`KeychainValue`] - Conversion between Rust primitives and stored text

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::KeychestError;
use crate::store::Secret;

/// Type tag of a keychain entry.
///
/// Unknown tags deserialize to [`ValueType::Unrecognized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Integer,
    Bool,
    Double,
    Float,
    String,

    /// Sentinel for a tag this library does not know how to read or write.
    #[serde(other)]
    Unrecognized,
}

impl ValueType {
    /// Get the tag as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Bool => "bool",
            Self::Double => "double",
            Self::Float => "float",
            Self::String => "string",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed keychain value.
///
/// String payloads stay wrapped in [`Secret`] so they never show up in logs.
#[derive(Debug, Clone, PartialEq)]
pub enum SecretValue {
    Integer(i64),
    Bool(bool),
    Double(f64),
    Float(f32),
    String(Secret),
}

impl SecretValue {
    /// The tag matching this value's variant.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Integer(_) => ValueType::Integer,
            Self::Bool(_) => ValueType::Bool,
            Self::Double(_) => ValueType::Double,
            Self::Float(_) => ValueType::Float,
            Self::String(_) => ValueType::String,
        }
    }
}

impl From<i64> for SecretValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for SecretValue {
    fn from(v: i32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<bool> for SecretValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for SecretValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<f32> for SecretValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for SecretValue {
    fn from(v: &str) -> Self {
        Self::String(Secret::new(v))
    }
}

impl From<String> for SecretValue {
    fn from(v: String) -> Self {
        Self::String(Secret::new(v))
    }
}

impl From<Secret> for SecretValue {
    fn from(v: Secret) -> Self {
        Self::String(v)
    }
}

/// A primitive that can be stored in the keychain.
///
/// Values are stored as text: strings verbatim, numbers in their shortest
/// round-tripping decimal form, booleans as `true`/`false`.
pub trait KeychainValue: Sized {
    /// The tag this type reads and writes as.
    const VALUE_TYPE: ValueType;

    /// Encode the value as stored text.
    fn encode(&self) -> Secret;

    /// Decode stored text, or `None` if it is not a valid `Self`.
    fn decode(stored: &Secret) -> Option<Self>;

    /// Lift the value into the tagged union.
    fn into_value(self) -> SecretValue;
}

macro_rules! parsed_keychain_value {
    ($ty:ty, $tag:ident) => {
        impl KeychainValue for $ty {
            const VALUE_TYPE: ValueType = ValueType::$tag;

            fn encode(&self) -> Secret {
                Secret::new(self.to_string())
            }

            fn decode(stored: &Secret) -> Option<Self> {
                stored.expose().trim().parse().ok()
            }

            fn into_value(self) -> SecretValue {
                self.into()
            }
        }
    };
}

parsed_keychain_value!(i64, Integer);
parsed_keychain_value!(i32, Integer);
parsed_keychain_value!(bool, Bool);
parsed_keychain_value!(f64, Double);
parsed_keychain_value!(f32, Float);

impl KeychainValue for String {
    const VALUE_TYPE: ValueType = ValueType::String;

    fn encode(&self) -> Secret {
        Secret::new(self.as_str())
    }

    fn decode(stored: &Secret) -> Option<Self> {
        Some(stored.expose().to_string())
    }

    fn into_value(self) -> SecretValue {
        self.into()
    }
}

impl KeychainValue for Secret {
    const VALUE_TYPE: ValueType = ValueType::String;

    fn encode(&self) -> Secret {
        self.clone()
    }

    fn decode(stored: &Secret) -> Option<Self> {
        Some(stored.clone())
    }

    fn into_value(self) -> SecretValue {
        self.into()
    }
}

/// Request/response record for batch reads and writes.
///
/// Build read requests with [`KeyDescriptor::request`] and write requests
/// with [`KeyDescriptor::with_value`]. A descriptor's tag always agrees with
/// its value: the constructors derive the tag from the value, and
/// [`KeyDescriptor::new`] and deserialization reject a disagreeing pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDescriptor", into = "RawDescriptor")]
pub struct KeyDescriptor {
    key: String,
    value: Option<SecretValue>,
    value_type: ValueType,
    write_success: Option<bool>,
}

impl KeyDescriptor {
    /// Create a descriptor from parts, checking that `value` matches `value_type`.
    pub fn new(
        key: impl Into<String>,
        value_type: ValueType,
        value: Option<SecretValue>,
    ) -> Result<Self, KeychestError> {
        let key = key.into();
        if let Some(v) = &value {
            if v.value_type() != value_type {
                return Err(KeychestError::TypeMismatch {
                    key,
                    expected: value_type,
                    found: v.value_type(),
                });
            }
        }

        Ok(Self {
            key,
            value,
            value_type,
            write_success: None,
        })
    }

    /// A read request for `key`, expecting a value of `value_type`.
    pub fn request(key: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            key: key.into(),
            value: None,
            value_type,
            write_success: None,
        }
    }

    /// A write request storing `value` under `key`.
    pub fn with_value(key: impl Into<String>, value: impl Into<SecretValue>) -> Self {
        let value = value.into();
        Self {
            key: key.into(),
            value_type: value.value_type(),
            value: Some(value),
            write_success: None,
        }
    }

    /// A read response; `value`, when present, was read as `value_type`.
    pub(crate) fn response(
        key: impl Into<String>,
        value_type: ValueType,
        value: Option<SecretValue>,
    ) -> Self {
        debug_assert!(value.as_ref().is_none_or(|v| v.value_type() == value_type));
        Self {
            key: key.into(),
            value,
            value_type,
            write_success: None,
        }
    }

    pub(crate) fn with_write_success(mut self, accepted: bool) -> Self {
        self.write_success = Some(accepted);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&SecretValue> {
        self.value.as_ref()
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Outcome of the write, set only on descriptors returned from a batch write.
    pub fn write_success(&self) -> Option<bool> {
        self.write_success
    }

    /// The value to write, or the reason this descriptor cannot be written.
    pub(crate) fn writable_value(&self) -> Result<&SecretValue, KeychestError> {
        if self.value_type == ValueType::Unrecognized {
            return Err(KeychestError::UnrecognizedType {
                key: self.key.clone(),
            });
        }

        let value = self.value.as_ref().ok_or_else(|| KeychestError::MissingValue {
            key: self.key.clone(),
        })?;

        if value.value_type() != self.value_type {
            return Err(KeychestError::TypeMismatch {
                key: self.key.clone(),
                expected: self.value_type,
                found: value.value_type(),
            });
        }

        Ok(value)
    }
}

/// Wire shape of a [`KeyDescriptor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawDescriptor {
    key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<RawValue>,
    value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    write_success: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Bool(bool),
    Integer(i64),
    /// Only produced when reading integers above `i64::MAX`.
    Unsigned(u64),
    Double(f64),
    Text(String),
}

/// 2^63 and 2^64, the first magnitudes past `i64` and `u64`.
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

fn i64_as_f64_exact(v: i64) -> Option<f64> {
    let f = v as f64;
    (f < TWO_POW_63 && f as i64 == v).then_some(f)
}

fn u64_as_f64_exact(v: u64) -> Option<f64> {
    let f = v as f64;
    (f < TWO_POW_64 && f as u64 == v).then_some(f)
}

fn f64_as_f32_exact(v: f64) -> Option<f32> {
    let f = v as f32;
    (f64::from(f) == v).then_some(f)
}

/// Nearest `f32`, rejecting overflow to infinity and underflow to zero.
///
/// Decimal fractions are inexact in binary either way, so rounding them to
/// the nearest `f32` is accepted.
fn f64_as_f32_nearest(v: f64) -> Option<f32> {
    let f = v as f32;
    let overflowed = v.is_finite() && !f.is_finite();
    let underflowed = v != 0.0 && f == 0.0;
    (!overflowed && !underflowed).then_some(f)
}

impl TryFrom<RawDescriptor> for KeyDescriptor {
    type Error = KeychestError;

    fn try_from(raw: RawDescriptor) -> Result<Self, Self::Error> {
        let key = raw.key;
        let out_of_range = |value_type: ValueType| KeychestError::OutOfRange {
            key: key.clone(),
            value_type,
        };

        let value = match (raw.value_type, raw.value) {
            (_, None) => None,
            (ValueType::Integer, Some(RawValue::Integer(v))) => Some(SecretValue::Integer(v)),
            (ValueType::Integer, Some(RawValue::Unsigned(_))) => {
                return Err(out_of_range(ValueType::Integer));
            }
            (ValueType::Integer, Some(RawValue::Double(v)))
                if v.fract() == 0.0 && v.abs() >= TWO_POW_63 =>
            {
                return Err(out_of_range(ValueType::Integer));
            }
            (ValueType::Bool, Some(RawValue::Bool(v))) => Some(SecretValue::Bool(v)),
            // JSON and TOML do not distinguish `3` from `3.0`, so integers are
            // accepted for floating-point tags when they convert exactly.
            (ValueType::Double, Some(RawValue::Integer(v))) => Some(SecretValue::Double(
                i64_as_f64_exact(v).ok_or_else(|| out_of_range(ValueType::Double))?,
            )),
            (ValueType::Double, Some(RawValue::Unsigned(v))) => Some(SecretValue::Double(
                u64_as_f64_exact(v).ok_or_else(|| out_of_range(ValueType::Double))?,
            )),
            (ValueType::Double, Some(RawValue::Double(v))) => Some(SecretValue::Double(v)),
            (ValueType::Float, Some(RawValue::Integer(v))) => Some(SecretValue::Float(
                i64_as_f64_exact(v)
                    .and_then(f64_as_f32_exact)
                    .ok_or_else(|| out_of_range(ValueType::Float))?,
            )),
            (ValueType::Float, Some(RawValue::Unsigned(v))) => Some(SecretValue::Float(
                u64_as_f64_exact(v)
                    .and_then(f64_as_f32_exact)
                    .ok_or_else(|| out_of_range(ValueType::Float))?,
            )),
            (ValueType::Float, Some(RawValue::Double(v))) => Some(SecretValue::Float(
                f64_as_f32_nearest(v).ok_or_else(|| out_of_range(ValueType::Float))?,
            )),
            (ValueType::String, Some(RawValue::Text(v))) => Some(SecretValue::from(v)),
            // Kept readable so batch operations can report the tag instead.
            (ValueType::Unrecognized, Some(_)) => None,
            (expected, Some(other)) => {
                return Err(KeychestError::TypeMismatch {
                    key,
                    expected,
                    found: other.value_type(),
                });
            }
        };

        Ok(Self {
            key,
            value,
            value_type: raw.value_type,
            write_success: raw.write_success,
        })
    }
}

impl From<KeyDescriptor> for RawDescriptor {
    fn from(d: KeyDescriptor) -> Self {
        let value = d.value.as_ref().map(|v| match v {
            SecretValue::Integer(v) => RawValue::Integer(*v),
            SecretValue::Bool(v) => RawValue::Bool(*v),
            SecretValue::Double(v) => RawValue::Double(*v),
            SecretValue::Float(v) => RawValue::Double(f64::from(*v)),
            SecretValue::String(s) => RawValue::Text(s.expose().to_string()),
        });

        Self {
            key: d.key,
            value,
            value_type: d.value_type,
            write_success: d.write_success,
        }
    }
}

impl RawValue {
    fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Integer(_) | Self::Unsigned(_) => ValueType::Integer,
            Self::Double(_) => ValueType::Double,
            Self::Text(_) => ValueType::String,
        }
    }
}
