//! Property value types for table rows
//!
//! A table row is a bag of named, typed properties. This module defines the
//! closed set of property types a row can hold.
//!
//! ## Type Set
//!
//! - No implicit type coercions between variants
//! - IEEE-754 float equality semantics
//! - Nested structures are stored as [`PropertyValue::Serialized`] JSON text

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single typed property of a table row
///
/// ## The Six Types
///
/// 1. `String` - UTF-8 encoded string
/// 2. `Int64` - 64-bit signed integer
/// 3. `Double` - 64-bit IEEE-754 floating point
/// 4. `Bool` - Boolean true or false
/// 5. `DateTime` - UTC timestamp
/// 6. `Serialized` - JSON text of a nested object or array
///
/// ## Equality Rules
///
/// - Different types are NEVER equal (no type coercion)
/// - `Int64(1)` != `Double(1.0)`
/// - `String("[]")` != `Serialized("[]")`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// UTF-8 encoded string
    String(String),

    /// 64-bit signed integer
    Int64(i64),

    /// 64-bit IEEE-754 floating point
    Double(f64),

    /// Boolean true or false
    Bool(bool),

    /// UTC timestamp
    DateTime(DateTime<Utc>),

    /// JSON text of a nested value
    Serialized(String),
}

impl PropertyValue {
    /// Returns the type name as a string (for error messages)
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::String(_) => "String",
            PropertyValue::Int64(_) => "Int64",
            PropertyValue::Double(_) => "Double",
            PropertyValue::Bool(_) => "Bool",
            PropertyValue::DateTime(_) => "DateTime",
            PropertyValue::Serialized(_) => "Serialized",
        }
    }

    /// Try to get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Double(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Render the value the way it would appear inside a row key.
    ///
    /// Strings are returned verbatim (no quoting), numbers use their
    /// canonical decimal form, timestamps use RFC 3339.
    pub fn to_key_string(&self) -> String {
        match self {
            PropertyValue::String(s) => s.clone(),
            PropertyValue::Int64(i) => i.to_string(),
            PropertyValue::Double(f) => f.to_string(),
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::DateTime(dt) => dt.to_rfc3339(),
            PropertyValue::Serialized(s) => s.clone(),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Int64(i)
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Int64(i as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Double(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(dt: DateTime<Utc>) -> Self {
        PropertyValue::DateTime(dt)
    }
}
