//! Record <-> row conversion
//!
//! Records go through `serde_json::Value`. Top-level scalar fields become
//! typed columns; nested arrays and objects are stored as JSON text in a
//! `Serialized` column. `null` fields are not written at all.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use tessera_core::{PropertyValue, Result, StoreError, TableEntity};

/// Serialize a record into a row with the given keys
pub fn record_to_entity<T: Serialize>(
    record: &T,
    partition_key: String,
    row_key: String,
) -> Result<TableEntity> {
    let mut entity = TableEntity::new(partition_key, row_key);
    for (name, value) in record_fields(record)? {
        if let Some(value) = column_value(value) {
            entity.properties.insert(name, value);
        }
    }
    Ok(entity)
}

/// Rebuild a record from a row
///
/// `key_columns` lists `(property, key)` pairs for properties the keys were
/// taken from. A property missing from the row is filled from its key:
/// numeric and boolean keys are tried in their typed form first, then as
/// plain strings.
pub fn entity_to_record<T: DeserializeOwned>(
    entity: TableEntity,
    key_columns: &[(&str, &str)],
) -> Result<T> {
    let mut fields = Map::with_capacity(entity.properties.len() + key_columns.len());
    for (name, value) in entity.properties {
        fields.insert(name, json_value(value));
    }
    let missing: Vec<(&str, &str)> = key_columns
        .iter()
        .filter(|(column, _)| !fields.contains_key(*column))
        .copied()
        .collect();

    let mut typed = fields.clone();
    let mut guessed = false;
    for (column, key) in &missing {
        let value = key_value(key);
        guessed |= !value.is_string();
        typed.insert((*column).to_string(), value);
    }
    match serde_json::from_value(Value::Object(typed)) {
        Ok(record) => Ok(record),
        Err(e) if !guessed => Err(e.into()),
        Err(_) => {
            for (column, key) in missing {
                fields.insert(column.to_string(), Value::String(key.to_string()));
            }
            Ok(serde_json::from_value(Value::Object(fields))?)
        }
    }
}

/// A key string as the scalar it most likely came from
fn key_value(key: &str) -> Value {
    match serde_json::from_str::<Value>(key) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => value,
        _ => Value::String(key.to_string()),
    }
}

/// Read one property of a record as a key string
pub fn property_key<T: Serialize>(record: &T, property: &str) -> Result<String> {
    let mut fields = record_fields(record)?;
    match fields.remove(property) {
        Some(Value::Null) | None => Err(StoreError::InvalidKey(format!(
            "record has no value for key property '{}'",
            property
        ))),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Ok(other.to_string()),
    }
}

fn record_fields<T: Serialize>(record: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::Serialization(format!(
            "record must serialize to an object, got {}",
            kind(&other)
        ))),
    }
}

fn column_value(value: Value) -> Option<PropertyValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(PropertyValue::Bool(b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(PropertyValue::Int64(i)),
            None => n.as_f64().map(PropertyValue::Double),
        },
        Value::String(s) => Some(PropertyValue::String(s)),
        nested @ (Value::Array(_) | Value::Object(_)) => {
            Some(PropertyValue::Serialized(nested.to_string()))
        }
    }
}

fn json_value(value: PropertyValue) -> Value {
    match value {
        PropertyValue::String(s) => Value::String(s),
        PropertyValue::Int64(i) => Value::Number(i.into()),
        PropertyValue::Double(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        PropertyValue::Bool(b) => Value::Bool(b),
        PropertyValue::DateTime(dt) => Value::String(dt.to_rfc3339()),
        PropertyValue::Serialized(text) => {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
