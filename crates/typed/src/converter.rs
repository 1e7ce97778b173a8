//! Keys converters
//!
//! A [`KeysConverter`] owns the mapping between a record type and table
//! rows: which keys a record is stored under and how typed keys passed to
//! lookups become the stored strings.

use crate::codec::{entity_to_record, property_key, record_to_entity};
use crate::keys::KeyMapper;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::marker::PhantomData;
use tessera_core::{Result, TableEntity};

/// Converts records of type `T` to rows and typed keys to key strings
pub trait KeysConverter<T, PK, RK>: Send + Sync {
    /// Row for a record, keys included
    fn to_entity(&self, record: &T) -> Result<TableEntity>;

    /// Record for a row
    fn from_entity(&self, entity: TableEntity) -> Result<T>;

    /// Stored partition key for a typed partition key
    fn partition_key(&self, key: &PK) -> String;

    /// Stored row key for a typed row key
    fn row_key(&self, key: &RK) -> String;
}

/// Keys taken from two named properties of the record
///
/// Typed keys are formatted with `Display`.
pub struct SimpleKeysConverter<T, PK, RK> {
    partition_property: String,
    row_property: String,
    _marker: PhantomData<fn() -> (T, PK, RK)>,
}

impl<T, PK, RK> SimpleKeysConverter<T, PK, RK> {
    /// Create a converter keyed on `partition_property` and `row_property`
    pub fn new(partition_property: impl Into<String>, row_property: impl Into<String>) -> Self {
        Self {
            partition_property: partition_property.into(),
            row_property: row_property.into(),
            _marker: PhantomData,
        }
    }
}

impl<T, PK, RK> KeysConverter<T, PK, RK> for SimpleKeysConverter<T, PK, RK>
where
    T: Serialize + DeserializeOwned,
    PK: Display,
    RK: Display,
{
    fn to_entity(&self, record: &T) -> Result<TableEntity> {
        let partition_key = property_key(record, &self.partition_property)?;
        let row_key = property_key(record, &self.row_property)?;
        record_to_entity(record, partition_key, row_key)
    }

    fn from_entity(&self, entity: TableEntity) -> Result<T> {
        let partition_key = entity.partition_key.clone();
        let row_key = entity.row_key.clone();
        entity_to_record(
            entity,
            &[
                (self.partition_property.as_str(), partition_key.as_str()),
                (self.row_property.as_str(), row_key.as_str()),
            ],
        )
    }

    fn partition_key(&self, key: &PK) -> String {
        key.to_string()
    }

    fn row_key(&self, key: &RK) -> String {
        key.to_string()
    }
}

/// Keys produced by a pair of [`KeyMapper`]s
pub struct CalculatedKeysConverter<T, PK, RK> {
    partition: KeyMapper<T, PK>,
    row: KeyMapper<T, RK>,
}

impl<T, PK, RK> CalculatedKeysConverter<T, PK, RK> {
    /// Create a converter from a partition mapper and a row mapper
    pub fn new(partition: KeyMapper<T, PK>, row: KeyMapper<T, RK>) -> Self {
        Self { partition, row }
    }
}

impl<T, PK, RK> KeysConverter<T, PK, RK> for CalculatedKeysConverter<T, PK, RK>
where
    T: Serialize + DeserializeOwned,
{
    fn to_entity(&self, record: &T) -> Result<TableEntity> {
        let partition_key = self.partition.to_key(record)?;
        let row_key = self.row.to_key(record)?;
        record_to_entity(record, partition_key, row_key)
    }

    fn from_entity(&self, entity: TableEntity) -> Result<T> {
        let partition_key = entity.partition_key.clone();
        let row_key = entity.row_key.clone();
        let mut key_columns = Vec::with_capacity(2);
        if let Some(column) = self.partition.key_property() {
            key_columns.push((column, partition_key.as_str()));
        }
        if let Some(column) = self.row.key_property() {
            key_columns.push((column, row_key.as_str()));
        }
        entity_to_record(entity, &key_columns)
    }

    fn partition_key(&self, key: &PK) -> String {
        self.partition.key_from_parameter(key)
    }

    fn row_key(&self, key: &RK) -> String {
        self.row.key_from_parameter(key)
    }
}
