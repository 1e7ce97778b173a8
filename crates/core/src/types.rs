//! Core row types
//!
//! This module defines the fundamental types used throughout the system:
//! - [`TableEntity`]: one row of a table, addressed by partition and row key
//! - [`EntityKey`]: the (partition key, row key) address of a row
//! - [`ETag`]: optimistic concurrency tag assigned by the table service

use crate::value::PropertyValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Wildcard etag: matches any stored version
pub const WILDCARD_ETAG: &str = "*";

/// Optimistic concurrency tag of a stored row
///
/// Assigned by the table service on every write. Updates and deletes that
/// carry an etag only succeed when it matches the stored one, unless the
/// etag is the wildcard `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ETag(String);

impl ETag {
    /// Create an etag from raw text
    pub fn new(tag: impl Into<String>) -> Self {
        ETag(tag.into())
    }

    /// The wildcard etag
    pub fn wildcard() -> Self {
        ETag(WILDCARD_ETAG.to_string())
    }

    /// Build the etag for a given stored version
    pub fn from_version(version: u64) -> Self {
        ETag(format!("W/\"{}\"", version))
    }

    /// Check whether this is the wildcard etag
    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD_ETAG
    }

    /// Whether this etag permits writing over a row stored with `stored`
    pub fn matches(&self, stored: &ETag) -> bool {
        self.is_wildcard() || self == stored
    }

    /// Raw etag text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address of a row: (partition key, row key)
///
/// Ordering is partition key first, then row key, which is the scan order
/// of every table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    /// Partition key
    pub partition_key: String,
    /// Row key, unique within the partition
    pub row_key: String,
}

impl EntityKey {
    /// Create a new entity key
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        EntityKey {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.partition_key, self.row_key)
    }
}

/// One row of a table
///
/// Rows are schemaless: apart from the two key columns every property is
/// stored in `properties`. The service fills `etag` and `timestamp` on
/// write; callers may leave them empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntity {
    /// Partition key
    pub partition_key: String,
    /// Row key
    pub row_key: String,
    /// Concurrency tag, `None` for rows that were never stored
    pub etag: Option<ETag>,
    /// Last-modified time assigned by the service
    pub timestamp: Option<DateTime<Utc>>,
    /// Named properties
    pub properties: BTreeMap<String, PropertyValue>,
}

impl TableEntity {
    /// Create an empty row with the given keys
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        TableEntity {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            etag: None,
            timestamp: None,
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property setter
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Builder-style etag setter
    pub fn with_etag(mut self, etag: ETag) -> Self {
        self.etag = Some(etag);
        self
    }

    /// The (partition key, row key) address of this row
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.partition_key.clone(), self.row_key.clone())
    }

    /// Get a property by name
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}
