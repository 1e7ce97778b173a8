//! Key mapping
//!
//! A [`KeyMapper`] turns a record (or a typed key supplied by a caller)
//! into the string key stored in the table. Four kinds exist:
//!
//! - property: the key is one property of the record
//! - fixed: every record shares one constant key
//! - calculated: arbitrary closures over the record and the typed key
//! - sequential: a time-ordered key generated at write time

use crate::codec::property_key;
use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use std::fmt::{self, Display};
use std::sync::Arc;
use tessera_core::Result;

/// .NET-style ticks (100ns) between 0001-01-01 and the Unix epoch
const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Ticks of 9999-12-31T23:59:59.9999999
const MAX_TICKS: i64 = 3_155_378_975_999_999_999;

type ToKey<T> = Arc<dyn Fn(&T) -> Result<String> + Send + Sync>;
type FromParameter<K> = Arc<dyn Fn(&K) -> String + Send + Sync>;

/// Maps records and typed keys of type `K` to string keys
pub struct KeyMapper<T, K> {
    to_key: ToKey<T>,
    from_parameter: FromParameter<K>,
    key_property: Option<String>,
}

impl<T, K> KeyMapper<T, K> {
    /// Key computed by closures
    ///
    /// `to_key` derives the key from a record, `from_parameter` from a
    /// typed key passed to a lookup. Both must agree.
    pub fn calculated(
        to_key: impl Fn(&T) -> String + Send + Sync + 'static,
        from_parameter: impl Fn(&K) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            to_key: Arc::new(move |record| Ok(to_key(record))),
            from_parameter: Arc::new(from_parameter),
            key_property: None,
        }
    }

    /// The same key for every record
    pub fn fixed(key: impl Into<String>) -> Self {
        let key = key.into();
        let param_key = key.clone();
        Self {
            to_key: Arc::new(move |_| Ok(key.clone())),
            from_parameter: Arc::new(move |_| param_key.clone()),
            key_property: None,
        }
    }

    /// A new time-ordered key on every call
    ///
    /// With `reverse` set, newer keys sort first.
    pub fn sequential(reverse: bool) -> Self {
        Self {
            to_key: Arc::new(move |_| Ok(sequential_key(reverse))),
            from_parameter: Arc::new(move |_| sequential_key(reverse)),
            key_property: None,
        }
    }

    /// Key for a record
    pub fn to_key(&self, record: &T) -> Result<String> {
        (self.to_key)(record)
    }

    /// Key for a typed key value
    pub fn key_from_parameter(&self, key: &K) -> String {
        (self.from_parameter)(key)
    }

    /// Property the key was taken from, if any
    pub fn key_property(&self) -> Option<&str> {
        self.key_property.as_deref()
    }
}

impl<T: Serialize, K: Display> KeyMapper<T, K> {
    /// Key read from a named property of the record
    pub fn property(name: impl Into<String>) -> Self {
        let name = name.into();
        let column = name.clone();
        Self {
            to_key: Arc::new(move |record| property_key(record, &column)),
            from_parameter: Arc::new(|key| key.to_string()),
            key_property: Some(name),
        }
    }
}

impl<T, K> Clone for KeyMapper<T, K> {
    fn clone(&self) -> Self {
        Self {
            to_key: Arc::clone(&self.to_key),
            from_parameter: Arc::clone(&self.from_parameter),
            key_property: self.key_property.clone(),
        }
    }
}

impl<T, K> fmt::Debug for KeyMapper<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMapper")
            .field("key_property", &self.key_property)
            .finish_non_exhaustive()
    }
}

/// Generate a sequential key: 20-digit tick count plus a random suffix
///
/// Ticks count 100ns intervals since 0001-01-01. Reversed keys count down
/// from the largest representable instant.
pub fn sequential_key(reverse: bool) -> String {
    let now = Utc::now();
    let ticks = UNIX_EPOCH_TICKS
        + now.timestamp() * 10_000_000
        + i64::from(now.timestamp_subsec_nanos() / 100);
    let sequence = if reverse { MAX_TICKS - ticks } else { ticks };
    let suffix: u32 = rand::thread_rng().gen_range(0..9999);
    format!("{:020}.{}", sequence, suffix)
}
