//! Paged query results and continuation tokens
//!
//! A continuation token is an opaque string to callers. Internally it is
//! the JSON form of [`ContinuationToken`]: the key of the first row that
//! was not returned.

use crate::error::{Result, StoreError};
use crate::types::EntityKey;
use serde::{Deserialize, Serialize};

/// Position in a paged scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuationToken {
    /// Partition key of the next row to return
    pub next_partition_key: String,
    /// Row key of the next row to return
    pub next_row_key: String,
}

impl ContinuationToken {
    /// Token pointing at the given row
    pub fn at(key: &EntityKey) -> Self {
        ContinuationToken {
            next_partition_key: key.partition_key.clone(),
            next_row_key: key.row_key.clone(),
        }
    }

    /// Encode for handing to callers
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a token previously produced by [`ContinuationToken::encode`]
    pub fn decode(token: &str) -> Result<Self> {
        serde_json::from_str(token)
            .map_err(|e| StoreError::InvalidContinuationToken(format!("{}: {}", token, e)))
    }

    /// Row key this token resumes at
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.next_partition_key.clone(), self.next_row_key.clone())
    }
}

/// One page of a scan
#[derive(Debug, Clone, PartialEq)]
pub struct PagedResult<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Token for the next page, `None` on the final page
    pub continuation_token: Option<String>,
    /// Whether this is the last page
    pub is_final_page: bool,
}

impl<T> PagedResult<T> {
    /// Build a page; `is_final_page` follows from the token
    pub fn new(items: Vec<T>, continuation_token: Option<String>) -> Self {
        let is_final_page = continuation_token.is_none();
        PagedResult {
            items,
            continuation_token,
            is_final_page,
        }
    }

    /// An empty final page
    pub fn empty() -> Self {
        Self::new(Vec::new(), None)
    }

    /// Convert every item, keeping the paging state
    pub fn try_map<U, E>(
        self,
        f: impl FnMut(T) -> std::result::Result<U, E>,
    ) -> std::result::Result<PagedResult<U>, E> {
        let items = self
            .items
            .into_iter()
            .map(f)
            .collect::<std::result::Result<Vec<_>, E>>()?;
        Ok(PagedResult {
            items,
            continuation_token: self.continuation_token,
            is_final_page: self.is_final_page,
        })
    }

    /// Drop items that fail `filter`, keeping the paging state
    ///
    /// The page may end up shorter than the requested page size; the
    /// continuation token still resumes after the last scanned row.
    pub fn filter(mut self, filter: impl Fn(&T) -> bool) -> Self {
        self.items.retain(|item| filter(item));
        self
    }

    /// Number of items on this page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the page holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
