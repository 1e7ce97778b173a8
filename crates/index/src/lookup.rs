//! Reads through a named index
//!
//! Typed-key lookups resolve the concrete `TypedTableStore<T, IPK, IRK>`
//! registered under the name and use its key mapping; asking with the
//! wrong key types yields `IndexTypeMismatch`. The `_raw` variants take
//! stored key strings and work with any [`IndexStore`].
//!
//! An unknown name is `IndexNotFound`. A key with no record is `Ok(None)`
//! or an empty result.

use crate::error::Result;
use crate::indexes::Indexes;
use crate::store::IndexStore;
use std::sync::Arc;
use tessera_core::PagedResult;
use tessera_typed::TypedTableStore;

impl<'a, T, PK, RK> Indexes<'a, T, PK, RK>
where
    T: Clone + Send + Sync + 'static,
    PK: Send + Sync + 'static,
    RK: Send + Sync + 'static,
{
    /// The typed index store registered under `name`
    ///
    /// Writes made through it are not propagated anywhere.
    pub fn index<IPK, IRK>(&self, name: &str) -> Result<Arc<TypedTableStore<T, IPK, IRK>>>
    where
        IPK: Send + Sync + 'static,
        IRK: Send + Sync + 'static,
    {
        self.registry.resolve_concrete(name)
    }

    /// The index store registered under `name`, without its key types
    pub fn index_store(&self, name: &str) -> Result<Arc<dyn IndexStore<T>>> {
        self.registry.resolve(name)
    }

    // ========================================================================
    // Point reads
    // ========================================================================

    /// Record by typed index keys
    pub fn get_record_by_index<IPK, IRK>(
        &self,
        name: &str,
        partition_key: &IPK,
        row_key: &IRK,
    ) -> Result<Option<T>>
    where
        IPK: Send + Sync + 'static,
        IRK: Send + Sync + 'static,
    {
        Ok(self
            .index::<IPK, IRK>(name)?
            .get_record(partition_key, row_key)?)
    }

    /// Record by stored index keys
    pub fn get_record_by_index_raw(
        &self,
        name: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<T>> {
        Ok(self.index_store(name)?.get_record(partition_key, row_key)?)
    }

    /// Async version of `get_record_by_index()`
    pub async fn get_record_by_index_async<IPK, IRK>(
        &self,
        name: &str,
        partition_key: &IPK,
        row_key: &IRK,
    ) -> Result<Option<T>>
    where
        IPK: Send + Sync + 'static,
        IRK: Send + Sync + 'static,
    {
        let index = self.index::<IPK, IRK>(name)?;
        Ok(index.get_record_async(partition_key, row_key).await?)
    }

    /// Async version of `get_record_by_index_raw()`
    pub async fn get_record_by_index_raw_async(
        &self,
        name: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<T>> {
        let index = self.index_store(name)?;
        Ok(index.get_record_async(partition_key, row_key).await?)
    }

    // ========================================================================
    // Partition reads
    // ========================================================================

    /// All records under a typed index partition key
    ///
    /// `IRK` names the index's row key type and usually needs a turbofish.
    pub fn get_by_index_partition_key<IPK, IRK>(
        &self,
        name: &str,
        partition_key: &IPK,
    ) -> Result<Vec<T>>
    where
        IPK: Send + Sync + 'static,
        IRK: Send + Sync + 'static,
    {
        Ok(self
            .index::<IPK, IRK>(name)?
            .get_by_partition_key(partition_key)?)
    }

    /// All records under a stored index partition key
    pub fn get_by_index_partition_key_raw(
        &self,
        name: &str,
        partition_key: &str,
    ) -> Result<Vec<T>> {
        Ok(self.index_store(name)?.get_by_partition_key(partition_key)?)
    }

    /// Async version of `get_by_index_partition_key()`
    pub async fn get_by_index_partition_key_async<IPK, IRK>(
        &self,
        name: &str,
        partition_key: &IPK,
    ) -> Result<Vec<T>>
    where
        IPK: Send + Sync + 'static,
        IRK: Send + Sync + 'static,
    {
        let index = self.index::<IPK, IRK>(name)?;
        Ok(index.get_by_partition_key_async(partition_key).await?)
    }

    /// Async version of `get_by_index_partition_key_raw()`
    pub async fn get_by_index_partition_key_raw_async(
        &self,
        name: &str,
        partition_key: &str,
    ) -> Result<Vec<T>> {
        let index = self.index_store(name)?;
        Ok(index.get_by_partition_key_async(partition_key).await?)
    }

    /// One page of records under a typed index partition key
    pub fn get_by_index_partition_key_paged<IPK, IRK>(
        &self,
        name: &str,
        partition_key: &IPK,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<T>>
    where
        IPK: Send + Sync + 'static,
        IRK: Send + Sync + 'static,
    {
        Ok(self.index::<IPK, IRK>(name)?.get_by_partition_key_paged(
            partition_key,
            page_size,
            continuation_token,
        )?)
    }

    /// One page of records under a stored index partition key
    pub fn get_by_index_partition_key_paged_raw(
        &self,
        name: &str,
        partition_key: &str,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<T>> {
        Ok(self.index_store(name)?.get_by_partition_key_paged(
            partition_key,
            page_size,
            continuation_token,
        )?)
    }

    /// Async version of `get_by_index_partition_key_paged()`
    pub async fn get_by_index_partition_key_paged_async<IPK, IRK>(
        &self,
        name: &str,
        partition_key: &IPK,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<T>>
    where
        IPK: Send + Sync + 'static,
        IRK: Send + Sync + 'static,
    {
        let index = self.index::<IPK, IRK>(name)?;
        Ok(index
            .get_by_partition_key_paged_async(partition_key, page_size, continuation_token)
            .await?)
    }

    /// Async version of `get_by_index_partition_key_paged_raw()`
    pub async fn get_by_index_partition_key_paged_raw_async(
        &self,
        name: &str,
        partition_key: &str,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<T>> {
        let index = self.index_store(name)?;
        Ok(index
            .get_by_partition_key_paged_async(partition_key, page_size, continuation_token)
            .await?)
    }
}
