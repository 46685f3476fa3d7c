//! The abstract store contract.

use crate::error::StoreResult;
use crate::query::Query;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Options used when a collection is created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionOptions {
    /// Backend-specific settings, passed through untouched.
    #[serde(default)]
    pub settings: serde_json::Value,
}

/// Visibility options for single-record writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Make the write visible to search before the call returns.
    pub immediate: bool,
}

impl WriteOptions {
    /// Write and refresh so the record is searchable right away.
    pub fn immediate() -> Self {
        Self { immediate: true }
    }
}

/// Paging for searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub limit: usize,
    pub skip: usize,
}

/// A record as returned by the store: its id plus the stored body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub source: serde_json::Value,
}

/// Search result page.
#[derive(Debug, Clone, Default)]
pub struct SearchHits {
    /// Total number of matches, ignoring paging.
    pub total: u64,
    /// Matches in store order, after paging.
    pub hits: Vec<StoredRecord>,
}

/// Abstract document store.
///
/// `collection` is the index all entity types of one connection share;
/// `category` is the record type within it (one per entity type).
#[async_trait]
pub trait StoreAdapter: Send + Sync {
    /// Returns whether the collection exists.
    async fn collection_exists(&self, collection: &str) -> StoreResult<bool>;

    /// Creates the collection.
    async fn create_collection(
        &self,
        collection: &str,
        options: &CollectionOptions,
    ) -> StoreResult<()>;

    /// Fetches one record. Fails with `StoreError::NotFound` when absent.
    async fn get_record(
        &self,
        collection: &str,
        category: &str,
        id: &str,
    ) -> StoreResult<StoredRecord>;

    /// Creates or replaces a record. When `id` is `None` the store assigns
    /// one. Returns the record id.
    async fn index_record(
        &self,
        collection: &str,
        category: &str,
        id: Option<&str>,
        body: serde_json::Value,
        options: WriteOptions,
    ) -> StoreResult<String>;

    /// Merges `partial` into an existing record.
    async fn update_record(
        &self,
        collection: &str,
        category: &str,
        id: &str,
        partial: serde_json::Value,
        options: WriteOptions,
    ) -> StoreResult<()>;

    /// Deletes one record.
    async fn delete_record(
        &self,
        collection: &str,
        category: &str,
        id: &str,
        options: WriteOptions,
    ) -> StoreResult<()>;

    /// Deletes every record of `category` matching `query`. Returns the
    /// number of deleted records.
    async fn delete_by_query(
        &self,
        collection: &str,
        category: &str,
        query: &Query,
    ) -> StoreResult<u64>;

    /// Searches the category.
    async fn search(
        &self,
        collection: &str,
        category: &str,
        query: &Query,
        options: SearchOptions,
    ) -> StoreResult<SearchHits>;

    /// Counts every search-visible record of the category.
    async fn count(&self, collection: &str, category: &str) -> StoreResult<u64>;

    /// Makes all writes to the collection visible to search.
    async fn refresh_collection(&self, collection: &str) -> StoreResult<()>;

    /// Removes the category and its records from the collection.
    async fn delete_mapping(&self, collection: &str, category: &str) -> StoreResult<()>;
}
