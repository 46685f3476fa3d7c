//! In-memory store adapter.
//!
//! Each collection keeps two views per category: `live` receives every
//! write, `visible` is what search and count see. A refresh copies live
//! into visible, the same split a near-real-time search index has.
//! `get_record` reads live data.

use crate::adapter::{
    CollectionOptions, SearchHits, SearchOptions, StoreAdapter, StoredRecord, WriteOptions,
};
use crate::error::{StoreError, StoreResult};
use crate::query::Query;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// The operations of the store contract, used for the call log and for
/// failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CollectionExists,
    CreateCollection,
    GetRecord,
    IndexRecord,
    UpdateRecord,
    DeleteRecord,
    DeleteByQuery,
    Search,
    Count,
    RefreshCollection,
    DeleteMapping,
}

impl Operation {
    /// Whether the operation modifies stored records.
    pub fn is_write(self) -> bool {
        matches!(
            self,
            Operation::IndexRecord
                | Operation::UpdateRecord
                | Operation::DeleteRecord
                | Operation::DeleteByQuery
                | Operation::DeleteMapping
        )
    }
}

type Category = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Default)]
struct Collection {
    options: CollectionOptions,
    live: HashMap<String, Category>,
    visible: HashMap<String, Category>,
}

impl Collection {
    fn refresh(&mut self) {
        self.visible = self.live.clone();
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: HashMap<String, Collection>,
    failures: HashMap<Operation, String>,
    log: Vec<Operation>,
    next_id: u64,
}

/// A `StoreAdapter` backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Creates an empty store with no collections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call of `operation` fail with a backend error
    /// until [`MemoryStore::clear_failures`] is called.
    pub fn fail_operation(&self, operation: Operation, message: impl Into<String>) {
        self.state().failures.insert(operation, message.into());
    }

    /// Removes all injected failures.
    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Every operation issued so far, in call order.
    pub fn operations(&self) -> Vec<Operation> {
        self.state().log.clone()
    }

    /// Number of write operations issued so far.
    pub fn write_count(&self) -> usize {
        self.state().log.iter().filter(|op| op.is_write()).count()
    }

    /// Options the collection was created with, if it exists.
    pub fn collection_options(&self, collection: &str) -> Option<CollectionOptions> {
        self.state()
            .collections
            .get(collection)
            .map(|c| c.options.clone())
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Logs the call and applies any injected failure.
    fn begin(&self, operation: Operation) -> StoreResult<MutexGuard<'_, MemoryState>> {
        let mut state = self.state();
        state.log.push(operation);
        if let Some(message) = state.failures.get(&operation) {
            return Err(StoreError::Backend(message.clone()));
        }
        Ok(state)
    }
}

fn not_found(collection: &str, category: &str, id: &str) -> StoreError {
    StoreError::NotFound {
        collection: collection.to_string(),
        category: category.to_string(),
        id: id.to_string(),
    }
}

/// Deep-merges `patch` into `target`: objects merge key by key, anything
/// else replaces.
fn merge(target: &mut serde_json::Value, patch: serde_json::Value) {
    match (target, patch) {
        (serde_json::Value::Object(target), serde_json::Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

#[async_trait]
impl StoreAdapter for MemoryStore {
    async fn collection_exists(&self, collection: &str) -> StoreResult<bool> {
        let state = self.begin(Operation::CollectionExists)?;
        Ok(state.collections.contains_key(collection))
    }

    async fn create_collection(
        &self,
        collection: &str,
        options: &CollectionOptions,
    ) -> StoreResult<()> {
        let mut state = self.begin(Operation::CreateCollection)?;
        debug!("Creating collection {}", collection);
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .options = options.clone();
        Ok(())
    }

    async fn get_record(
        &self,
        collection: &str,
        category: &str,
        id: &str,
    ) -> StoreResult<StoredRecord> {
        let state = self.begin(Operation::GetRecord)?;
        state
            .collections
            .get(collection)
            .and_then(|c| c.live.get(category))
            .and_then(|records| records.get(id))
            .map(|source| StoredRecord {
                id: id.to_string(),
                source: source.clone(),
            })
            .ok_or_else(|| not_found(collection, category, id))
    }

    async fn index_record(
        &self,
        collection: &str,
        category: &str,
        id: Option<&str>,
        body: serde_json::Value,
        options: WriteOptions,
    ) -> StoreResult<String> {
        let mut state = self.begin(Operation::IndexRecord)?;

        let id = match id {
            Some(id) => id.to_string(),
            None => {
                state.next_id += 1;
                format!("auto-{:012}", state.next_id)
            }
        };

        // Indexing into a missing collection creates it.
        let target = state.collections.entry(collection.to_string()).or_default();
        target
            .live
            .entry(category.to_string())
            .or_default()
            .insert(id.clone(), body);

        if options.immediate {
            target.refresh();
        }

        debug!("Indexed {}/{}/{}", collection, category, id);
        Ok(id)
    }

    async fn update_record(
        &self,
        collection: &str,
        category: &str,
        id: &str,
        partial: serde_json::Value,
        options: WriteOptions,
    ) -> StoreResult<()> {
        let mut state = self.begin(Operation::UpdateRecord)?;
        let target = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| not_found(collection, category, id))?;

        let existing = target
            .live
            .get_mut(category)
            .and_then(|records| records.get_mut(id))
            .ok_or_else(|| not_found(collection, category, id))?;
        merge(existing, partial);

        if options.immediate {
            target.refresh();
        }
        Ok(())
    }

    async fn delete_record(
        &self,
        collection: &str,
        category: &str,
        id: &str,
        options: WriteOptions,
    ) -> StoreResult<()> {
        let mut state = self.begin(Operation::DeleteRecord)?;
        let target = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| not_found(collection, category, id))?;

        target
            .live
            .get_mut(category)
            .and_then(|records| records.remove(id))
            .ok_or_else(|| not_found(collection, category, id))?;

        if options.immediate {
            target.refresh();
        }
        Ok(())
    }

    async fn delete_by_query(
        &self,
        collection: &str,
        category: &str,
        query: &Query,
    ) -> StoreResult<u64> {
        let mut state = self.begin(Operation::DeleteByQuery)?;
        let target = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        let mut deleted = 0;
        if let Some(records) = target.live.get_mut(category) {
            let before = records.len();
            records.retain(|_, source| !query.matches(source));
            deleted = (before - records.len()) as u64;
        }

        target.refresh();
        debug!("Deleted {} records from {}/{}", deleted, collection, category);
        Ok(deleted)
    }

    async fn search(
        &self,
        collection: &str,
        category: &str,
        query: &Query,
        options: SearchOptions,
    ) -> StoreResult<SearchHits> {
        let state = self.begin(Operation::Search)?;
        let target = state
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        let Some(records) = target.visible.get(category) else {
            return Ok(SearchHits::default());
        };

        let matched: Vec<_> = records
            .iter()
            .filter(|(_, source)| query.matches(source))
            .collect();

        let hits = matched
            .iter()
            .skip(options.skip)
            .take(options.limit)
            .map(|(id, source)| StoredRecord {
                id: (*id).clone(),
                source: (*source).clone(),
            })
            .collect();

        Ok(SearchHits {
            total: matched.len() as u64,
            hits,
        })
    }

    async fn count(&self, collection: &str, category: &str) -> StoreResult<u64> {
        let state = self.begin(Operation::Count)?;
        let target = state
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        Ok(target.visible.get(category).map_or(0, |r| r.len() as u64))
    }

    async fn refresh_collection(&self, collection: &str) -> StoreResult<()> {
        let mut state = self.begin(Operation::RefreshCollection)?;
        state
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?
            .refresh();
        Ok(())
    }

    async fn delete_mapping(&self, collection: &str, category: &str) -> StoreResult<()> {
        let mut state = self.begin(Operation::DeleteMapping)?;
        let target = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        if target.live.remove(category).is_none() {
            return Err(StoreError::MappingNotFound {
                collection: collection.to_string(),
                category: category.to_string(),
            });
        }
        target.visible.remove(category);
        Ok(())
    }
}
