//! Store operation contract for elastore.
//!
//! The schema/model layer never talks to a search backend directly. It
//! issues a narrow set of abstract operations through [`StoreAdapter`]:
//! get/index/update/delete single records, delete-by-query, search, count,
//! refresh and mapping removal. Any client (an Elasticsearch HTTP client, a
//! test double) can back the contract.
//!
//! [`MemoryStore`] is the in-process reference implementation. It keeps a
//! separate search-visible snapshot per collection so that immediate
//! visibility (`WriteOptions::immediate`) and explicit refreshes behave the
//! way they do against a real index.

mod adapter;
mod error;
mod memory;
mod query;

pub use adapter::{CollectionOptions, SearchHits, SearchOptions, StoreAdapter, StoredRecord, WriteOptions};
pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, Operation};
pub use query::{Condition, Query, Term};
