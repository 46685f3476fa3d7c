//! Models: the entity lifecycle against a store.
//!
//! A [`Model`] binds a name, a record category, a [`Schema`] and a store
//! adapter. Every write is issued with immediate visibility, runs the
//! schema's hooks around the store call, and broadcasts a [`ModelEvent`]
//! once the store accepted it.

use crate::connection::ConnectionConfig;
use crate::document::{Document, DocumentInput};
use crate::error::{DomainError, ModelError, ModelResult};
use crate::events::ModelEvent;
use crate::filter::{Filter, FindOptions, SortOrder};
use crate::hooks::{
    AFTER_REMOVE, AFTER_SAVE, BEFORE_REMOVE, BEFORE_SAVE, Hook, HookContext, HookKind, HookPhase,
    HookRegistry, event_name,
};
use crate::schema::{ID_PATH, Schema};
use elastore_store::{Query, SearchOptions, StoreAdapter, StoredRecord, WriteOptions};
use elastore_types::{Record, Value};
use futures::future::try_join_all;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, warn};

pub(crate) struct ModelInner {
    pub(crate) name: String,
    pub(crate) category: String,
    pub(crate) schema: Schema,
    pub(crate) store: Arc<dyn StoreAdapter>,
    pub(crate) config: Arc<ConnectionConfig>,
    pub(crate) hooks: HookRegistry,
    pub(crate) events: broadcast::Sender<ModelEvent>,
    pub(crate) context: RwLock<serde_json::Value>,
}

/// A named entity type bound to a store. Cheap to clone.
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

impl Model {
    /// Creates a model whose category is the lowercased name.
    pub fn new(
        name: &str,
        schema: Schema,
        store: Arc<dyn StoreAdapter>,
        config: Arc<ConnectionConfig>,
    ) -> Self {
        Self::with_category(name, &name.to_lowercase(), schema, store, config)
    }

    pub fn with_category(
        name: &str,
        category: &str,
        mut schema: Schema,
        store: Arc<dyn StoreAdapter>,
        config: Arc<ConnectionConfig>,
    ) -> Self {
        schema.ensure_identifier();

        let hooks = HookRegistry::default();
        for phase in [HookPhase::Pre, HookPhase::Post] {
            for kind in [HookKind::Save, HookKind::Remove] {
                for hook in schema.hooks(phase, kind) {
                    hooks.add(event_name(phase, kind), hook.clone());
                }
            }
        }

        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        Self {
            inner: Arc::new(ModelInner {
                name: name.to_string(),
                category: category.to_string(),
                schema,
                store,
                config,
                hooks,
                events,
                context: RwLock::new(serde_json::Value::Null),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<ModelInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &Arc<ModelInner> {
        &self.inner
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Record category used in the store.
    pub fn category(&self) -> &str {
        &self.inner.category
    }

    pub fn collection(&self) -> &str {
        &self.inner.config.collection
    }

    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    pub fn store(&self) -> &Arc<dyn StoreAdapter> {
        &self.inner.store
    }

    /// Attaches application data passed to every hook.
    pub fn set_context(&self, app: serde_json::Value) {
        *self
            .inner
            .context
            .write()
            .unwrap_or_else(PoisonError::into_inner) = app;
    }

    pub fn hook_context(&self) -> HookContext {
        HookContext {
            model: self.inner.name.clone(),
            category: self.inner.category.clone(),
            collection: self.inner.config.collection.clone(),
            app: self
                .inner
                .context
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    /// Receives every write completed after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ModelEvent> {
        self.inner.events.subscribe()
    }

    // ── Documents ───────────────────────────────────────────────────

    /// Builds a document: runs getters (casts, defaults, virtuals, a fresh
    /// `_id`) and rejects data missing a required path. A document input is
    /// returned as-is, bound to this model.
    pub fn new_document(&self, input: impl Into<DocumentInput>) -> ModelResult<Document> {
        let input: DocumentInput = input.into();
        match input {
            DocumentInput::Document(doc) => {
                Ok(Document::bound(doc.into_data(), Arc::downgrade(&self.inner)))
            }
            other => self.build(other.into_record()?),
        }
    }

    fn build(&self, mut data: Record) -> ModelResult<Document> {
        self.inner.schema.apply_getters(&mut data)?;
        if let Some(path) = self.inner.schema.missing_required(&data) {
            return Err(DomainError::RequiredPathMissing(path.to_string()).into());
        }
        Ok(Document::bound(data, Arc::downgrade(&self.inner)))
    }

    /// Store record to document: import, then construction. The record id
    /// always wins over any `_id` in the body.
    fn hydrate(&self, record: StoredRecord) -> ModelResult<Document> {
        let mut data = Value::record_from_json(record.source)?;
        data.insert(ID_PATH.to_string(), Value::String(record.id));
        self.inner.schema.apply_import(&mut data);
        self.build(data)
    }

    /// The persisted form: a validated, exported copy. The document itself
    /// is not modified.
    pub fn serialize(&self, doc: &Document) -> ModelResult<serde_json::Value> {
        let mut record = doc.to_object();
        self.inner.schema.apply_setters(&mut record)?;
        self.inner.schema.apply_export(&mut record);
        Ok(Value::record_to_json(&record))
    }

    // ── Hooks ───────────────────────────────────────────────────────

    /// Appends a hook to a named event.
    pub fn add_hook(&self, event: &str, hook: Hook) {
        self.inner.hooks.add(event, hook);
    }

    pub fn hook_count(&self, event: &str) -> usize {
        self.inner.hooks.len(event)
    }

    /// Runs the hooks of `event` in order against `doc`. The first failure
    /// aborts the chain; on success `doc` is returned unchanged.
    pub async fn execute_hooks(&self, event: &str, doc: Document) -> ModelResult<Document> {
        let hooks = self.inner.hooks.snapshot(event);
        if hooks.is_empty() {
            return Ok(doc);
        }

        let context = self.hook_context();
        for hook in hooks {
            hook.call(doc.clone(), context.clone())
                .await
                .map_err(|source| ModelError::Hook {
                    event: event.to_string(),
                    source,
                })?;
        }
        Ok(doc)
    }

    fn emit(&self, event: ModelEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    // ── Writes ──────────────────────────────────────────────────────

    /// Creates or replaces a document under its `_id`.
    pub async fn save(&self, input: impl Into<DocumentInput>) -> ModelResult<Document> {
        let doc = self.new_document(input)?;
        let id = match doc.id() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(DomainError::MissingId.into()),
        };
        let body = self.serialize(&doc)?;

        let doc = self.execute_hooks(BEFORE_SAVE, doc).await?;

        debug!("Saving {} {}", self.inner.name, id);
        self.inner
            .store
            .index_record(
                self.collection(),
                self.category(),
                Some(&id),
                body,
                WriteOptions::immediate(),
            )
            .await?;

        self.emit(ModelEvent::Insert(doc.clone()));
        self.execute_hooks(AFTER_SAVE, doc).await
    }

    /// Saves every input concurrently, then refreshes the collection once.
    /// Results keep input order; the first failure is returned.
    pub async fn save_many<I>(&self, inputs: I) -> ModelResult<Vec<Document>>
    where
        I: IntoIterator,
        I::Item: Into<DocumentInput>,
    {
        let docs = try_join_all(inputs.into_iter().map(|input| self.save(input))).await?;
        self.inner
            .store
            .refresh_collection(self.collection())
            .await?;
        Ok(docs)
    }

    /// Indexes a document letting the store assign the id when `_id` is
    /// unset. The assigned id is written back to `_id`.
    pub async fn insert(&self, input: impl Into<DocumentInput>) -> ModelResult<Document> {
        let doc = self.new_document(input)?;
        let mut record = doc.to_object();
        self.inner.schema.apply_export(&mut record);
        let id = match record.remove(ID_PATH) {
            Some(Value::String(id)) if !id.is_empty() => Some(id),
            _ => None,
        };

        let mut doc = self.execute_hooks(BEFORE_SAVE, doc).await?;

        let assigned = self
            .inner
            .store
            .index_record(
                self.collection(),
                self.category(),
                id.as_deref(),
                Value::record_to_json(&record),
                WriteOptions::immediate(),
            )
            .await?;
        debug!("Inserted {} {}", self.inner.name, assigned);
        doc.set(ID_PATH, assigned);

        self.emit(ModelEvent::Insert(doc.clone()));
        self.execute_hooks(AFTER_SAVE, doc).await
    }

    pub async fn insert_many<I>(&self, inputs: I) -> ModelResult<Vec<Document>>
    where
        I: IntoIterator,
        I::Item: Into<DocumentInput>,
    {
        let docs = try_join_all(inputs.into_iter().map(|input| self.insert(input))).await?;
        self.inner
            .store
            .refresh_collection(self.collection())
            .await?;
        Ok(docs)
    }

    /// Applies a partial update to the stored document and returns the
    /// refreshed copy. Only the paths present in `update` are cast and
    /// validated; a validation failure aborts before any store call.
    pub async fn update_by_id(
        &self,
        id: &str,
        update: impl Into<DocumentInput>,
    ) -> ModelResult<Document> {
        if id.is_empty() {
            return Err(DomainError::MissingId.into());
        }
        let update: DocumentInput = update.into();
        let mut partial = update.into_record()?;
        partial.remove(ID_PATH);
        self.inner.schema.apply_partial(&mut partial)?;

        let current = self
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(id.to_string()))?;
        self.execute_hooks(BEFORE_SAVE, current).await?;

        self.inner.schema.apply_export(&mut partial);
        debug!("Updating {} {}", self.inner.name, id);
        self.inner
            .store
            .update_record(
                self.collection(),
                self.category(),
                id,
                Value::record_to_json(&partial),
                WriteOptions::immediate(),
            )
            .await?;

        let updated = self
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(id.to_string()))?;
        self.emit(ModelEvent::Update(updated.clone()));
        self.execute_hooks(AFTER_SAVE, updated).await
    }

    /// Deletes the document and returns its last state.
    pub async fn remove(&self, id: &str) -> ModelResult<Document> {
        if id.is_empty() {
            return Err(DomainError::MissingId.into());
        }
        let doc = self
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(id.to_string()))?;

        let doc = self.execute_hooks(BEFORE_REMOVE, doc).await?;

        debug!("Removing {} {}", self.inner.name, id);
        self.inner
            .store
            .delete_record(
                self.collection(),
                self.category(),
                id,
                WriteOptions::immediate(),
            )
            .await?;

        self.emit(ModelEvent::Remove(doc.clone()));
        self.execute_hooks(AFTER_REMOVE, doc).await
    }

    pub async fn remove_by_id(&self, id: &str) -> ModelResult<Document> {
        self.remove(id).await
    }

    /// Deletes every document of this model. Returns how many were removed.
    pub async fn drop_all(&self) -> ModelResult<u64> {
        let deleted = self
            .inner
            .store
            .delete_by_query(self.collection(), self.category(), &Query::MatchAll)
            .await?;
        debug!("Dropped {} {} documents", deleted, self.inner.name);
        Ok(deleted)
    }

    /// Deletes every document matching `filter`. Pattern conditions are
    /// rejected since the store cannot evaluate them.
    pub async fn find_and_remove(&self, filter: impl Into<Filter>) -> ModelResult<u64> {
        let filter: Filter = filter.into();
        let plan = filter.plan(&self.inner.schema);
        if let Some((path, _)) = plan.client.first() {
            return Err(DomainError::UnsupportedFilter(path.clone()).into());
        }
        Ok(self
            .inner
            .store
            .delete_by_query(self.collection(), self.category(), &plan.query)
            .await?)
    }

    /// Removes the category's mapping. Failures are logged, not returned.
    pub async fn delete_mapping(&self) {
        if let Err(e) = self
            .inner
            .store
            .delete_mapping(self.collection(), self.category())
            .await
        {
            warn!("Failed to delete mapping for {}: {}", self.inner.name, e);
        }
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// Fetches by id; a missing record is `None`.
    pub async fn get(&self, id: &str) -> ModelResult<Option<Document>> {
        match self
            .inner
            .store
            .get_record(self.collection(), self.category(), id)
            .await
        {
            Ok(record) => self.hydrate(record).map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> ModelResult<Option<Document>> {
        self.get(id).await
    }

    /// Documents matching `filter`, one page at a time.
    pub async fn find(
        &self,
        filter: impl Into<Filter>,
        options: FindOptions,
    ) -> ModelResult<Vec<Document>> {
        let limit = options
            .limit
            .filter(|&limit| limit > 0)
            .unwrap_or(self.inner.config.default_limit);
        self.search(filter.into(), limit, options.skip.unwrap_or(0))
            .await
    }

    pub async fn find_one(&self, filter: impl Into<Filter>) -> ModelResult<Option<Document>> {
        Ok(self
            .find(filter, FindOptions::default())
            .await?
            .into_iter()
            .next())
    }

    /// Like `find` with the large configured ceiling as page size.
    pub async fn find_all(&self, filter: impl Into<Filter>) -> ModelResult<Vec<Document>> {
        self.search(filter.into(), self.inner.config.find_all_limit, 0)
            .await
    }

    pub async fn count(&self) -> ModelResult<u64> {
        Ok(self
            .inner
            .store
            .count(self.collection(), self.category())
            .await?)
    }

    async fn search(&self, filter: Filter, limit: usize, skip: usize) -> ModelResult<Vec<Document>> {
        let plan = filter.plan(&self.inner.schema);
        let hits = self
            .inner
            .store
            .search(
                self.collection(),
                self.category(),
                &plan.query,
                SearchOptions { limit, skip },
            )
            .await?;

        let mut docs = Vec::with_capacity(hits.hits.len());
        for hit in hits.hits {
            let doc = self.hydrate(hit)?;
            let keep = plan.client.iter().all(|(path, matcher)| {
                self.inner
                    .schema
                    .match_path(path, doc.get(path).as_ref(), matcher, doc.data())
            });
            if keep {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    // ── Statics and sorting ─────────────────────────────────────────

    /// Invokes a static method declared on the schema.
    pub fn call_static(&self, name: &str, args: &[Value]) -> ModelResult<Value> {
        let f = self
            .inner
            .schema
            .static_fn(name)
            .ok_or_else(|| DomainError::UnknownStatic(name.to_string()))?;
        f(self, args)
    }

    /// Sorts documents in place by `path`, using the path's type ordering.
    pub fn sort_documents(&self, docs: &mut [Document], path: &str, order: SortOrder) {
        docs.sort_by(|a, b| {
            let ord = self
                .inner
                .schema
                .compare_path(path, a.get(path).as_ref(), b.get(path).as_ref());
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.inner.name)
            .field("category", &self.inner.category)
            .field("collection", &self.inner.config.collection)
            .finish()
    }
}
