//! Connection configuration and the entity-type registry.

use crate::error::{DomainError, ModelResult};
use crate::model::Model;
use crate::node::NodeKind;
use crate::schema::Schema;
use elastore_store::{CollectionOptions, StoreAdapter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Page size of `find` when none is given.
pub const DEFAULT_LIMIT: usize = 10;

/// Page size of `find_all`.
pub const FIND_ALL_LIMIT: usize = 10_000;

/// Connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Name of the collection all models share.
    pub collection: String,
    /// Store endpoint, for adapters that talk to a server.
    pub host: Option<String>,
    pub default_limit: usize,
    pub find_all_limit: usize,
    /// Buffered events per model before slow subscribers start lagging.
    pub event_capacity: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            collection: "elastore".to_string(),
            host: None,
            default_limit: DEFAULT_LIMIT,
            find_all_limit: FIND_ALL_LIMIT,
            event_capacity: 64,
        }
    }
}

impl ConnectionConfig {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }
}

/// A store plus the models registered against it.
pub struct Connection {
    store: Arc<dyn StoreAdapter>,
    config: Arc<ConnectionConfig>,
    models: RwLock<HashMap<String, Model>>,
}

impl Connection {
    pub fn new(store: Arc<dyn StoreAdapter>, config: ConnectionConfig) -> ModelResult<Self> {
        if config.collection.is_empty() {
            return Err(DomainError::MissingCollection.into());
        }
        Ok(Self {
            store,
            config: Arc::new(config),
            models: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn StoreAdapter> {
        &self.store
    }

    /// Creates the collection unless it already exists.
    pub async fn connect(&self) -> ModelResult<()> {
        let collection = &self.config.collection;
        if self.store.collection_exists(collection).await? {
            debug!("Collection {} already exists", collection);
            return Ok(());
        }
        self.store
            .create_collection(collection, &CollectionOptions::default())
            .await?;
        info!("Created collection {}", collection);
        Ok(())
    }

    /// Registers a model, or returns the one already registered under
    /// `name` (the new schema is then ignored).
    pub fn model(&self, name: &str, schema: Schema) -> Model {
        let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);
        models
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!("Registering model {}", name);
                Model::new(name, schema, self.store.clone(), self.config.clone())
            })
            .clone()
    }

    /// Registers the model of a node kind under its `TYPE`.
    pub fn node<N: NodeKind>(&self) -> ModelResult<Model> {
        if let Some(model) = self.get_model(N::TYPE) {
            return Ok(model);
        }
        let schema = N::schema()?;
        let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);
        Ok(models
            .entry(N::TYPE.to_string())
            .or_insert_with(|| {
                Model::with_category(
                    N::TYPE,
                    N::TYPE,
                    schema,
                    self.store.clone(),
                    self.config.clone(),
                )
            })
            .clone())
    }

    pub fn get_model(&self, name: &str) -> Option<Model> {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Names of the registered models, sorted.
    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Deletes the mapping of every registered model. Failures are logged
    /// and the remaining models are still processed.
    pub async fn drop_all(&self) {
        let models: Vec<Model> = self
            .models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        for model in models {
            if let Err(e) = self
                .store
                .delete_mapping(model.collection(), model.category())
                .await
            {
                warn!("Failed to delete mapping for {}: {}", model.name(), e);
            }
        }
    }
}
