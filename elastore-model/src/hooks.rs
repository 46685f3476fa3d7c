//! Lifecycle hooks.
//!
//! A hook receives a snapshot of the document and the model's
//! [`HookContext`] and resolves to `Ok(())` or an error. Hooks registered
//! under one event run sequentially in registration order; the first error
//! aborts the chain and becomes the operation's error.
//!
//! Hooks observe, they do not edit. Each one gets its own clone of the
//! document, and the stored body is serialized before pre-save hooks run,
//! so changes a hook makes to its document are neither indexed nor seen by
//! the next hook. Reject the write by returning an error, or persist
//! follow-up changes with a separate operation.
//!
//! Three ways to write one:
//! - [`Hook::new`]: an async closure
//! - [`Hook::sync`]: a plain closure returning a `Result`
//! - [`Hook::callback`]: a closure handed a [`Done`] to complete later

use crate::document::Document;
use crate::error::SchemaError;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::oneshot;

pub const BEFORE_SAVE: &str = "beforeSave";
pub const AFTER_SAVE: &str = "afterSave";
pub const BEFORE_REMOVE: &str = "beforeRemove";
pub const AFTER_REMOVE: &str = "afterRemove";

/// The operation a schema hook attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Save,
    Remove,
}

impl FromStr for HookKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "save" => Ok(HookKind::Save),
            "remove" => Ok(HookKind::Remove),
            other => Err(SchemaError::InvalidHookType(other.to_string())),
        }
    }
}

/// Whether a hook runs before or after the store write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    Pre,
    Post,
}

/// Registry name of the event for a phase and operation.
pub fn event_name(phase: HookPhase, kind: HookKind) -> &'static str {
    match (phase, kind) {
        (HookPhase::Pre, HookKind::Save) => BEFORE_SAVE,
        (HookPhase::Post, HookKind::Save) => AFTER_SAVE,
        (HookPhase::Pre, HookKind::Remove) => BEFORE_REMOVE,
        (HookPhase::Post, HookKind::Remove) => AFTER_REMOVE,
    }
}

/// What a hook knows about where it runs.
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    pub model: String,
    pub category: String,
    pub collection: String,
    /// Application data attached with `Model::set_context`.
    pub app: serde_json::Value,
}

pub type HookFuture = BoxFuture<'static, anyhow::Result<()>>;

type HookFn = dyn Fn(Document, HookContext) -> HookFuture + Send + Sync;

/// A registered lifecycle callback.
#[derive(Clone)]
pub struct Hook {
    run: Arc<HookFn>,
}

impl Hook {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Document, HookContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            run: Arc::new(move |doc, ctx| -> HookFuture { Box::pin(f(doc, ctx)) }),
        }
    }

    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&Document, &HookContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::new(move |doc, ctx| {
            let result = f(&doc, &ctx);
            async move { result }
        })
    }

    /// A hook that completes when `done` is called. Dropping [`Done`]
    /// without calling it counts as a failure.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(Document, HookContext, Done) + Send + Sync + 'static,
    {
        Self::new(move |doc, ctx| {
            let (tx, rx) = oneshot::channel();
            f(doc, ctx, Done(tx));
            async move {
                rx.await
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("hook finished without calling done")))
            }
        })
    }

    pub(crate) fn call(&self, doc: Document, ctx: HookContext) -> HookFuture {
        (self.run)(doc, ctx)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook")
    }
}

/// Completion handle passed to [`Hook::callback`] hooks.
#[derive(Debug)]
pub struct Done(oneshot::Sender<anyhow::Result<()>>);

impl Done {
    pub fn ok(self) {
        self.finish(Ok(()));
    }

    pub fn fail(self, err: impl Into<anyhow::Error>) {
        self.finish(Err(err.into()));
    }

    pub fn finish(self, result: anyhow::Result<()>) {
        // The receiver is gone only if the operation was dropped.
        let _ = self.0.send(result);
    }
}

/// Named hook lists of one model.
#[derive(Debug, Default)]
pub(crate) struct HookRegistry {
    hooks: RwLock<HashMap<String, Vec<Hook>>>,
}

impl HookRegistry {
    pub fn add(&self, event: &str, hook: Hook) {
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event.to_string())
            .or_default()
            .push(hook);
    }

    /// Hooks for `event` at call time; hooks added while a chain runs wait
    /// for the next operation.
    pub fn snapshot(&self, event: &str) -> Vec<Hook> {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self, event: &str) -> usize {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .map_or(0, Vec::len)
    }
}
