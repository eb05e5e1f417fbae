//! The batch coordinator.
//!
//! Each batched field resolution enqueues a key on a request-scoped loader
//! and receives an uncompleted deferred value. The external engine owns the
//! timing of drain ticks; at a tick every pending key is partitioned by its
//! discriminator (argument and selection value-equality), deduplicated by
//! source within each group, and each group invokes the bound batch closure
//! exactly once. Groups run concurrently and fail independently.

use crate::binding::BatchFn;
use crate::convert::{Converted, Converters};
use futures::future::join_all;
use gqlbind_core::{
    Arguments, BatchMap, Deferred, FieldError, RequestContext, Selection, SourceKey,
};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

/// The pair deciding which pending keys may share one batch invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Discriminator {
    pub arguments: Arguments,
    pub selection: Selection,
}

/// One pending batched field call.
#[derive(Debug, Clone)]
pub struct BatchKey {
    source: SourceKey,
    discriminator: Discriminator,
    context: RequestContext,
}

impl BatchKey {
    pub fn new(
        source: Value,
        arguments: Arguments,
        selection: Selection,
        context: RequestContext,
    ) -> Self {
        Self {
            source: SourceKey::new(source),
            discriminator: Discriminator {
                arguments,
                selection,
            },
            context,
        }
    }
}

type Completion = oneshot::Sender<Result<Value, FieldError>>;

struct Pending {
    key: BatchKey,
    tx: Completion,
}

/// A request-scoped loader for one batched field binding.
///
/// Never shared across requests: a fresh loader is created per request by
/// [`LoaderFactory::create`].
pub struct BatchLoader {
    name: String,
    batch_fn: BatchFn,
    converters: Arc<Converters>,
    pending: Mutex<Vec<Pending>>,
}

impl BatchLoader {
    fn new(name: String, batch_fn: BatchFn, converters: Arc<Converters>) -> Self {
        Self {
            name,
            batch_fn,
            converters,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueues a key and returns its uncompleted deferred value.
    ///
    /// The deferred settles once a later [`dispatch`](Self::dispatch) tick
    /// drains the queue; awaiting it before a tick runs will wait forever.
    pub fn load(&self, key: BatchKey) -> Deferred {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().push(Pending { key, tx });
        Box::pin(async move {
            rx.await
                .map_err(|_| FieldError::internal("batch dispatch dropped a pending field"))?
        })
    }

    /// Drains and serves every currently pending key: one drain tick.
    ///
    /// All discriminator groups are invoked concurrently and the tick
    /// completes only once every group has settled. A failing group fails
    /// only its own keys.
    pub async fn dispatch(&self) {
        let drained = std::mem::take(&mut *self.pending.lock());
        if drained.is_empty() {
            return;
        }
        let context = drained[0].key.context.clone();
        assert!(
            drained
                .iter()
                .all(|pending| pending.key.context.same_request(&context)),
            "loader {} observed two request contexts within one tick",
            self.name,
        );

        // Partition by discriminator, then dedupe by source within each
        // group, preserving arrival order in both.
        let mut groups: IndexMap<Discriminator, IndexMap<SourceKey, Vec<Completion>>> =
            IndexMap::new();
        let pending_count = drained.len();
        for pending in drained {
            groups
                .entry(pending.key.discriminator)
                .or_default()
                .entry(pending.key.source)
                .or_default()
                .push(pending.tx);
        }
        debug!(
            loader = %self.name,
            pending = pending_count,
            groups = groups.len(),
            "dispatching batch tick"
        );

        let invocations = groups
            .into_iter()
            .map(|(discriminator, by_source)| self.run_group(discriminator, by_source, &context));
        join_all(invocations).await;
    }

    /// Invokes the batch closure once for one discriminator group and
    /// completes every key in it.
    async fn run_group(
        &self,
        discriminator: Discriminator,
        by_source: IndexMap<SourceKey, Vec<Completion>>,
        context: &RequestContext,
    ) {
        let sources: Vec<Value> = by_source
            .keys()
            .map(|source| source.as_value().clone())
            .collect();
        let outcome = match self.batch_fn.invoke(
            sources,
            &discriminator.arguments,
            &discriminator.selection,
        ) {
            Ok(returned) => self.converters.convert(returned, context).await,
            Err(error) => Err(error),
        };

        match outcome {
            Ok(Converted::Other { value, type_name }) => match value.downcast::<BatchMap>() {
                Ok(results) => complete_group(by_source, &results),
                Err(_) => fail_group(
                    by_source,
                    FieldError::InvalidBatchResult(format!("got {type_name}")),
                ),
            },
            Ok(Converted::Value(value)) => fail_group(
                by_source,
                FieldError::InvalidBatchResult(format!("got a plain value {value}")),
            ),
            Ok(Converted::Null) => fail_group(
                by_source,
                FieldError::InvalidBatchResult("got null".to_string()),
            ),
            Err(error) => fail_group(by_source, error),
        }
    }
}

/// Expands a group's result map back onto its pending keys; duplicates of a
/// source all receive the same value, and a source the map omits fails only
/// its own keys.
fn complete_group(by_source: IndexMap<SourceKey, Vec<Completion>>, results: &BatchMap) {
    for (source, completions) in by_source {
        let result = match results.get(&source) {
            Some(value) => Ok(value.clone()),
            None => Err(FieldError::MissingBatchResult {
                source_key: source.to_string(),
            }),
        };
        for tx in completions {
            let _ = tx.send(result.clone());
        }
    }
}

fn fail_group(by_source: IndexMap<SourceKey, Vec<Completion>>, error: FieldError) {
    for completions in by_source.into_values() {
        for tx in completions {
            let _ = tx.send(Err(error.clone()));
        }
    }
}

/// Build-time factory producing one fresh loader per request execution.
pub struct LoaderFactory {
    name: String,
    batch_fn: BatchFn,
    converters: Arc<Converters>,
}

impl LoaderFactory {
    pub(crate) fn new(name: String, batch_fn: BatchFn, converters: Arc<Converters>) -> Self {
        Self {
            name,
            batch_fn,
            converters,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create(&self) -> BatchLoader {
        BatchLoader::new(
            self.name.clone(),
            self.batch_fn.clone(),
            Arc::clone(&self.converters),
        )
    }
}

/// The request-scoped set of loaders, keyed by binding name.
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: IndexMap<String, Arc<BatchLoader>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, loader: BatchLoader) {
        self.loaders
            .insert(loader.name().to_string(), Arc::new(loader));
    }

    pub fn get(&self, name: &str) -> Option<Arc<BatchLoader>> {
        self.loaders.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// Runs one drain tick across every registered loader.
    pub async fn dispatch_all(&self) {
        join_all(self.loaders.values().map(|loader| loader.dispatch())).await;
    }
}
