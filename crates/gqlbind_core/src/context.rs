//! The request-scoped context handle.
//!
//! One context exists per query execution; clones share the same underlying
//! request. Identity, not content, is what ties pending batch keys to their
//! request, so equality is pointer equality on the shared allocation.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Default)]
struct ContextInner {
    data: RwLock<HashMap<String, Value>>,
}

/// A cheap-clone handle to per-request state.
#[derive(Clone, Default)]
pub struct RequestContext {
    inner: Arc<ContextInner>,
}

impl RequestContext {
    /// Creates a fresh context for one request execution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a serializable value under a key; values that fail to
    /// serialize are dropped.
    pub fn set<T: Serialize>(&self, key: impl Into<String>, value: T) {
        if let Ok(value) = serde_json::to_value(value) {
            self.inner.data.write().insert(key.into(), value);
        }
    }

    /// Retrieves a previously stored value.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.inner
            .data
            .read()
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Whether two handles belong to the same request.
    pub fn same_request(&self, other: &RequestContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for RequestContext {
    fn eq(&self, other: &Self) -> bool {
        self.same_request(other)
    }
}

impl Eq for RequestContext {}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("entries", &self.inner.data.read().len())
            .finish()
    }
}
