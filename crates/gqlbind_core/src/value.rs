//! Resolver return shapes and the canonical deferred value.
//!
//! `serde_json::Value` is the terminal object representation throughout the
//! engine; everything a resolver may return is normalized down to it (or to a
//! [`BatchMap`] for batched resolvers) by the runtime's converter chain.

use crate::error::FieldError;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::pin::Pin;

/// The canonical eventual result of one field resolution.
///
/// Created per field-resolution call and completed exactly once, with either
/// a terminal value or a per-field error.
pub type Deferred = Pin<Box<dyn Future<Output = Result<Value, FieldError>> + Send>>;

/// A boxed future producing another value to convert.
pub type DeferredResolved =
    Pin<Box<dyn Future<Output = Result<ResolvedValue, FieldError>> + Send>>;

/// What a resolver closure returns.
pub type FieldResult = Result<ResolvedValue, FieldError>;

/// A resolver's return value before normalization.
///
/// The converter chain reduces any of these shapes to a terminal value:
/// `Null` and `Ready` are already terminal, `Deferred` is the canonical
/// asynchronous container, and `Wrapped` carries a domain value that
/// registered converters unwrap layer by layer.
pub enum ResolvedValue {
    /// An empty result; completes the field with null, bypassing converters.
    Null,
    /// A terminal value in the canonical representation.
    Ready(Value),
    /// The canonical deferred container.
    Deferred(DeferredResolved),
    /// An opaque domain value requiring conversion.
    Wrapped {
        value: Box<dyn Any + Send>,
        type_name: &'static str,
    },
}

impl ResolvedValue {
    /// An empty result.
    pub fn null() -> Self {
        Self::Null
    }

    /// A terminal value, serialized into the canonical representation.
    pub fn json<T: Serialize>(value: T) -> FieldResult {
        serde_json::to_value(value)
            .map(Self::Ready)
            .map_err(|e| FieldError::Serialization(e.to_string()))
    }

    /// A terminal value already in the canonical representation.
    pub fn value(value: Value) -> Self {
        Self::Ready(value)
    }

    /// A deferred value producing another value to convert.
    pub fn future<F>(future: F) -> Self
    where
        F: Future<Output = FieldResult> + Send + 'static,
    {
        Self::Deferred(Box::pin(future))
    }

    /// An opaque domain value for the converter chain to unwrap.
    pub fn wrap<T: Any + Send>(value: T) -> Self {
        Self::Wrapped {
            value: Box::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }
}

impl fmt::Debug for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
            Self::Wrapped { type_name, .. } => {
                f.debug_tuple("Wrapped").field(type_name).finish()
            }
        }
    }
}

impl From<Value> for ResolvedValue {
    fn from(value: Value) -> Self {
        Self::Ready(value)
    }
}

/// A parent object acting as a batch key component.
///
/// Wraps the canonical value with a structural `Hash` consistent with its
/// `Eq`, so sources can key deduplication maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceKey(Value);

impl SourceKey {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl Hash for SourceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(&self.0, state);
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<Value> for SourceKey {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Structural hash over a canonical value.
///
/// Object entries hash in map-iteration order, which is a deterministic key
/// order for `serde_json`'s map, so equal values hash equally.
pub(crate) fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => 0u8.hash(state),
        Value::Bool(b) => {
            1u8.hash(state);
            b.hash(state);
        }
        Value::Number(n) => {
            2u8.hash(state);
            n.to_string().hash(state);
        }
        Value::String(s) => {
            3u8.hash(state);
            s.hash(state);
        }
        Value::Array(items) => {
            4u8.hash(state);
            items.len().hash(state);
            for item in items {
                hash_value(item, state);
            }
        }
        Value::Object(entries) => {
            5u8.hash(state);
            entries.len().hash(state);
            for (key, item) in entries {
                key.hash(state);
                hash_value(item, state);
            }
        }
    }
}

/// The terminal result of one batch invocation: one value per source.
///
/// Insertion order is preserved so results come back in the order sources
/// were dispatched.
#[derive(Debug, Default)]
pub struct BatchMap {
    entries: IndexMap<SourceKey, Value>,
}

impl BatchMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a source to its terminal value.
    pub fn insert(&mut self, source: Value, value: Value) {
        self.entries.insert(SourceKey::new(source), value);
    }

    /// Maps a source to a serializable value.
    pub fn insert_json<T: Serialize>(&mut self, source: Value, value: T) -> Result<(), FieldError> {
        let value =
            serde_json::to_value(value).map_err(|e| FieldError::Serialization(e.to_string()))?;
        self.insert(source, value);
        Ok(())
    }

    pub fn get(&self, source: &SourceKey) -> Option<&Value> {
        self.entries.get(source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SourceKey, &Value)> {
        self.entries.iter()
    }
}

impl FromIterator<(Value, Value)> for BatchMap {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (source, value) in iter {
            map.insert(source, value);
        }
        map
    }
}
