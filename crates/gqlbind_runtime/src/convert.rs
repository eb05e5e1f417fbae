//! The converter chain normalizing resolver return shapes.
//!
//! Converters are registered once per concrete runtime type and the set is
//! immutable after build, so dispatch is a plain hash lookup keyed by
//! `TypeId` shared freely across in-flight resolutions. The chain unwraps a
//! value layer by layer (an optional wrapping a future wrapping a domain
//! object takes one pass per layer) until a terminal shape remains.

use gqlbind_core::{ConfigError, FieldError, FieldResult, RequestContext, ResolvedValue};
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// A non-reducing converter cycle trips this bound and is reported as an
/// internal error rather than spinning.
const MAX_PASSES: usize = 64;

type ConvertFn =
    Arc<dyn Fn(Box<dyn Any + Send>, &RequestContext) -> FieldResult + Send + Sync>;

struct ConverterEntry {
    type_name: &'static str,
    apply: ConvertFn,
}

/// The terminal outcome of a conversion.
///
/// `Other` is a value no converter matched; whether that terminal is
/// representable is the caller's decision (the batch coordinator accepts a
/// `BatchMap` here, field wiring accepts nothing).
pub enum Converted {
    Null,
    Value(Value),
    Other {
        value: Box<dyn Any + Send>,
        type_name: &'static str,
    },
}

impl std::fmt::Debug for Converted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Other { type_name, .. } => f
                .debug_struct("Other")
                .field("type_name", type_name)
                .finish_non_exhaustive(),
        }
    }
}

/// The immutable, build-once converter set.
#[derive(Default)]
pub struct Converters {
    entries: FxHashMap<TypeId, ConverterEntry>,
}

impl std::fmt::Debug for Converters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converters")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Builds a converter set; registering two converters for one type is a
/// build-time configuration error.
#[derive(Default)]
pub struct ConvertersBuilder {
    entries: Vec<(TypeId, ConverterEntry)>,
}

impl ConvertersBuilder {
    /// Registers a converter for values of concrete type `T`.
    pub fn converter<T, F>(mut self, f: F) -> Self
    where
        T: Any + Send,
        F: Fn(T, &RequestContext) -> FieldResult + Send + Sync + 'static,
    {
        let apply: ConvertFn = Arc::new(move |any, context| {
            let value = any
                .downcast::<T>()
                .map_err(|_| FieldError::internal("converter dispatched to a mismatched type"))?;
            f(*value, context)
        });
        self.entries.push((
            TypeId::of::<T>(),
            ConverterEntry {
                type_name: std::any::type_name::<T>(),
                apply,
            },
        ));
        self
    }

    pub fn build(self) -> Result<Converters, ConfigError> {
        let mut entries = FxHashMap::default();
        for (type_id, entry) in self.entries {
            let type_name = entry.type_name;
            if entries.insert(type_id, entry).is_some() {
                return Err(ConfigError::DuplicateConverter { type_name });
            }
        }
        Ok(Converters { entries })
    }
}

impl Converters {
    pub fn builder() -> ConvertersBuilder {
        ConvertersBuilder::default()
    }

    /// An empty set: only the built-in shapes are normalized.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reduces a resolver's return value to a terminal shape.
    ///
    /// Null completes immediately without running any converter; the
    /// canonical deferred container is awaited and its output re-enters the
    /// chain; a wrapped value dispatches to the converter registered for its
    /// exact runtime type, and an unmatched wrapped value is terminal.
    pub async fn convert(
        &self,
        value: ResolvedValue,
        context: &RequestContext,
    ) -> Result<Converted, FieldError> {
        let mut current = value;
        let mut passes = 0usize;
        loop {
            current = match current {
                ResolvedValue::Null => return Ok(Converted::Null),
                ResolvedValue::Ready(value) => return Ok(Converted::Value(value)),
                ResolvedValue::Deferred(future) => future.await?,
                ResolvedValue::Wrapped { value, type_name } => {
                    match self.entries.get(&(*value).type_id()) {
                        Some(entry) => {
                            passes += 1;
                            if passes > MAX_PASSES {
                                return Err(FieldError::internal(format!(
                                    "conversion of {type_name} did not terminate after {MAX_PASSES} passes"
                                )));
                            }
                            (entry.apply)(value, context)?
                        }
                        None => return Ok(Converted::Other { value, type_name }),
                    }
                }
            };
        }
    }
}
