//! Core types for gqlbind.
//!
//! This crate provides the vocabulary shared between resolver code and the
//! runtime engine:
//! - `value`: resolver return shapes, deferred values, source keys, batch maps
//! - `arguments`: the ordered, value-equal argument map
//! - `selection`: requested sub-field extraction and the selection path set
//! - `context`: the request-scoped context handle
//! - `pattern`: the closed set of resolver invocation shapes
//! - `error`: build-time and per-field error types

pub mod arguments;
pub mod context;
pub mod error;
pub mod pattern;
pub mod selection;
pub mod value;

pub use arguments::Arguments;
pub use context::RequestContext;
pub use error::{ConfigError, FieldError};
pub use pattern::InvocationPattern;
pub use selection::{SelectedField, Selection};
pub use value::{BatchMap, Deferred, FieldResult, ResolvedValue, SourceKey};
