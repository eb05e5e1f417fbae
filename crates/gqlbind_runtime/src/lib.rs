//! Resolver binding and batching runtime for gqlbind.
//!
//! This crate wires plain closures to GraphQL field resolution and coalesces
//! concurrent per-object field requests into batched calls:
//! - `binding`: tagged resolver closures and their build-time classification
//! - `convert`: the converter chain normalizing resolver return shapes
//! - `batch`: the request-scoped batch loader and its dispatch tick
//! - `wiring`: the registry, the engine-facing wiring and field environment
//! - `paging`: the Relay cursor-pagination helper

pub mod batch;
pub mod binding;
pub mod convert;
pub mod paging;
pub mod wiring;

pub use batch::{BatchKey, BatchLoader, Discriminator, LoaderFactory, LoaderRegistry};
pub use binding::{BatchFn, BindingKind, FieldBinding, ResolverFn, TypeResolver};
pub use convert::{Converted, Converters, ConvertersBuilder};
pub use paging::{Connection, Edge, PageArguments, PageInfo};
pub use wiring::{FieldCallback, FieldEnv, FieldWiring, Registry, RegistryBuilder, RuntimeWiring};

pub use gqlbind_core::{
    Arguments, BatchMap, ConfigError, Deferred, FieldError, FieldResult, InvocationPattern,
    RequestContext, ResolvedValue, SelectedField, Selection, SourceKey,
};
