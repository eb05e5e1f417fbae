//! Resolver closures and their build-time classification.
//!
//! A resolver registers a tagged closure whose variant *is* its invocation
//! pattern, so classification reduces to validating the declared pattern
//! against the owning type once at registry build. Batched resolvers use a
//! separate tag set whose source position carries the deduplicated set of
//! parent objects.

use gqlbind_core::{
    Arguments, ConfigError, FieldError, FieldResult, InvocationPattern, Selection,
};
use serde_json::Value;
use std::sync::Arc;

/// A field resolver closure, tagged by the parts it declares.
#[derive(Clone)]
pub enum ResolverFn {
    NoArgs(Arc<dyn Fn() -> FieldResult + Send + Sync>),
    SourceOnly(Arc<dyn Fn(Value) -> FieldResult + Send + Sync>),
    ArgumentsOnly(Arc<dyn Fn(Arguments) -> FieldResult + Send + Sync>),
    SelectionOnly(Arc<dyn Fn(Selection) -> FieldResult + Send + Sync>),
    SourceAndArguments(Arc<dyn Fn(Value, Arguments) -> FieldResult + Send + Sync>),
    SourceAndSelection(Arc<dyn Fn(Value, Selection) -> FieldResult + Send + Sync>),
    ArgumentsAndSelection(Arc<dyn Fn(Arguments, Selection) -> FieldResult + Send + Sync>),
    SourceArgumentsSelection(
        Arc<dyn Fn(Value, Arguments, Selection) -> FieldResult + Send + Sync>,
    ),
}

impl ResolverFn {
    pub fn no_args<F>(f: F) -> Self
    where
        F: Fn() -> FieldResult + Send + Sync + 'static,
    {
        Self::NoArgs(Arc::new(f))
    }

    pub fn source<F>(f: F) -> Self
    where
        F: Fn(Value) -> FieldResult + Send + Sync + 'static,
    {
        Self::SourceOnly(Arc::new(f))
    }

    pub fn arguments<F>(f: F) -> Self
    where
        F: Fn(Arguments) -> FieldResult + Send + Sync + 'static,
    {
        Self::ArgumentsOnly(Arc::new(f))
    }

    pub fn selection<F>(f: F) -> Self
    where
        F: Fn(Selection) -> FieldResult + Send + Sync + 'static,
    {
        Self::SelectionOnly(Arc::new(f))
    }

    pub fn source_arguments<F>(f: F) -> Self
    where
        F: Fn(Value, Arguments) -> FieldResult + Send + Sync + 'static,
    {
        Self::SourceAndArguments(Arc::new(f))
    }

    pub fn source_selection<F>(f: F) -> Self
    where
        F: Fn(Value, Selection) -> FieldResult + Send + Sync + 'static,
    {
        Self::SourceAndSelection(Arc::new(f))
    }

    pub fn arguments_selection<F>(f: F) -> Self
    where
        F: Fn(Arguments, Selection) -> FieldResult + Send + Sync + 'static,
    {
        Self::ArgumentsAndSelection(Arc::new(f))
    }

    pub fn source_arguments_selection<F>(f: F) -> Self
    where
        F: Fn(Value, Arguments, Selection) -> FieldResult + Send + Sync + 'static,
    {
        Self::SourceArgumentsSelection(Arc::new(f))
    }

    /// The pattern this closure was registered with.
    pub fn pattern(&self) -> InvocationPattern {
        match self {
            Self::NoArgs(_) => InvocationPattern::NoArgs,
            Self::SourceOnly(_) => InvocationPattern::SourceOnly,
            Self::ArgumentsOnly(_) => InvocationPattern::ArgumentsOnly,
            Self::SelectionOnly(_) => InvocationPattern::SelectionOnly,
            Self::SourceAndArguments(_) => InvocationPattern::SourceAndArguments,
            Self::SourceAndSelection(_) => InvocationPattern::SourceAndSelection,
            Self::ArgumentsAndSelection(_) => InvocationPattern::ArgumentsAndSelection,
            Self::SourceArgumentsSelection(_) => InvocationPattern::SourceArgumentsSelection,
        }
    }

    /// Invokes the closure with exactly the parts its pattern names.
    pub(crate) fn invoke(
        &self,
        source: Option<&Value>,
        arguments: &Arguments,
        selection: &Selection,
    ) -> FieldResult {
        match self {
            Self::NoArgs(f) => f(),
            Self::SourceOnly(f) => f(require_source(source)?.clone()),
            Self::ArgumentsOnly(f) => f(arguments.clone()),
            Self::SelectionOnly(f) => f(selection.clone()),
            Self::SourceAndArguments(f) => f(require_source(source)?.clone(), arguments.clone()),
            Self::SourceAndSelection(f) => f(require_source(source)?.clone(), selection.clone()),
            Self::ArgumentsAndSelection(f) => f(arguments.clone(), selection.clone()),
            Self::SourceArgumentsSelection(f) => f(
                require_source(source)?.clone(),
                arguments.clone(),
                selection.clone(),
            ),
        }
    }
}

fn require_source(source: Option<&Value>) -> Result<&Value, FieldError> {
    source.ok_or_else(|| FieldError::internal("non-root field resolved without a source"))
}

/// A batch resolver closure, invoked once per discriminator group with the
/// deduplicated sources of that group.
#[derive(Clone)]
pub enum BatchFn {
    Sources(Arc<dyn Fn(Vec<Value>) -> FieldResult + Send + Sync>),
    SourcesAndArguments(Arc<dyn Fn(Vec<Value>, Arguments) -> FieldResult + Send + Sync>),
    SourcesAndSelection(Arc<dyn Fn(Vec<Value>, Selection) -> FieldResult + Send + Sync>),
    SourcesArgumentsSelection(
        Arc<dyn Fn(Vec<Value>, Arguments, Selection) -> FieldResult + Send + Sync>,
    ),
}

impl BatchFn {
    pub fn sources<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> FieldResult + Send + Sync + 'static,
    {
        Self::Sources(Arc::new(f))
    }

    pub fn sources_arguments<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>, Arguments) -> FieldResult + Send + Sync + 'static,
    {
        Self::SourcesAndArguments(Arc::new(f))
    }

    pub fn sources_selection<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>, Selection) -> FieldResult + Send + Sync + 'static,
    {
        Self::SourcesAndSelection(Arc::new(f))
    }

    pub fn sources_arguments_selection<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>, Arguments, Selection) -> FieldResult + Send + Sync + 'static,
    {
        Self::SourcesArgumentsSelection(Arc::new(f))
    }

    /// The pattern this closure was registered with, with the source position
    /// carrying the set of parents.
    pub fn pattern(&self) -> InvocationPattern {
        match self {
            Self::Sources(_) => InvocationPattern::SourceOnly,
            Self::SourcesAndArguments(_) => InvocationPattern::SourceAndArguments,
            Self::SourcesAndSelection(_) => InvocationPattern::SourceAndSelection,
            Self::SourcesArgumentsSelection(_) => InvocationPattern::SourceArgumentsSelection,
        }
    }

    pub(crate) fn invoke(
        &self,
        sources: Vec<Value>,
        arguments: &Arguments,
        selection: &Selection,
    ) -> FieldResult {
        match self {
            Self::Sources(f) => f(sources),
            Self::SourcesAndArguments(f) => f(sources, arguments.clone()),
            Self::SourcesAndSelection(f) => f(sources, selection.clone()),
            Self::SourcesArgumentsSelection(f) => {
                f(sources, arguments.clone(), selection.clone())
            }
        }
    }
}

/// How a field binding resolves: straight through, or via the batch loader.
#[derive(Clone)]
pub enum BindingKind {
    Simple(ResolverFn),
    Batched(BatchFn),
}

/// One declared field binding on a resolver object.
#[derive(Clone)]
pub struct FieldBinding {
    pub(crate) field_name: String,
    pub(crate) kind: BindingKind,
    pub(crate) selection_depth: usize,
}

impl FieldBinding {
    /// Binds a field to a simple resolver.
    pub fn new(field_name: impl Into<String>, resolver: ResolverFn) -> Self {
        Self {
            field_name: field_name.into(),
            kind: BindingKind::Simple(resolver),
            selection_depth: 1,
        }
    }

    /// Binds a field to a batched resolver.
    pub fn batched(field_name: impl Into<String>, batch: BatchFn) -> Self {
        Self {
            field_name: field_name.into(),
            kind: BindingKind::Batched(batch),
            selection_depth: 1,
        }
    }

    /// Overrides the selection extraction depth (default 1).
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.selection_depth = depth;
        self
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn selection_depth(&self) -> usize {
        self.selection_depth
    }
}

/// A resolver object declaring the bindings for one GraphQL type.
pub trait TypeResolver: Send + Sync {
    /// The GraphQL object type this resolver services.
    fn type_name(&self) -> &str;

    /// The field bindings this resolver declares.
    fn fields(&self) -> Vec<FieldBinding>;
}

/// Validates a binding's declared pattern against its owning type.
///
/// Evaluated once at registry build; failures are fatal configuration
/// errors, never per-request failures.
pub(crate) fn classify(
    binding: &FieldBinding,
    type_name: &str,
    owner_is_root: bool,
) -> Result<InvocationPattern, ConfigError> {
    match &binding.kind {
        BindingKind::Simple(resolver) => {
            let pattern = resolver.pattern();
            if owner_is_root && pattern.has_source() {
                return Err(ConfigError::RootSourceBinding {
                    type_name: type_name.to_string(),
                    field_name: binding.field_name.clone(),
                    pattern,
                });
            }
            Ok(pattern)
        }
        BindingKind::Batched(batch) => {
            if owner_is_root {
                return Err(ConfigError::BatchedRootBinding {
                    type_name: type_name.to_string(),
                    field_name: binding.field_name.clone(),
                });
            }
            Ok(batch.pattern())
        }
    }
}
