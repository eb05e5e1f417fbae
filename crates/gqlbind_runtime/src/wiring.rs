//! The field wiring registry and the engine-facing boundary.
//!
//! At startup a [`Registry`] inspects the registered resolver objects and
//! builds one immutable field wiring per binding plus one loader factory per
//! batched binding. Per request, the external engine decorates a fresh
//! [`LoaderRegistry`], constructs a [`FieldEnv`] per field invocation, and
//! drives the callbacks registered in its [`RuntimeWiring`].

use crate::batch::{BatchKey, LoaderFactory, LoaderRegistry};
use crate::binding::{classify, BindingKind, ResolverFn, TypeResolver};
use crate::convert::{Converted, Converters};
use gqlbind_core::{
    Arguments, ConfigError, Deferred, FieldError, RequestContext, SelectedField, Selection,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};

/// Everything the external engine exposes for one field invocation.
pub struct FieldEnv {
    source: Option<Value>,
    arguments: Arguments,
    selected: Vec<SelectedField>,
    context: RequestContext,
    loaders: Arc<LoaderRegistry>,
}

impl FieldEnv {
    /// Creates an environment with no source, arguments or selection.
    pub fn new(context: RequestContext, loaders: Arc<LoaderRegistry>) -> Self {
        Self {
            source: None,
            arguments: Arguments::empty(),
            selected: Vec::new(),
            context,
            loaders,
        }
    }

    /// Sets the parent object (absent for root-type fields).
    pub fn with_source(mut self, source: Value) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the raw argument map.
    pub fn with_arguments(mut self, arguments: Arguments) -> Self {
        self.arguments = arguments;
        self
    }

    /// Sets the requested sub-field tree below this field.
    pub fn with_selected_fields(mut self, fields: Vec<SelectedField>) -> Self {
        self.selected = fields;
        self
    }

    pub fn source(&self) -> Option<&Value> {
        self.source.as_ref()
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn selected_fields(&self) -> &[SelectedField] {
        &self.selected
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    pub fn loaders(&self) -> &LoaderRegistry {
        &self.loaders
    }
}

/// A field-resolution callback the external engine invokes.
pub type FieldCallback = Arc<dyn Fn(&FieldEnv) -> Deferred + Send + Sync>;

/// One immutable binding of a GraphQL field to its callback.
pub struct FieldWiring {
    type_name: String,
    field_name: String,
    callback: FieldCallback,
}

impl FieldWiring {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn callback(&self) -> &FieldCallback {
        &self.callback
    }
}

/// The engine-facing wiring value: callbacks grouped by GraphQL type.
#[derive(Default)]
pub struct RuntimeWiring {
    types: IndexMap<String, IndexMap<String, FieldCallback>>,
}

impl RuntimeWiring {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&mut self, type_name: &str, field_name: &str, callback: FieldCallback) {
        self.types
            .entry(type_name.to_string())
            .or_default()
            .insert(field_name.to_string(), callback);
    }

    /// Looks up the callback for a field.
    pub fn field_resolver(&self, type_name: &str, field_name: &str) -> Option<&FieldCallback> {
        self.types.get(type_name)?.get(field_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn field_count(&self) -> usize {
        self.types.values().map(IndexMap::len).sum()
    }
}

/// The build-once registry of field wirings and loader factories.
///
/// Immutable after build and safe for unsynchronized concurrent reads;
/// request-scoped state lives entirely in the loaders it decorates.
pub struct Registry {
    wirings: Vec<FieldWiring>,
    loader_factories: Vec<LoaderFactory>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("wirings", &self.wirings.len())
            .field("loader_factories", &self.loader_factories.len())
            .finish()
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registers one field-resolution callback per binding, grouped by type.
    pub fn decorate_runtime_wiring(&self, wiring: &mut RuntimeWiring) {
        for field_wiring in &self.wirings {
            wiring.register(
                &field_wiring.type_name,
                &field_wiring.field_name,
                Arc::clone(&field_wiring.callback),
            );
        }
    }

    /// Registers one fresh loader per batched binding. Call once per request
    /// with that request's registry.
    pub fn decorate_loader_registry(&self, registry: &mut LoaderRegistry) {
        for factory in &self.loader_factories {
            registry.register(factory.create());
        }
    }

    pub fn wirings(&self) -> &[FieldWiring] {
        &self.wirings
    }

    pub fn loader_factories(&self) -> &[LoaderFactory] {
        &self.loader_factories
    }
}

/// Builds a [`Registry`] from resolver objects and a converter set.
pub struct RegistryBuilder {
    resolvers: Vec<Box<dyn TypeResolver>>,
    converters: Converters,
    root_types: BTreeSet<String>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self {
            resolvers: Vec::new(),
            converters: Converters::empty(),
            root_types: ["Query", "Mutation", "Subscription"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl RegistryBuilder {
    /// Adds a resolver object.
    pub fn resolver(mut self, resolver: impl TypeResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// Sets the converter set (defaults to empty).
    pub fn converters(mut self, converters: Converters) -> Self {
        self.converters = converters;
        self
    }

    /// Marks an additional type name as a root type (no source available).
    /// `Query`, `Mutation` and `Subscription` are root by default.
    pub fn root_type(mut self, name: impl Into<String>) -> Self {
        self.root_types.insert(name.into());
        self
    }

    /// Inspects every resolver and builds the immutable registry.
    ///
    /// Classification and duplicate detection happen here; any failure is a
    /// fatal configuration error and never surfaces per request.
    pub fn build(self) -> Result<Registry, ConfigError> {
        let converters = Arc::new(self.converters);
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut wirings = Vec::new();
        let mut loader_factories = Vec::new();

        for resolver in &self.resolvers {
            let type_name = resolver.type_name().to_string();
            let owner_is_root = self.root_types.contains(&type_name);
            for binding in resolver.fields() {
                let field_name = binding.field_name().to_string();
                if !seen.insert((type_name.clone(), field_name.clone())) {
                    return Err(ConfigError::DuplicateBinding {
                        type_name,
                        field_name,
                    });
                }
                let pattern = classify(&binding, &type_name, owner_is_root)?;
                trace!(
                    type_name = %type_name,
                    field_name = %field_name,
                    %pattern,
                    "classified field binding"
                );
                match binding.kind {
                    BindingKind::Simple(resolver_fn) => {
                        wirings.push(simple_wiring(
                            type_name.clone(),
                            field_name,
                            resolver_fn,
                            binding.selection_depth,
                            Arc::clone(&converters),
                        ));
                    }
                    BindingKind::Batched(batch_fn) => {
                        let loader_name = format!("{type_name}.{field_name}");
                        loader_factories.push(LoaderFactory::new(
                            loader_name.clone(),
                            batch_fn,
                            Arc::clone(&converters),
                        ));
                        wirings.push(batched_wiring(
                            type_name.clone(),
                            field_name,
                            loader_name,
                            binding.selection_depth,
                        ));
                    }
                }
            }
        }

        debug!(
            fields = wirings.len(),
            loaders = loader_factories.len(),
            "registry built"
        );
        Ok(Registry {
            wirings,
            loader_factories,
        })
    }
}

/// A wiring that invokes the resolver closure, then normalizes its return
/// value through the converter chain.
fn simple_wiring(
    type_name: String,
    field_name: String,
    resolver: ResolverFn,
    selection_depth: usize,
    converters: Arc<Converters>,
) -> FieldWiring {
    let callback: FieldCallback = Arc::new(move |env: &FieldEnv| {
        let selection = Selection::extract(env.selected_fields(), selection_depth);
        let invoked = resolver.invoke(env.source(), env.arguments(), &selection);
        let converters = Arc::clone(&converters);
        let context = env.context().clone();
        Box::pin(async move {
            match converters.convert(invoked?, &context).await? {
                Converted::Null => Ok(Value::Null),
                Converted::Value(value) => Ok(value),
                Converted::Other { type_name, .. } => {
                    Err(FieldError::Unconvertible { type_name })
                }
            }
        })
    });
    FieldWiring {
        type_name,
        field_name,
        callback,
    }
}

/// A wiring that enqueues a batch key on the request's loader and hands the
/// pending deferred back to the engine.
fn batched_wiring(
    type_name: String,
    field_name: String,
    loader_name: String,
    selection_depth: usize,
) -> FieldWiring {
    let callback: FieldCallback = Arc::new(move |env: &FieldEnv| {
        let Some(loader) = env.loaders().get(&loader_name) else {
            let loader_name = loader_name.clone();
            return Box::pin(async move {
                Err(FieldError::internal(format!(
                    "no loader registered for {loader_name}; \
                     was the loader registry decorated for this request?"
                )))
            });
        };
        let Some(source) = env.source() else {
            return Box::pin(async move {
                Err(FieldError::internal("batched field resolved without a source"))
            });
        };
        let key = BatchKey::new(
            source.clone(),
            env.arguments().clone(),
            Selection::extract(env.selected_fields(), selection_depth),
            env.context().clone(),
        );
        loader.load(key)
    });
    FieldWiring {
        type_name,
        field_name,
        callback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{BatchFn, FieldBinding, ResolverFn};
    use gqlbind_core::ResolvedValue;
    use serde_json::json;

    struct QueryResolver;

    impl TypeResolver for QueryResolver {
        fn type_name(&self) -> &str {
            "Query"
        }

        fn fields(&self) -> Vec<FieldBinding> {
            vec![FieldBinding::new(
                "greeting",
                ResolverFn::arguments(|arguments| {
                    let name: String = arguments.get("name")?;
                    ResolvedValue::json(format!("hello {name}"))
                }),
            )]
        }
    }

    struct BlogResolver;

    impl TypeResolver for BlogResolver {
        fn type_name(&self) -> &str {
            "Blog"
        }

        fn fields(&self) -> Vec<FieldBinding> {
            vec![
                FieldBinding::new("name", ResolverFn::source(|source| {
                    ResolvedValue::json(source.get("name").cloned().unwrap_or(Value::Null))
                })),
                FieldBinding::batched("articles", BatchFn::sources(|_| Ok(ResolvedValue::null()))),
            ]
        }
    }

    fn request() -> (RequestContext, Arc<LoaderRegistry>) {
        (RequestContext::new(), Arc::new(LoaderRegistry::new()))
    }

    #[test]
    fn builds_wirings_grouped_by_type() {
        let registry = Registry::builder()
            .resolver(QueryResolver)
            .resolver(BlogResolver)
            .build()
            .unwrap();
        let mut wiring = RuntimeWiring::new();
        registry.decorate_runtime_wiring(&mut wiring);
        assert_eq!(wiring.field_count(), 3);
        assert!(wiring.field_resolver("Query", "greeting").is_some());
        assert!(wiring.field_resolver("Blog", "articles").is_some());
        assert!(wiring.field_resolver("Blog", "missing").is_none());
    }

    #[test]
    fn duplicate_bindings_fail_the_build() {
        let error = Registry::builder()
            .resolver(QueryResolver)
            .resolver(QueryResolver)
            .build()
            .unwrap_err();
        assert!(matches!(error, ConfigError::DuplicateBinding { .. }));
    }

    #[test]
    fn decorates_one_loader_per_batched_binding() {
        let registry = Registry::builder().resolver(BlogResolver).build().unwrap();
        let mut loaders = LoaderRegistry::new();
        registry.decorate_loader_registry(&mut loaders);
        assert_eq!(loaders.len(), 1);
        assert!(loaders.get("Blog.articles").is_some());
    }

    #[tokio::test]
    async fn simple_field_resolves_through_the_callback() {
        let registry = Registry::builder().resolver(QueryResolver).build().unwrap();
        let mut wiring = RuntimeWiring::new();
        registry.decorate_runtime_wiring(&mut wiring);
        let callback = wiring.field_resolver("Query", "greeting").unwrap();
        let (context, loaders) = request();
        let env = FieldEnv::new(context, loaders)
            .with_arguments(Arguments::from_pairs([("name", json!("ada"))]));
        let value = callback(&env).await.unwrap();
        assert_eq!(value, json!("hello ada"));
    }

    #[tokio::test]
    async fn resolver_errors_reach_the_deferred_not_the_caller() {
        struct FailingResolver;
        impl TypeResolver for FailingResolver {
            fn type_name(&self) -> &str {
                "Query"
            }
            fn fields(&self) -> Vec<FieldBinding> {
                vec![FieldBinding::new(
                    "boom",
                    ResolverFn::no_args(|| Err(FieldError::custom("exploded"))),
                )]
            }
        }
        let registry = Registry::builder()
            .resolver(FailingResolver)
            .build()
            .unwrap();
        let mut wiring = RuntimeWiring::new();
        registry.decorate_runtime_wiring(&mut wiring);
        let callback = wiring.field_resolver("Query", "boom").unwrap();
        let (context, loaders) = request();
        let deferred = callback(&FieldEnv::new(context, loaders));
        let error = deferred.await.unwrap_err();
        assert_eq!(error.to_string(), "exploded");
    }

    #[tokio::test]
    async fn batched_field_without_a_decorated_loader_fails_internally() {
        let registry = Registry::builder().resolver(BlogResolver).build().unwrap();
        let mut wiring = RuntimeWiring::new();
        registry.decorate_runtime_wiring(&mut wiring);
        let callback = wiring.field_resolver("Blog", "articles").unwrap();
        let (context, loaders) = request();
        let env = FieldEnv::new(context, loaders).with_source(json!({"id": 1}));
        let error = callback(&env).await.unwrap_err();
        assert!(matches!(error, FieldError::Internal(_)));
    }

    #[test]
    fn custom_root_types_are_validated() {
        struct CustomRoot;
        impl TypeResolver for CustomRoot {
            fn type_name(&self) -> &str {
                "Viewer"
            }
            fn fields(&self) -> Vec<FieldBinding> {
                vec![FieldBinding::new(
                    "me",
                    ResolverFn::source(|_| Ok(ResolvedValue::null())),
                )]
            }
        }
        // Without the root marker the source-taking binding is fine.
        assert!(Registry::builder().resolver(CustomRoot).build().is_ok());
        let error = Registry::builder()
            .resolver(CustomRoot)
            .root_type("Viewer")
            .build()
            .unwrap_err();
        assert!(matches!(error, ConfigError::RootSourceBinding { .. }));
    }
}
