//! Error types for gqlbind.
//!
//! Two failure domains exist and never mix: [`ConfigError`] is raised while a
//! registry is being built and is fatal at startup; [`FieldError`] is captured
//! into a field's deferred value at request time and surfaces as a per-field
//! GraphQL error.

use crate::pattern::InvocationPattern;
use thiserror::Error;

/// A fatal configuration error detected while building a registry.
///
/// These never surface on the request path: a registry that builds
/// successfully cannot produce them afterwards.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Two bindings claim the same `(type, field)` pair.
    #[error("duplicate resolver binding for {type_name}.{field_name}")]
    DuplicateBinding {
        type_name: String,
        field_name: String,
    },

    /// A root-type binding declared a source parameter.
    #[error(
        "{type_name}.{field_name} resolves a root type and must not take a source: \
         the {pattern} shape is unavailable, root resolvers accept at most (arguments, selection)"
    )]
    RootSourceBinding {
        type_name: String,
        field_name: String,
        pattern: InvocationPattern,
    },

    /// A batched binding was registered on a root type, which has no parent
    /// sources to batch over.
    #[error(
        "{type_name}.{field_name} is batched but resolves a root type: \
         batched resolvers require a set of parent sources and root fields have none"
    )]
    BatchedRootBinding {
        type_name: String,
        field_name: String,
    },

    /// Two converters were registered for the same runtime type.
    #[error("a converter is already registered for type {type_name}")]
    DuplicateConverter { type_name: &'static str },
}

/// A per-field runtime error.
///
/// `Clone` because a failing batch invocation fans the same error out to
/// every pending key in its discriminator group.
#[derive(Debug, Clone, Error)]
pub enum FieldError {
    /// A required argument was absent or explicitly null.
    #[error("'{0}' must not be null")]
    MissingArgument(String),

    /// An argument was present but could not be deserialized.
    #[error("failed to parse argument '{name}': {message}")]
    ArgumentParse { name: String, message: String },

    /// A batch result map omitted one of the sources it was invoked with.
    #[error("batch result is missing an entry for source {source_key}")]
    MissingBatchResult { source_key: String },

    /// The converter chain terminated on a value the engine cannot represent.
    #[error("no converter produced a representable value for type {type_name}")]
    Unconvertible { type_name: &'static str },

    /// A batched resolver's result did not normalize to a batch map.
    #[error("batched resolver result did not normalize to a batch map: {0}")]
    InvalidBatchResult(String),

    /// A value could not be serialized into the canonical representation.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A user-raised resolver error.
    #[error("{0}")]
    Custom(String),

    /// A violation of an internal invariant.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FieldError {
    /// Creates a user-facing resolver error.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Creates an internal invariant-violation error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_the_binding() {
        let error = ConfigError::DuplicateBinding {
            type_name: "Blog".to_string(),
            field_name: "articles".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "duplicate resolver binding for Blog.articles"
        );
    }

    #[test]
    fn root_source_error_names_the_pattern() {
        let error = ConfigError::RootSourceBinding {
            type_name: "Query".to_string(),
            field_name: "blogs".to_string(),
            pattern: InvocationPattern::SourceAndArguments,
        };
        let message = error.to_string();
        assert!(message.contains("Query.blogs"));
        assert!(message.contains("source and arguments"));
    }

    #[test]
    fn missing_argument_message() {
        let error = FieldError::MissingArgument("name".to_string());
        assert_eq!(error.to_string(), "'name' must not be null");
    }
}
