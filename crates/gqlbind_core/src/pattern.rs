//! The closed set of resolver invocation shapes.

use std::fmt;

/// The parts a resolver callable declares, fixed once at registration.
///
/// Batched resolvers reuse the source-bearing patterns, with the source
/// position carrying the deduplicated set of parent objects instead of a
/// single one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationPattern {
    /// `()`
    NoArgs,
    /// `(source)`
    SourceOnly,
    /// `(arguments)`
    ArgumentsOnly,
    /// `(selection)`
    SelectionOnly,
    /// `(source, arguments)`
    SourceAndArguments,
    /// `(source, selection)`
    SourceAndSelection,
    /// `(arguments, selection)`
    ArgumentsAndSelection,
    /// `(source, arguments, selection)`
    SourceArgumentsSelection,
}

impl InvocationPattern {
    /// Whether this pattern declares a source parameter.
    pub fn has_source(self) -> bool {
        matches!(
            self,
            Self::SourceOnly
                | Self::SourceAndArguments
                | Self::SourceAndSelection
                | Self::SourceArgumentsSelection
        )
    }

    /// Whether this pattern declares an arguments parameter.
    pub fn has_arguments(self) -> bool {
        matches!(
            self,
            Self::ArgumentsOnly
                | Self::SourceAndArguments
                | Self::ArgumentsAndSelection
                | Self::SourceArgumentsSelection
        )
    }

    /// Whether this pattern declares a selection parameter.
    pub fn has_selection(self) -> bool {
        matches!(
            self,
            Self::SelectionOnly
                | Self::SourceAndSelection
                | Self::ArgumentsAndSelection
                | Self::SourceArgumentsSelection
        )
    }
}

impl fmt::Display for InvocationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoArgs => "no-argument",
            Self::SourceOnly => "source-only",
            Self::ArgumentsOnly => "arguments-only",
            Self::SelectionOnly => "selection-only",
            Self::SourceAndArguments => "source and arguments",
            Self::SourceAndSelection => "source and selection",
            Self::ArgumentsAndSelection => "arguments and selection",
            Self::SourceArgumentsSelection => "source, arguments and selection",
        };
        f.write_str(name)
    }
}
