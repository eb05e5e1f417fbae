//! Requested sub-field extraction.
//!
//! The external engine hands in the requested sub-field tree below the field
//! being resolved; [`Selection::extract`] flattens it into a set of relative
//! paths within a depth bound. Paths at depth two and beyond join segments
//! with `/`, so a query selecting `self { value }` at depth 2 yields
//! `{"self", "self/value"}` alongside the immediate children.

use std::collections::BTreeSet;
use std::fmt;

/// The path separator between nested field segments.
pub const PATH_SEPARATOR: char = '/';

/// One node of the requested sub-field tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedField {
    pub name: String,
    pub children: Vec<SelectedField>,
}

impl SelectedField {
    /// A leaf field with no sub-selection.
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// A field with a nested sub-selection.
    pub fn with_children(name: impl Into<String>, children: Vec<SelectedField>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }
}

/// An immutable set of relative field paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Selection {
    fields: BTreeSet<String>,
}

impl Selection {
    /// An empty selection.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a selection from explicit paths.
    pub fn of<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Flattens the requested tree into paths reachable within `depth`
    /// levels. Depth 1 keeps only immediate children.
    pub fn extract(tree: &[SelectedField], depth: usize) -> Self {
        let mut fields = BTreeSet::new();
        if depth > 0 {
            collect(tree, depth, "", &mut fields);
        }
        Self { fields }
    }

    pub fn size(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.fields.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Restricts the selection to paths starting with `prefix`, stripping it.
    ///
    /// Matching is by raw string prefix, not by path segment: a prefix of
    /// `"bar"` also matches `"barrel/x"`.
    pub fn sub_selection(&self, prefix: &str) -> Selection {
        Self {
            fields: self
                .fields
                .iter()
                .filter_map(|field| field.strip_prefix(prefix))
                .map(String::from)
                .collect(),
        }
    }
}

fn collect(tree: &[SelectedField], depth: usize, prefix: &str, out: &mut BTreeSet<String>) {
    for field in tree {
        let path = if prefix.is_empty() {
            field.name.clone()
        } else {
            format!("{prefix}{PATH_SEPARATOR}{}", field.name)
        };
        if depth > 1 {
            collect(&field.children, depth - 1, &path, out);
        }
        out.insert(path);
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.fields.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
