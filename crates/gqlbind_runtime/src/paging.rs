//! Relay-style cursor pagination.
//!
//! A self-contained helper implementing the connection model from
//! <https://relay.dev/graphql/connections.htm>. [`Connection::build`] expects
//! the caller to overfetch: with an `after` cursor, fetch `first + 2` edges
//! starting *at* the cursor (the matching edge plus one trailing edge); with
//! no cursor, fetch `first + 1`. The surplus edges exist only to decide the
//! page-info flags and are trimmed from the result.

use gqlbind_core::{Arguments, FieldError};
use serde::Serialize;

/// One edge of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge<T> {
    pub cursor: String,
    pub node: T,
}

impl<T> Edge<T> {
    pub fn new(cursor: impl Into<String>, node: T) -> Self {
        Self {
            cursor: cursor.into(),
            node,
        }
    }
}

/// Page flags and boundary cursors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

/// The standard forward-pagination arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageArguments {
    pub first: usize,
    pub after: Option<String>,
}

impl PageArguments {
    pub fn new(first: usize, after: Option<String>) -> Self {
        Self { first, after }
    }

    /// Reads `first` (required) and `after` (optional) from a field's
    /// arguments.
    pub fn from_arguments(arguments: &Arguments) -> Result<Self, FieldError> {
        Ok(Self {
            first: arguments.get("first")?,
            after: arguments.get_optional("after")?,
        })
    }
}

/// A page of edges with its paging metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub total_count: u64,
    pub page_info: PageInfo,
    pub edges: Vec<Edge<T>>,
}

impl<T> Connection<T> {
    /// A connection with no edges and no pages.
    pub fn empty() -> Self {
        Self {
            total_count: 0,
            page_info: PageInfo::default(),
            edges: Vec::new(),
        }
    }

    /// Maps every node, keeping cursors and paging metadata.
    pub fn map_nodes<U>(self, mapper: impl Fn(T) -> U) -> Connection<U> {
        self.map_edges(|edge| Edge::new(edge.cursor, mapper(edge.node)))
    }

    /// Maps every edge, keeping paging metadata.
    pub fn map_edges<U>(self, mapper: impl Fn(Edge<T>) -> Edge<U>) -> Connection<U> {
        Connection {
            total_count: self.total_count,
            page_info: self.page_info,
            edges: self.edges.into_iter().map(mapper).collect(),
        }
    }

    /// Builds a page from overfetched edges (see the module docs for the
    /// expected overfetch protocol).
    pub fn build(total_count: u64, edges: Vec<Edge<T>>, arguments: &PageArguments) -> Self {
        match &arguments.after {
            Some(after) => {
                let mut edges = edges;
                let has_previous_page = edges
                    .first()
                    .map(|edge| &edge.cursor == after)
                    .unwrap_or(false);
                if has_previous_page {
                    edges.remove(0);
                }
                if edges.is_empty() {
                    return Self {
                        total_count,
                        page_info: PageInfo {
                            has_previous_page: true,
                            ..PageInfo::default()
                        },
                        edges: Vec::new(),
                    };
                }
                Self::finish(total_count, edges, arguments.first, has_previous_page)
            }
            None => Self::finish(total_count, edges, arguments.first, false),
        }
    }

    fn finish(
        total_count: u64,
        mut edges: Vec<Edge<T>>,
        first: usize,
        has_previous_page: bool,
    ) -> Self {
        let has_next_page = edges.len() > first;
        if has_next_page {
            edges.truncate(first);
        }
        let page_info = PageInfo {
            has_previous_page,
            has_next_page,
            start_cursor: edges.first().map(|edge| edge.cursor.clone()),
            end_cursor: edges.last().map(|edge| edge.cursor.clone()),
        };
        Self {
            total_count,
            page_info,
            edges,
        }
    }
}

impl<T: Ord> Connection<T> {
    /// Merges pre-paged connections into one page of at most `max_size`
    /// edges, ordered by node. A single input connection passes through
    /// untouched.
    pub fn merge(mut connections: Vec<Connection<T>>, max_size: usize) -> Self {
        if connections.is_empty() {
            return Self::empty();
        }
        if connections.len() == 1 {
            return connections.remove(0);
        }
        let total_count: u64 = connections
            .iter()
            .map(|connection| connection.total_count)
            .sum();
        if total_count == 0 {
            return Self::empty();
        }
        let has_previous_page = connections
            .iter()
            .any(|connection| connection.page_info.has_previous_page);
        let mut has_next_page = connections
            .iter()
            .any(|connection| connection.page_info.has_next_page);
        let mut edges: Vec<Edge<T>> = connections
            .into_iter()
            .flat_map(|connection| connection.edges)
            .collect();
        edges.sort_by(|a, b| a.node.cmp(&b.node));
        if edges.len() > max_size {
            edges.truncate(max_size);
            has_next_page = true;
        }
        let page_info = PageInfo {
            has_previous_page,
            has_next_page,
            start_cursor: edges.first().map(|edge| edge.cursor.clone()),
            end_cursor: edges.last().map(|edge| edge.cursor.clone()),
        };
        Self {
            total_count,
            page_info,
            edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn edge(n: i64) -> Edge<i64> {
        Edge::new(format!("c{n}"), n)
    }

    fn args(first: usize, after: Option<&str>) -> PageArguments {
        PageArguments::new(first, after.map(String::from))
    }

    #[test]
    fn empty() {
        let connection: Connection<i64> = Connection::empty();
        assert_eq!(connection.total_count, 0);
        assert_eq!(connection.page_info, PageInfo::default());
        assert!(connection.edges.is_empty());
    }

    #[test]
    fn single_page() {
        let connection = Connection::build(42, vec![edge(1)], &args(2, None));
        assert_eq!(connection.total_count, 42);
        assert!(!connection.page_info.has_previous_page);
        assert!(!connection.page_info.has_next_page);
        assert_eq!(connection.page_info.start_cursor.as_deref(), Some("c1"));
        assert_eq!(connection.page_info.end_cursor.as_deref(), Some("c1"));
        assert_eq!(connection.edges, vec![edge(1)]);
    }

    #[test]
    fn next_page() {
        let connection = Connection::build(42, vec![edge(1), edge(2), edge(3)], &args(2, None));
        assert!(!connection.page_info.has_previous_page);
        assert!(connection.page_info.has_next_page);
        assert_eq!(connection.page_info.start_cursor.as_deref(), Some("c1"));
        assert_eq!(connection.page_info.end_cursor.as_deref(), Some("c2"));
        assert_eq!(connection.edges, vec![edge(1), edge(2)]);
    }

    #[test]
    fn single_page_after_not_found() {
        let connection = Connection::build(42, vec![edge(2)], &args(2, Some("c1")));
        assert!(!connection.page_info.has_previous_page);
        assert!(!connection.page_info.has_next_page);
        assert_eq!(connection.edges, vec![edge(2)]);
    }

    #[test]
    fn next_page_after_not_found() {
        let connection =
            Connection::build(42, vec![edge(2), edge(3), edge(4)], &args(2, Some("c1")));
        assert!(!connection.page_info.has_previous_page);
        assert!(connection.page_info.has_next_page);
        assert_eq!(connection.edges, vec![edge(2), edge(3)]);
    }

    #[test]
    fn empty_after_found() {
        let connection = Connection::build(42, vec![edge(1)], &args(2, Some("c1")));
        assert!(connection.page_info.has_previous_page);
        assert!(!connection.page_info.has_next_page);
        assert_eq!(connection.page_info.start_cursor, None);
        assert_eq!(connection.page_info.end_cursor, None);
        assert!(connection.edges.is_empty());
    }

    #[test]
    fn single_page_after_found() {
        let connection = Connection::build(42, vec![edge(1), edge(2)], &args(2, Some("c1")));
        assert!(connection.page_info.has_previous_page);
        assert!(!connection.page_info.has_next_page);
        assert_eq!(connection.edges, vec![edge(2)]);
    }

    #[test]
    fn next_page_after_found() {
        let connection = Connection::build(
            42,
            vec![edge(1), edge(2), edge(3), edge(4)],
            &args(2, Some("c1")),
        );
        assert!(connection.page_info.has_previous_page);
        assert!(connection.page_info.has_next_page);
        assert_eq!(connection.edges, vec![edge(2), edge(3)]);
    }

    #[test]
    fn merge_orders_by_node_and_caps_the_page() {
        let left = Connection::build(2, vec![edge(1), edge(3)], &args(2, None));
        let right = Connection::build(2, vec![edge(2), edge(4)], &args(2, None));
        let merged = Connection::merge(vec![left, right], 3);
        assert_eq!(merged.total_count, 4);
        assert_eq!(
            merged.edges.iter().map(|e| e.node).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(merged.page_info.has_next_page);
        assert_eq!(merged.page_info.start_cursor.as_deref(), Some("c1"));
        assert_eq!(merged.page_info.end_cursor.as_deref(), Some("c3"));
    }

    #[test]
    fn merge_passthrough_and_empty_cases() {
        let only = Connection::build(1, vec![edge(1)], &args(2, None));
        assert_eq!(Connection::merge(vec![only.clone()], 10), only);
        assert_eq!(Connection::<i64>::merge(Vec::new(), 10), Connection::empty());
        let zero = Connection::<i64>::empty();
        assert_eq!(Connection::merge(vec![zero.clone(), zero], 10), Connection::empty());
    }

    #[test]
    fn map_nodes_keeps_cursors() {
        let connection = Connection::build(1, vec![edge(1)], &args(2, None));
        let mapped = connection.map_nodes(|n| n * 10);
        assert_eq!(mapped.edges[0].node, 10);
        assert_eq!(mapped.edges[0].cursor, "c1");
    }

    #[test]
    fn page_arguments_from_field_arguments() {
        let arguments =
            Arguments::from_pairs([("first", json!(5)), ("after", json!("cursor"))]);
        let page = PageArguments::from_arguments(&arguments).unwrap();
        assert_eq!(page.first, 5);
        assert_eq!(page.after.as_deref(), Some("cursor"));
        let missing = Arguments::empty();
        assert!(PageArguments::from_arguments(&missing).is_err());
    }
}
