//! The argument map handed to resolvers.
//!
//! Arguments are treated by value equality, with a `Hash` consistent with
//! `Eq`, because the `(arguments, selection)` pair discriminates which
//! pending batch keys may share one invocation. Absence, explicit null and a
//! concrete value are three distinct states, surfaced by the
//! `get`/`get_optional`/`get_nullable` triad.

use crate::error::FieldError;
use crate::value::hash_value;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An ordered name-to-value argument map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    values: BTreeMap<String, Value>,
}

impl Arguments {
    /// An empty argument map.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds arguments from name/value pairs.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        }
    }

    /// Builds arguments from a canonical object value; non-objects yield an
    /// empty map.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(entries) => Self {
                values: entries.into_iter().collect(),
            },
            _ => Self::empty(),
        }
    }

    fn raw(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    fn parse<T: DeserializeOwned>(name: &str, value: &Value) -> Result<T, FieldError> {
        serde_json::from_value(value.clone()).map_err(|e| FieldError::ArgumentParse {
            name: name.to_string(),
            message: e.to_string(),
        })
    }

    /// Gets a required argument; absent or explicitly null is an error.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, FieldError> {
        match self.raw(name) {
            None | Some(Value::Null) => Err(FieldError::MissingArgument(name.to_string())),
            Some(value) => Self::parse(name, value),
        }
    }

    /// Gets an argument that may be absent or null.
    pub fn get_optional<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, FieldError> {
        match self.raw(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Self::parse(name, value).map(Some),
        }
    }

    /// Gets an argument distinguishing absence from explicit null: the outer
    /// `None` means the argument was not supplied at all, `Some(None)` means
    /// it was supplied as null.
    pub fn get_nullable<T: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<Option<T>>, FieldError> {
        match self.raw(name) {
            None => Ok(None),
            Some(Value::Null) => Ok(Some(None)),
            Some(value) => Self::parse(name, value).map(|parsed| Some(Some(parsed))),
        }
    }

    /// Gets a required nested input object as arguments.
    pub fn input(&self, name: &str) -> Result<Arguments, FieldError> {
        match self.raw(name) {
            None | Some(Value::Null) => Err(FieldError::MissingArgument(name.to_string())),
            Some(value @ Value::Object(_)) => Ok(Self::from_value(value.clone())),
            Some(other) => Err(FieldError::ArgumentParse {
                name: name.to_string(),
                message: format!("expected an input object, got {other}"),
            }),
        }
    }

    /// Gets an optional nested input object.
    pub fn optional_input(&self, name: &str) -> Result<Option<Arguments>, FieldError> {
        match self.raw(name) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.input(name).map(Some),
        }
    }

    /// Gets a required array of nested input objects.
    pub fn input_array(&self, name: &str) -> Result<Vec<Arguments>, FieldError> {
        match self.raw(name) {
            None | Some(Value::Null) => Err(FieldError::MissingArgument(name.to_string())),
            Some(Value::Array(items)) => Ok(items
                .iter()
                .map(|item| Self::from_value(item.clone()))
                .collect()),
            Some(other) => Err(FieldError::ArgumentParse {
                name: name.to_string(),
                message: format!("expected an array of input objects, got {other}"),
            }),
        }
    }

    /// Whether the argument was supplied, even as null.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Hash for Arguments {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.values.len().hash(state);
        for (key, value) in &self.values {
            key.hash(state);
            hash_value(value, state);
        }
    }
}

impl fmt::Display for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.values {
            map.entry(key, &value.to_string());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::hash_map::DefaultHasher;

    fn args() -> Arguments {
        Arguments::from_pairs([
            ("present", json!("value")),
            ("null", json!(null)),
            ("count", json!(3)),
            ("input", json!({"inner": "x"})),
            ("inputs", json!([{"inner": "a"}, {"inner": "b"}])),
        ])
    }

    #[test]
    fn required_argument() {
        assert_eq!(args().get::<String>("present").unwrap(), "value");
        assert_eq!(args().get::<i64>("count").unwrap(), 3);
    }

    #[test]
    fn required_argument_rejects_absent_and_null() {
        let error = args().get::<String>("missing").unwrap_err();
        assert_eq!(error.to_string(), "'missing' must not be null");
        assert!(args().get::<String>("null").is_err());
    }

    #[test]
    fn optional_argument() {
        assert_eq!(
            args().get_optional::<String>("present").unwrap(),
            Some("value".to_string())
        );
        assert_eq!(args().get_optional::<String>("null").unwrap(), None);
        assert_eq!(args().get_optional::<String>("missing").unwrap(), None);
    }

    #[test]
    fn nullable_distinguishes_absent_from_null() {
        assert_eq!(args().get_nullable::<String>("missing").unwrap(), None);
        assert_eq!(args().get_nullable::<String>("null").unwrap(), Some(None));
        assert_eq!(
            args().get_nullable::<String>("present").unwrap(),
            Some(Some("value".to_string()))
        );
    }

    #[test]
    fn nested_input() {
        let input = args().input("input").unwrap();
        assert_eq!(input.get::<String>("inner").unwrap(), "x");
        assert!(args().input("missing").is_err());
        assert_eq!(args().optional_input("missing").unwrap(), None);
    }

    #[test]
    fn nested_input_array() {
        let inputs = args().input_array("inputs").unwrap();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[1].get::<String>("inner").unwrap(), "b");
    }

    #[test]
    fn parse_failure_names_the_argument() {
        let error = args().get::<i64>("present").unwrap_err();
        assert!(error.to_string().contains("present"));
    }

    #[test]
    fn equal_arguments_hash_equally() {
        let a = Arguments::from_pairs([("x", json!(1)), ("y", json!("z"))]);
        let b = Arguments::from_pairs([("y", json!("z")), ("x", json!(1))]);
        assert_eq!(a, b);
        let mut ha = DefaultHasher::new();
        let mut hb = DefaultHasher::new();
        a.hash(&mut ha);
        b.hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());
    }
}
