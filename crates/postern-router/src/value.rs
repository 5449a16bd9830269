//! Parameter values and ordered parameter bags.
//!
//! Route defaults, reverse-routing specs and parse results are all loosely
//! typed maps: a key is either a positional index (a "pass" argument) or a
//! name, and a value may be null, a flag, a number, text, or a collection.
//! Comparisons between defaults and supplied values are *loose* so that
//! `"5"` matches `5` and an absent plugin (`null`) matches an empty one.

use std::borrow::Cow;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// A single parameter value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Explicitly unset (e.g. the `plugin` default of every route).
    #[default]
    Null,
    /// A flag, used for prefix switches such as `admin: true`.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// Text.
    Str(String),
    /// A list, used for header-guard alternatives.
    List(Vec<Value>),
    /// A nested map, used for query strings.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// "Empty" semantics: null, false, `""`, `"0"`, `0` and empty
    /// collections are empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::Str(s) => s.is_empty() || s == "0",
            Value::List(l) => l.is_empty(),
            Value::Map(m) => m.is_empty(),
        }
    }

    /// Like `!is_empty()`, but keeps zero (`0` and `"0"`) as a real value.
    pub fn is_present(&self) -> bool {
        match self {
            Value::Int(0) => true,
            Value::Str(s) if s == "0" => true,
            _ => !self.is_empty(),
        }
    }

    /// Borrow the inner string of a `Str` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the inner map of a `Map` value.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Textual rendering used when a value is written into a URL.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed(""),
            Value::Bool(true) => Cow::Borrowed("1"),
            Value::Bool(false) => Cow::Borrowed(""),
            Value::Int(i) => Cow::Owned(i.to_string()),
            Value::Str(s) => Cow::Borrowed(s),
            Value::List(items) => Cow::Owned(
                items
                    .iter()
                    .map(|v| v.text().into_owned())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            Value::Map(map) => Cow::Owned(
                map.values()
                    .map(|v| v.text().into_owned())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
        }
    }

    /// Loose equality across scalar types.
    ///
    /// `null == "" == false == 0`, numeric text compares numerically, and a
    /// boolean compares against the truthiness of the other side.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, v) | (v, Value::Null) => match v {
                Value::Str(s) => s.is_empty(),
                Value::Bool(b) => !b,
                Value::Int(i) => *i == 0,
                Value::List(l) => l.is_empty(),
                Value::Map(m) => m.is_empty(),
                Value::Null => true,
            },
            (Value::Bool(b), v) | (v, Value::Bool(b)) => *b == !v.is_empty(),
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Int(i), Value::Str(s)) | (Value::Str(s), Value::Int(i)) => {
                match numeric(s) {
                    Some(n) => n == *i as f64,
                    None => s == &i.to_string(),
                }
            }
            (Value::Str(a), Value::Str(b)) => match (numeric(a), numeric(b)) {
                (Some(x), Some(y)) => x == y,
                _ => a == b,
            },
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|other| v.loose_eq(other)))
            }
            _ => false,
        }
    }
}

fn numeric(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::List(items.into_iter().map(Value::from).collect())
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items.into_iter().map(Value::Str).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// A parameter key: a positional index or a name.
///
/// Indices order before names, so iterating a [`Params`] yields the pass
/// arguments first, in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// Positional argument.
    Index(usize),
    /// Named parameter.
    Name(String),
}

impl Key {
    /// The key's name, if it is a named key.
    pub fn name(&self) -> Option<&str> {
        match self {
            Key::Name(n) => Some(n),
            Key::Index(_) => None,
        }
    }

    /// The key's position, if it is an index.
    pub fn index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Name(_) => None,
        }
    }

    /// Returns true for positional keys.
    pub fn is_index(&self) -> bool {
        matches!(self, Key::Index(_))
    }
}

/// Canonical decimal integers (`"0"`, `"12"`, not `"012"`) become indices.
impl From<&str> for Key {
    fn from(s: &str) -> Self {
        let canonical = !s.is_empty()
            && s.bytes().all(|b| b.is_ascii_digit())
            && (s == "0" || !s.starts_with('0'));
        if canonical {
            if let Ok(i) = s.parse::<usize>() {
                return Key::Index(i);
            }
        }
        Key::Name(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::from(s.as_str())
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::from(s.as_str())
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i)
    }
}

impl From<&Key> for Key {
    fn from(k: &Key) -> Self {
        k.clone()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{}", i),
            Key::Name(n) => f.write_str(n),
        }
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = Key;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a parameter name or a non-negative index")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Key, E> {
                Ok(Key::from(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Key, E> {
                usize::try_from(v)
                    .map(Key::Index)
                    .map_err(|_| E::custom("index out of range"))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Key, E> {
                match usize::try_from(v) {
                    Ok(i) => Ok(Key::Index(i)),
                    Err(_) => Ok(Key::Name(v.to_string())),
                }
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

/// An ordered parameter bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<Key, Value>);

impl Params {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<Key>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Insert only when the key is absent (a null value counts as present).
    pub fn insert_default(&mut self, key: impl Into<Key>, value: impl Into<Value>) {
        self.0.entry(key.into()).or_insert_with(|| value.into());
    }

    /// Look up a value.
    pub fn get(&self, key: impl Into<Key>) -> Option<&Value> {
        self.0.get(&key.into())
    }

    /// Text of a non-null value.
    pub fn text(&self, key: impl Into<Key>) -> Option<Cow<'_, str>> {
        self.get(key).filter(|v| !v.is_null()).map(Value::text)
    }

    /// Returns true when the key exists, even with a null value.
    pub fn contains(&self, key: impl Into<Key>) -> bool {
        self.0.contains_key(&key.into())
    }

    /// Returns true when the key exists with a non-null value.
    pub fn is_set(&self, key: impl Into<Key>) -> bool {
        self.get(key).is_some_and(|v| !v.is_null())
    }

    /// Remove a value.
    pub fn remove(&mut self, key: impl Into<Key>) -> Option<Value> {
        self.0.remove(&key.into())
    }

    /// Iterate in key order: indices first, then names.
    pub fn iter(&self) -> btree_map::Iter<'_, Key, Value> {
        self.0.iter()
    }

    /// Iterate the keys.
    pub fn keys(&self) -> btree_map::Keys<'_, Key, Value> {
        self.0.keys()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Retain entries matching a predicate.
    pub fn retain(&mut self, f: impl FnMut(&Key, &mut Value) -> bool) {
        self.0.retain(f);
    }
}

impl<K: Into<Key>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Params(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<Key>, V: Into<Value>> Extend<(K, V)> for Params {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.0.insert(k.into(), v.into());
        }
    }
}

impl IntoIterator for Params {
    type Item = (Key, Value);
    type IntoIter = btree_map::IntoIter<Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a Key, &'a Value);
    type IntoIter = btree_map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_strings_become_indices() {
        assert_eq!(Key::from("0"), Key::Index(0));
        assert_eq!(Key::from("12"), Key::Index(12));
        assert_eq!(Key::from("012"), Key::Name("012".into()));
        assert_eq!(Key::from("page"), Key::Name("page".into()));
    }

    #[test]
    fn indices_sort_before_names() {
        let params = Params::new()
            .with("controller", "posts")
            .with(10usize, "b")
            .with(2usize, "a");
        let keys: Vec<String> = params.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["2", "10", "controller"]);
    }

    #[test]
    fn empty_and_present() {
        assert!(Value::Str("0".into()).is_empty());
        assert!(Value::Str("0".into()).is_present());
        assert!(Value::Int(0).is_present());
        assert!(!Value::Null.is_present());
        assert!(!Value::Bool(false).is_present());
        assert!(!Value::Str(String::new()).is_present());
    }

    #[test]
    fn loose_equality() {
        assert!(Value::Null.loose_eq(&Value::Str(String::new())));
        assert!(!Value::Null.loose_eq(&Value::Str("0".into())));
        assert!(Value::Int(5).loose_eq(&Value::from("5")));
        assert!(Value::from("5").loose_eq(&Value::from("5.0")));
        assert!(Value::Bool(true).loose_eq(&Value::from("admin")));
        assert!(!Value::from("posts").loose_eq(&Value::from("users")));
    }

    #[test]
    fn set_versus_contains() {
        let params = Params::new().with("plugin", Value::Null);
        assert!(params.contains("plugin"));
        assert!(!params.is_set("plugin"));
        assert!(params.text("plugin").is_none());
    }

    #[test]
    fn deserializes_integer_keys() {
        let params: Params =
            serde_json::from_str(r#"{"controller":"pages","0":"home","admin":true}"#).unwrap();
        assert_eq!(params.get(0usize), Some(&Value::from("home")));
        assert_eq!(params.get("admin"), Some(&Value::Bool(true)));
    }
}
