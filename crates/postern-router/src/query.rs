//! Query-string and named-argument token helpers.

use std::collections::BTreeMap;

use crate::value::Value;

/// Default separator between a named argument's key and value.
pub const DEFAULT_SEPARATOR: &str = ":";

/// Split a `key<sep>value` token at the first separator.
pub fn split_named<'a>(token: &'a str, separator: &str) -> Option<(&'a str, &'a str)> {
    if separator.is_empty() {
        return None;
    }
    token.split_once(separator)
}

/// Join a named argument back into a path token.
pub fn join_named(key: &str, value: &str, separator: &str) -> String {
    format!("{}{}{}", key, separator, value)
}

/// Render a query string, including the leading `?`.
///
/// A string is used verbatim, a map is flattened (`key[sub]=value`) and
/// form-urlencoded. With `escape`, pairs are joined with `&amp;` for
/// embedding in HTML. Returns an empty string when there is nothing to add.
pub fn query_string(query: Option<&Value>, escape: bool) -> String {
    let join = if escape { "&amp;" } else { "&" };
    let out = match query {
        None => return String::new(),
        Some(Value::Map(map)) => {
            let mut pairs = Vec::new();
            flatten(map, None, &mut pairs);
            pairs
                .iter()
                .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
                .collect::<Vec<_>>()
                .join(join)
        }
        Some(value) if value.is_empty() => return String::new(),
        Some(value) => value.text().into_owned(),
    };

    if out.is_empty() || out.starts_with('?') {
        out
    } else {
        format!("?{}", out)
    }
}

/// Decode a query string (with or without the leading `?`) into pairs.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Form-urlencode a single component (spaces become `+`).
pub fn encode(component: &str) -> String {
    form_urlencoded::byte_serialize(component.as_bytes()).collect()
}

fn flatten(map: &BTreeMap<String, Value>, parent: Option<&str>, out: &mut Vec<(String, String)>) {
    for (key, value) in map {
        let name = match parent {
            Some(p) => format!("{}[{}]", p, key),
            None => key.clone(),
        };
        match value {
            Value::Null => {}
            Value::Map(inner) => flatten(inner, Some(&name), out),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    out.push((format!("{}[{}]", name, i), scalar(item)));
                }
            }
            other => out.push((name, scalar(other))),
        }
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        other => other.text().into_owned(),
    }
}
