//! Request environment access for header-guard defaults.
//!
//! A route default whose key looks like `[method]` is a guard: the route
//! only accepts a path when the request environment agrees with it.

use std::collections::HashMap;

use crate::value::Value;

/// Read-only access to CGI-style request variables (`REQUEST_METHOD`, ...).
pub trait Environment {
    /// Returns the variable's value, if set.
    fn var(&self, name: &str) -> Option<String>;
}

/// An environment with no variables. Every guard fails against it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnvironment;

impl Environment for NoEnvironment {
    fn var(&self, _name: &str) -> Option<String> {
        None
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Extract the guard name from a default key: `"[method]"` yields `"method"`.
pub fn guard_name(key: &str) -> Option<&str> {
    let inner = key.strip_prefix('[')?.strip_suffix(']')?;
    let valid = !inner.is_empty() && inner.chars().all(|c| c.is_alphanumeric() || c == '_');
    valid.then_some(inner)
}

/// Environment variable consulted for a guard name.
pub fn guard_variable(name: &str) -> String {
    match name {
        "type" => "CONTENT_TYPE".to_string(),
        "method" => "REQUEST_METHOD".to_string(),
        "server" => "SERVER_NAME".to_string(),
        other => format!("HTTP_{}", other.to_uppercase()),
    }
}

/// Check a guard's expected value(s) against the environment.
///
/// A list accepts any member; comparison is exact.
pub fn guard_accepts(name: &str, expected: &Value, env: &dyn Environment) -> bool {
    let Some(actual) = env.var(&guard_variable(name)) else {
        return false;
    };
    match expected {
        Value::List(options) => options.iter().any(|v| v.text() == actual),
        other => other.text() == actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn guard_names() {
        assert_eq!(guard_name("[method]"), Some("method"));
        assert_eq!(guard_name("[x_requested_with]"), Some("x_requested_with"));
        assert_eq!(guard_name("method"), None);
        assert_eq!(guard_name("[]"), None);
        assert_eq!(guard_name("[a-b]"), None);
    }

    #[test]
    fn alias_table() {
        assert_eq!(guard_variable("method"), "REQUEST_METHOD");
        assert_eq!(guard_variable("type"), "CONTENT_TYPE");
        assert_eq!(guard_variable("server"), "SERVER_NAME");
        assert_eq!(guard_variable("accept"), "HTTP_ACCEPT");
    }

    #[test]
    fn list_guard_accepts_any_member() {
        let env = env(&[("REQUEST_METHOD", "PUT")]);
        assert!(guard_accepts("method", &Value::from(vec!["POST", "PUT"]), &env));
        assert!(!guard_accepts("method", &Value::from("POST"), &env));
    }

    #[test]
    fn missing_variable_fails() {
        assert!(!guard_accepts("method", &Value::from("GET"), &NoEnvironment));
    }
}
