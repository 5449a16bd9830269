//! Router configuration.

use serde::{Deserialize, Serialize};

use crate::query::DEFAULT_SEPARATOR;

/// Table-wide routing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Routing prefixes such as `admin`.
    pub prefixes: Vec<String>,
    /// Generate the default `/:controller/:action/*` routes on first use.
    pub connect_defaults: bool,
    /// Separator between a named argument's key and value.
    pub named_separator: String,
    /// Treat rule-less `key:value` segments as named arguments. Unset
    /// follows the named-rule declaration in effect.
    pub greedy_named: Option<bool>,
    /// Split `.ext` suffixes off parsed paths.
    pub parse_extensions: bool,
    /// Extension whitelist; empty accepts any.
    pub extensions: Vec<String>,
    /// Scheme and host prepended to full URLs.
    pub full_base_url: String,
    /// Known plugins.
    pub plugins: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            prefixes: Vec::new(),
            connect_defaults: true,
            named_separator: DEFAULT_SEPARATOR.to_string(),
            greedy_named: None,
            parse_extensions: false,
            extensions: Vec::new(),
            full_base_url: "http://localhost".to_string(),
            plugins: Vec::new(),
        }
    }
}

impl RouterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_connect_defaults(mut self, enabled: bool) -> Self {
        self.connect_defaults = enabled;
        self
    }

    pub fn with_named_separator(mut self, separator: impl Into<String>) -> Self {
        self.named_separator = separator.into();
        self
    }

    pub fn with_greedy_named(mut self, greedy: bool) -> Self {
        self.greedy_named = Some(greedy);
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parse_extensions = true;
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_full_base_url(mut self, url: impl Into<String>) -> Self {
        self.full_base_url = url.into();
        self
    }

    pub fn with_plugins<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plugins = plugins.into_iter().map(Into::into).collect();
        self
    }
}
