//! Plugin registry seam.

use std::fmt::Debug;

/// Lists the plugins known to the application.
pub trait PluginRegistry: Debug + Send + Sync {
    /// Plugin names, as they appear in URLs.
    fn plugins(&self) -> Vec<String>;
}

/// A fixed plugin list.
#[derive(Debug, Clone, Default)]
pub struct StaticPlugins(Vec<String>);

impl StaticPlugins {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }
}

impl PluginRegistry for StaticPlugins {
    fn plugins(&self) -> Vec<String> {
        self.0.clone()
    }
}

/// Remove a plugin's segment from a base path.
pub fn strip_plugin(base: &str, plugin: Option<&str>) -> String {
    let Some(plugin) = plugin.filter(|p| !p.is_empty()) else {
        return base.to_string();
    };
    let kept: Vec<&str> = base.split('/').filter(|seg| *seg != plugin).collect();
    let mut out = kept.join("/");
    while out.contains("//") {
        out = out.replace("//", "/");
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}
