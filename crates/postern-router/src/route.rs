//! A single routable template: parse (path -> params) and match
//! (params -> path).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::compile::{self, segments, CompiledRoute, Segment};
use crate::env::{guard_accepts, guard_name, Environment};
use crate::error::RouterError;
use crate::inflector::camelize;
use crate::named::{NamedConfig, NamedContext, NamedRule};
use crate::query::join_named;
use crate::value::{Key, Params, Value};

/// The closed set of route behaviours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RouteKind {
    /// Plain template route.
    #[default]
    Template,
    /// `/:plugin` short route: the plugin doubles as the controller.
    PluginShort,
}

impl RouteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Template => "template",
            RouteKind::PluginShort => "plugin_short",
        }
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteKind {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "template" | "default" => Ok(RouteKind::Template),
            "plugin_short" | "plugin-short" => Ok(RouteKind::PluginShort),
            other => Err(RouterError::UnknownRouteClass(other.to_string())),
        }
    }
}

/// Per-route options.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    /// Regex per placeholder key.
    pub patterns: BTreeMap<String, String>,
    /// Keys moved into the pass list on parse, in order.
    pub pass: Vec<String>,
    /// Keys inherited from the current request when generating URLs.
    pub persist: Vec<String>,
    /// Named-argument rules layered over the table's.
    pub named: Option<BTreeMap<String, NamedRule>>,
    /// Greedy override for named arguments.
    pub greedy: Option<bool>,
    pub kind: RouteKind,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pattern(mut self, key: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.patterns.insert(key.into(), pattern.into());
        self
    }

    pub fn pass<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pass = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn persist<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.persist = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn named(mut self, rules: BTreeMap<String, NamedRule>) -> Self {
        self.named = Some(rules);
        self
    }

    pub fn greedy(mut self, greedy: bool) -> Self {
        self.greedy = Some(greedy);
        self
    }

    pub fn kind(mut self, kind: RouteKind) -> Self {
        self.kind = kind;
        self
    }
}

/// The result of parsing a path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteParams {
    /// Matched keys and defaults (`controller`, `action`, `plugin`, ...).
    #[serde(flatten)]
    pub params: Params,
    /// Positional arguments.
    pub pass: Vec<String>,
    /// `key:value` arguments.
    pub named: BTreeMap<String, String>,
    /// Extension split off the path, when extension parsing is on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
    /// Index of the route that matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<usize>,
}

impl RouteParams {
    fn field(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn controller(&self) -> Option<&str> {
        self.field("controller")
    }

    pub fn action(&self) -> Option<&str> {
        self.field("action")
    }

    pub fn plugin(&self) -> Option<&str> {
        self.field("plugin")
    }

    pub fn prefix(&self) -> Option<&str> {
        self.field("prefix")
    }

    /// Class-style controller name: `blog_posts` -> `BlogPostsController`.
    pub fn controller_class(&self) -> Option<String> {
        self.controller()
            .map(|c| format!("{}Controller", camelize(c)))
    }

    /// True when no route matched.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.pass.is_empty() && self.named.is_empty()
    }
}

/// A route: template, defaults and options, compiled on first use.
#[derive(Debug)]
pub struct Route {
    template: String,
    defaults: Params,
    options: RouteOptions,
    compiled: OnceCell<CompiledRoute>,
}

impl Route {
    pub fn new(template: impl Into<String>, defaults: Params, options: RouteOptions) -> Self {
        Self {
            template: template.into(),
            defaults,
            options,
            compiled: OnceCell::new(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn defaults(&self) -> &Params {
        &self.defaults
    }

    pub fn options(&self) -> &RouteOptions {
        &self.options
    }

    pub fn kind(&self) -> RouteKind {
        self.options.kind
    }

    /// Compile once; later calls return the cached result.
    pub fn compile(&self) -> Result<&CompiledRoute, RouterError> {
        self.compiled.get_or_try_init(|| {
            compile::compile(&self.template, &self.defaults, &self.options.patterns)
        })
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }

    /// Placeholder keys in template order.
    pub fn keys(&self) -> &[String] {
        self.compile().map(CompiledRoute::keys).unwrap_or(&[])
    }

    pub fn is_greedy(&self) -> bool {
        self.compile().is_ok_and(CompiledRoute::is_greedy)
    }

    /// Parse a normalized path. `None` when the path or a header guard
    /// does not match.
    pub fn parse(
        &self,
        path: &str,
        env: &dyn Environment,
        named: &NamedConfig,
    ) -> Option<RouteParams> {
        let compiled = self.compile().ok()?;
        let captured = compiled.capture(path)?;

        for (key, expected) in &self.defaults {
            if let Some(guard) = key.name().and_then(guard_name) {
                if !guard_accepts(guard, expected, env) {
                    return None;
                }
            }
        }

        let mut params: Params = captured.values.into_iter().collect();
        for (key, value) in &self.defaults {
            params.insert_default(key, value.clone());
        }

        let mut pass: Vec<String> = params
            .iter()
            .filter(|(key, _)| key.is_index())
            .map(|(_, value)| value.text().into_owned())
            .collect();
        params.retain(|key, _| !key.is_index());

        let mut named_args = BTreeMap::new();
        if let Some(args) = captured.args {
            let ctx = NamedContext {
                controller: params.get("controller").and_then(Value::as_str),
                action: params.get("action").and_then(Value::as_str),
            };
            let (extra, found) =
                named.split_args(&args, &ctx, self.options.named.as_ref(), self.options.greedy);
            pass.extend(extra);
            named_args = found;
        }

        for key in self.options.pass.iter().rev() {
            if params.is_set(key) {
                if let Some(value) = params.remove(key) {
                    pass.insert(0, value.text().into_owned());
                }
            }
        }

        if self.options.kind == RouteKind::PluginShort {
            let plugin = params.get("plugin").cloned().unwrap_or_default();
            params.insert("controller", plugin);
        }

        Some(RouteParams {
            params,
            pass,
            named: named_args,
            ext: None,
            route: None,
        })
    }

    /// Try to render `url` through this route. `None` when the route cannot
    /// express every supplied parameter.
    pub fn match_url(&self, url: &Params, named: &NamedConfig) -> Option<String> {
        match self.options.kind {
            RouteKind::Template => self.match_with(url, &self.defaults, named),
            RouteKind::PluginShort => {
                let controller = url.get("controller")?;
                if let Some(plugin) = url.get("plugin") {
                    if !plugin.loose_eq(controller) {
                        return None;
                    }
                }
                let mut defaults = self.defaults.clone();
                defaults.insert("controller", controller.clone());
                self.match_with(url, &defaults, named)
            }
        }
    }

    fn match_with(&self, url: &Params, defaults: &Params, named: &NamedConfig) -> Option<String> {
        let compiled = self.compile().ok()?;
        let keys = compiled.keys();
        let mut url = url.clone();

        if let Some(prefix) = defaults.get("prefix").filter(|v| !v.is_null()) {
            url.insert("prefix", prefix.clone());
        }

        if !keys.iter().all(|k| url.contains(k)) {
            return None;
        }

        let unfiltered = diff(&url, defaults);
        let mut diff: Params = unfiltered
            .iter()
            .filter(|(_, v)| v.is_present())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let is_key = |k: &Key| k.name().is_some_and(|n| keys.iter().any(|key| key == n));

        if !compiled.is_greedy() && diff.keys().any(|k| !is_key(k)) {
            return None;
        }

        let mut filtered_defaults = defaults.clone();
        filtered_defaults.retain(|k, v| !is_key(k) && !v.is_empty());
        if filtered_defaults.keys().any(|k| unfiltered.contains(k)) {
            return None;
        }

        diff.retain(|k, _| !is_key(k) && !filtered_defaults.contains(k));

        let ctx = NamedContext {
            controller: url.get("controller").and_then(Value::as_str),
            action: url.get("action").and_then(Value::as_str),
        };
        let mut named_args = BTreeMap::new();
        let mut leftover = Params::new();
        for (key, value) in diff.iter() {
            let text = value.text();
            match key.name() {
                Some(name) if named.accepts(name, &text, &ctx) => {
                    named_args.insert(name.to_string(), text.into_owned());
                }
                _ => {
                    leftover.insert(key, value.clone());
                }
            }
        }

        let mut pass = Vec::new();
        let mut i = 0;
        while url.is_set(i) {
            if leftover.contains(i) || diff.contains(i) {
                if let Some(value) = url.remove(i) {
                    pass.push(value.text().into_owned());
                }
                leftover.remove(i);
            }
            i += 1;
        }
        if !leftover.is_empty() {
            return None;
        }

        for (key, matcher) in compiled.matchers() {
            if let Some(value) = url.get(key) {
                if !matcher.is_match(&value.text()) {
                    return None;
                }
            }
        }

        Some(self.render(compiled, url, defaults, pass, named_args, named.separator()))
    }

    fn render(
        &self,
        compiled: &CompiledRoute,
        mut params: Params,
        defaults: &Params,
        pass: Vec<String>,
        named_args: BTreeMap<String, String>,
        separator: &str,
    ) -> String {
        let same_as_plugin = match (params.get("plugin"), params.get("controller")) {
            (Some(plugin), Some(controller)) => {
                !plugin.is_null() && plugin.text() == controller.text()
            }
            _ => false,
        };
        if same_as_plugin {
            params.remove("controller");
        }

        let stripped = match (params.text("prefix"), params.text("action")) {
            (Some(prefix), Some(action)) => Some(action.replace(&format!("{}_", prefix), "")),
            _ => None,
        };
        if let Some(action) = stripped {
            params.insert("action", action);
            params.remove("prefix");
        }

        let mut tail = pass.join("/");
        if !named_args.is_empty() {
            let named: Vec<String> = named_args
                .iter()
                .map(|(k, v)| join_named(k, v, separator))
                .collect();
            tail = format!("{}/{}", tail, named.join("/"));
        }

        let mut out = String::new();
        let mut skip_slash = false;
        for segment in segments(&self.template) {
            match segment {
                Segment::Literal(text) => {
                    let text = if skip_slash {
                        text.strip_prefix('/').unwrap_or(text)
                    } else {
                        text
                    };
                    skip_slash = false;
                    out.push_str(&text.replace('*', &tail));
                }
                Segment::Key(key) => {
                    let value = params.get(key).filter(|v| !v.is_null());
                    let omitted = match value {
                        None => true,
                        Some(v) => {
                            compiled.is_optional(key)
                                && defaults.get(key).is_some_and(|d| d.loose_eq(v))
                        }
                    };
                    if omitted {
                        skip_slash = true;
                    } else if let Some(v) = value {
                        out.push_str(&v.text());
                    }
                }
            }
        }

        while out.contains("//") {
            out = out.replace("//", "/");
        }
        out
    }

    /// Copy this route's persisted keys from the current request into `url`
    /// where `url` does not set them.
    pub fn persist_params(&self, url: &mut Params, current: &Params) {
        for key in &self.options.persist {
            if url.is_set(key) {
                continue;
            }
            if let Some(value) = current.get(key) {
                url.insert(key, value.clone());
            }
        }
    }
}

/// Keys whose values differ between `a` and `b` (`a` wins), plus keys
/// only one side has.
fn diff(a: &Params, b: &Params) -> Params {
    let mut out: Params = a
        .iter()
        .filter(|(k, v)| !b.get(*k).is_some_and(|other| other.loose_eq(v)))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for (k, v) in b {
        if !a.contains(k) {
            out.insert(k, v.clone());
        }
    }
    out
}
