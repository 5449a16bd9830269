//! The ordered route table.
//!
//! Routes are tried in declaration order, first match wins, for both
//! parsing and URL generation. Declarations take the write lock; parsing
//! and URL generation only read.

use std::borrow::Cow;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::RouterConfig;
use crate::context::RequestContext;
use crate::env::{guard_name, Environment};
use crate::error::RouterError;
use crate::inflector::underscore;
use crate::named::{NamedConfig, NamedDeclaration, NamedOptions};
use crate::path::{collapse_slashes, parse_extension, strip_base, DEFAULT_EXTENSION};
use crate::plugin::{PluginRegistry, StaticPlugins};
use crate::query::{encode, join_named, query_string};
use crate::route::{Route, RouteKind, RouteOptions, RouteParams};
use crate::value::{Key, Params, Value};

/// Keys consumed by URL generation itself, never routed.
const BOOKKEEPING_KEYS: [&str; 10] = [
    "pass",
    "named",
    "paging",
    "models",
    "url",
    "autoRender",
    "bare",
    "requested",
    "return",
    "_args_",
];

/// What to generate a URL for.
#[derive(Debug, Clone, PartialEq)]
pub enum UrlSpec {
    /// A literal path or URI.
    Path(String),
    /// A parameter bag to reverse-route.
    Params(Params),
}

impl From<&str> for UrlSpec {
    fn from(s: &str) -> Self {
        UrlSpec::Path(s.to_string())
    }
}

impl From<String> for UrlSpec {
    fn from(s: String) -> Self {
        UrlSpec::Path(s)
    }
}

impl From<Params> for UrlSpec {
    fn from(params: Params) -> Self {
        UrlSpec::Params(params)
    }
}

/// URL generation flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UrlOptions {
    /// Prefix the configured full base URL.
    pub full: bool,
    /// Join query pairs with `&amp;`.
    pub escape: bool,
}

impl UrlOptions {
    pub fn full() -> Self {
        Self {
            full: true,
            escape: false,
        }
    }
}

#[derive(Debug)]
pub(crate) struct TableState {
    pub(crate) routes: Vec<Arc<Route>>,
    pub(crate) prefixes: Vec<String>,
    pub(crate) named: NamedConfig,
    pub(crate) connect_defaults: bool,
    pub(crate) defaults_mapped: bool,
    pub(crate) parse_extensions: bool,
    pub(crate) extensions: Vec<String>,
    pub(crate) resources: Vec<String>,
}

/// An ordered, shareable route table.
#[derive(Debug)]
pub struct RouteTable {
    config: RouterConfig,
    plugins: Arc<dyn PluginRegistry>,
    pub(crate) state: RwLock<TableState>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

impl RouteTable {
    /// Create a table; the plugin list comes from the config.
    pub fn new(config: RouterConfig) -> Self {
        let plugins = Arc::new(StaticPlugins::new(config.plugins.clone()));
        Self::with_plugins(config, plugins)
    }

    /// Create a table backed by an external plugin registry.
    pub fn with_plugins(config: RouterConfig, plugins: Arc<dyn PluginRegistry>) -> Self {
        let mut prefixes: Vec<String> = Vec::new();
        for prefix in &config.prefixes {
            if !prefixes.contains(prefix) {
                prefixes.push(prefix.clone());
            }
        }
        let state = TableState {
            routes: Vec::new(),
            prefixes,
            named: NamedConfig::new(config.named_separator.clone(), config.greedy_named.unwrap_or(false)),
            connect_defaults: config.connect_defaults,
            defaults_mapped: false,
            parse_extensions: config.parse_extensions,
            extensions: config.extensions.clone(),
            resources: Vec::new(),
        };
        Self {
            config,
            plugins,
            state: RwLock::new(state),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Append a route. Returns its index.
    ///
    /// A default naming a known prefix marks the route as prefixed, and a
    /// `prefix` default registers a new prefix. `plugin` defaults to null and
    /// `action` to `index` unless the route constrains `action`.
    pub fn connect(
        &self,
        template: &str,
        defaults: Params,
        options: RouteOptions,
    ) -> Result<usize, RouterError> {
        let mut state = self.state.write();
        connect_locked(&mut state, template, defaults, options)
    }

    /// Declare named-argument rules.
    pub fn connect_named(&self, declaration: NamedDeclaration, options: &NamedOptions) {
        self.state.write().named.declare(declaration, options);
    }

    /// Enable or disable automatic default routes.
    pub fn defaults(&self, enabled: bool) {
        self.state.write().connect_defaults = enabled;
    }

    /// Enable extension parsing, restricted to `extensions` when non-empty.
    pub fn parse_extensions<I, S>(&self, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state.write();
        state.parse_extensions = true;
        state.extensions = extensions.into_iter().map(Into::into).collect();
    }

    /// Move a route to the front. `None` promotes the last connected route.
    /// Returns false when there is no such route.
    pub fn promote(&self, which: Option<usize>) -> bool {
        let mut state = self.state.write();
        let Some(index) = which.or_else(|| state.routes.len().checked_sub(1)) else {
            return false;
        };
        if index >= state.routes.len() {
            return false;
        }
        let route = state.routes.remove(index);
        state.routes.insert(0, route);
        true
    }

    pub fn prefixes(&self) -> Vec<String> {
        self.state.read().prefixes.clone()
    }

    /// Snapshot of the routes, in priority order.
    pub fn routes(&self) -> Vec<Arc<Route>> {
        self.state.read().routes.clone()
    }

    pub fn route(&self, index: usize) -> Option<Arc<Route>> {
        self.state.read().routes.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.read().routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().routes.is_empty()
    }

    pub fn named_config(&self) -> NamedConfig {
        self.state.read().named.clone()
    }

    /// Generate the default routes, once, if enabled.
    pub fn ensure_default_routes(&self) {
        {
            let state = self.state.read();
            if state.defaults_mapped || !state.connect_defaults {
                return;
            }
        }
        let mut state = self.state.write();
        if state.defaults_mapped || !state.connect_defaults {
            return;
        }
        let before = state.routes.len();
        self.connect_default_routes(&mut state);
        state.defaults_mapped = true;
        tracing::debug!(count = state.routes.len() - before, "default routes connected");
    }

    fn connect_default_routes(&self, state: &mut TableState) {
        let prefixes = state.prefixes.clone();
        let plugins: Vec<String> = self
            .plugins
            .plugins()
            .iter()
            .map(|p| regex_lite::escape(&underscore(p)))
            .collect();

        let mut declarations: Vec<(String, Params, RouteOptions)> = Vec::new();
        let index = || Params::new().with("action", "index");
        let prefixed = |prefix: &str| Params::new().with("prefix", prefix).with(prefix, true);

        if !plugins.is_empty() {
            let pattern = plugins.join("|");
            let short = RouteOptions::new()
                .pattern("plugin", pattern.clone())
                .kind(RouteKind::PluginShort);
            let scoped = RouteOptions::new().pattern("plugin", pattern);

            for prefix in &prefixes {
                let params = prefixed(prefix);
                let index_params = params.clone().with("action", "index");
                declarations.push((format!("/{}/:plugin", prefix), index_params.clone(), short.clone()));
                declarations.push((
                    format!("/{}/:plugin/:controller", prefix),
                    index_params,
                    scoped.clone(),
                ));
                declarations.push((
                    format!("/{}/:plugin/:controller/:action/*", prefix),
                    params,
                    scoped.clone(),
                ));
            }
            declarations.push(("/:plugin".to_string(), index(), short));
            declarations.push(("/:plugin/:controller".to_string(), index(), scoped.clone()));
            declarations.push(("/:plugin/:controller/:action/*".to_string(), Params::new(), scoped));
        }

        for prefix in &prefixes {
            let params = prefixed(prefix);
            let index_params = params.clone().with("action", "index");
            declarations.push((format!("/{}/:controller", prefix), index_params, RouteOptions::new()));
            declarations.push((
                format!("/{}/:controller/:action/*", prefix),
                params,
                RouteOptions::new(),
            ));
        }

        declarations.push(("/:controller".to_string(), index(), RouteOptions::new()));
        declarations.push(("/:controller/:action/*".to_string(), Params::new(), RouteOptions::new()));

        for (template, defaults, options) in declarations {
            if let Err(e) = connect_locked(state, &template, defaults, options) {
                tracing::warn!(template = %template, error = %e, "default route skipped");
            }
        }

        if !state.named.is_configured() {
            let options = NamedOptions {
                greedy: self.config.greedy_named,
                ..Default::default()
            };
            state.named.declare(NamedDeclaration::Toggle(true), &options);
        }
    }

    /// Parse a request path. Never fails: an unmatched path yields empty
    /// params carrying only the parsed extension.
    pub fn parse(&self, url: &str, env: &dyn Environment) -> RouteParams {
        self.ensure_default_routes();
        let state = self.state.read();

        let mut path = if url.starts_with('/') {
            url.to_string()
        } else {
            format!("/{}", url)
        };
        if let Some(pos) = path.find('?') {
            path.truncate(pos);
        }

        let ext = if state.parse_extensions {
            let (stripped, ext) = parse_extension(&path, &state.extensions);
            path = stripped;
            Some(ext)
        } else {
            None
        };

        for (index, route) in state.routes.iter().enumerate() {
            if let Some(mut params) = route.parse(&path, env, &state.named) {
                tracing::debug!(template = route.template(), index, "route matched");
                params.route = Some(index);
                params.ext = ext;
                return params;
            }
        }

        tracing::trace!(path = %path, "no route matched");
        RouteParams {
            ext,
            ..Default::default()
        }
    }

    /// Generate a URL.
    ///
    /// Strings are passed through (URIs, `#fragments`), resolved against
    /// the request (`""`), the base (`/path`) or the current controller.
    /// Parameter bags go through the routes in order and fall back to a
    /// generic `/controller/action/pass/named:value` composition.
    pub fn url(
        &self,
        spec: impl Into<UrlSpec>,
        options: &UrlOptions,
        ctx: &RequestContext,
    ) -> String {
        self.ensure_default_routes();

        let current = ctx.params(true);
        let paths = ctx.paths(true);
        let mut base = paths.map(|p| p.base.clone()).unwrap_or_default();
        let mut full = options.full;
        let mut extension = String::new();
        let mut query = None;
        let mut fragment = String::new();

        let output = match spec.into() {
            UrlSpec::Path(path) => {
                if is_passthrough(&path) {
                    return path;
                }
                let out = if path.is_empty() {
                    paths.map(|p| p.here.clone()).unwrap_or_else(|| "/".to_string())
                } else if path.starts_with('/') {
                    format!("{}{}", base, path)
                } else {
                    self.relative_path(&base, current, &path)
                };
                collapse_slashes(&out)
            }
            UrlSpec::Params(mut url) => {
                match url.remove("base") {
                    Some(Value::Bool(false)) => base.clear(),
                    Some(Value::Str(custom)) => base = custom,
                    _ => {}
                }
                if matches!(url.remove("full_base"), Some(Value::Bool(true))) {
                    full = true;
                }
                query = url.remove("?");
                if let Some(frag) = url.remove("#").filter(|f| !f.is_null()) {
                    fragment = format!("#{}", encode(&frag.text()));
                }
                if let Some(ext) = url.remove("ext").filter(|e| e.is_present()) {
                    extension = format!(".{}", ext.text());
                }

                let state = self.state.read();
                prepare_params(&mut url, current, &state.prefixes);

                let matched = state.routes.iter().find_map(|route| {
                    let attempt = match current {
                        Some(cur) if !route.options().persist.is_empty() => {
                            let mut persisted = url.clone();
                            route.persist_params(&mut persisted, &cur.params);
                            Cow::Owned(persisted)
                        }
                        _ => Cow::Borrowed(&url),
                    };
                    route.match_url(&attempt, &state.named)
                });

                let out = match matched {
                    Some(path) => path.trim_matches('/').to_string(),
                    None => {
                        tracing::trace!("no route accepted url params, composing");
                        handle_no_route(&url, &state.prefixes, state.named.separator())
                    }
                };
                collapse_slashes(&format!("{}/{}", base, out))
            }
        };

        let mut output = if full {
            format!("{}{}", self.config.full_base_url.trim_end_matches('/'), output)
        } else {
            output
        };
        if !extension.is_empty() && output.ends_with('/') {
            output.pop();
        }
        format!(
            "{}{}{}{}",
            output,
            extension,
            query_string(query.as_ref(), options.escape),
            fragment
        )
    }

    /// Resolve a bare relative path against the current prefix, plugin and
    /// controller.
    fn relative_path(&self, base: &str, current: Option<&RouteParams>, path: &str) -> String {
        let mut out = format!("{}/", base);
        if let Some(params) = current {
            let prefixes = self.state.read().prefixes.clone();
            if let Some(prefix) = prefixes.iter().find(|p| params.params.is_set(p.as_str())) {
                out.push_str(prefix);
                out.push('/');
            }
            if let Some(plugin) = params.plugin() {
                if Some(plugin) != params.controller() {
                    out.push_str(&underscore(plugin));
                    out.push('/');
                }
            }
            if let Some(controller) = params.controller() {
                out.push_str(&underscore(controller));
                out.push('/');
            }
        }
        out.push_str(path);
        out
    }

    /// Generate a URL back from parsed params.
    pub fn reverse(&self, parsed: &RouteParams, ctx: &RequestContext) -> String {
        let mut spec = parsed.params.clone();
        spec.retain(|key, _| match key.name() {
            Some(name) => !BOOKKEEPING_KEYS.contains(&name) && guard_name(name).is_none(),
            None => true,
        });
        spec.retain(|key, _| !key.is_index());
        for (i, arg) in parsed.pass.iter().enumerate() {
            spec.insert(i, arg.as_str());
        }
        for (key, value) in &parsed.named {
            spec.insert(key, value.as_str());
        }
        if let Some(ext) = parsed.ext.as_deref().filter(|e| *e != DEFAULT_EXTENSION) {
            spec.insert("ext", ext);
        }
        self.url(spec, &UrlOptions::default(), ctx)
    }

    /// Normalize a URL relative to the request base: duplicate and
    /// trailing slashes are removed and the empty path becomes `/`.
    pub fn normalize(&self, url: impl Into<UrlSpec>, ctx: &RequestContext) -> String {
        let url = match url.into() {
            UrlSpec::Path(path) => path,
            params => self.url(params, &UrlOptions::default(), ctx),
        };
        let base = ctx.paths(true).map(|p| p.base.as_str()).unwrap_or("");
        strip_base(&url, base)
    }
}

pub(crate) fn connect_locked(
    state: &mut TableState,
    template: &str,
    mut defaults: Params,
    options: RouteOptions,
) -> Result<usize, RouterError> {
    if let Some(prefix) = state
        .prefixes
        .iter()
        .find(|p| defaults.is_set(p.as_str()))
        .cloned()
    {
        defaults.insert("prefix", prefix);
    }
    defaults.insert_default("plugin", Value::Null);
    if !options.patterns.contains_key("action") {
        defaults.insert_default("action", "index");
    }

    let route = Route::new(template, defaults, options);
    if let Err(e) = validate(&route) {
        tracing::warn!(template, error = %e, "route declaration rejected");
        return Err(e);
    }

    let prefix = route
        .defaults()
        .text("prefix")
        .map(|p| p.into_owned())
        .filter(|p| !p.is_empty());
    if let Some(prefix) = prefix {
        if !state.prefixes.contains(&prefix) {
            state.prefixes.push(prefix);
        }
    }

    state.routes.push(Arc::new(route));
    Ok(state.routes.len() - 1)
}

fn validate(route: &Route) -> Result<(), RouterError> {
    let compiled = route.compile()?;
    if route.kind() == RouteKind::PluginShort && !compiled.keys().iter().any(|k| k == "plugin") {
        return Err(RouterError::InvalidRoute {
            template: route.template().to_string(),
            reason: "plugin_short routes need a :plugin placeholder".to_string(),
        });
    }
    Ok(())
}

fn is_passthrough(url: &str) -> bool {
    url.find("://").is_some_and(|pos| pos > 0)
        || url.starts_with("javascript:")
        || url.starts_with("mailto:")
        || url.starts_with('#')
}

/// Fill in action, prefix flags, controller and plugin from the current
/// request.
fn prepare_params(url: &mut Params, current: Option<&RouteParams>, prefixes: &[String]) {
    let current_value = |key: &str| current.and_then(|c| c.params.get(key)).cloned();

    if url.get("action").map_or(true, Value::is_empty) {
        let same_controller = match url.get("controller") {
            None => true,
            Some(c) if c.is_empty() => true,
            Some(c) => current_value("controller").is_some_and(|cur| cur == *c),
        };
        let action = if same_controller {
            current_value("action")
                .filter(|a| !a.is_null())
                .unwrap_or_else(|| Value::from("index"))
        } else {
            Value::from("index")
        };
        url.insert("action", action);
    }

    let prefix_given = prefixes.iter().any(|p| url.contains(p.as_str()));
    for prefix in prefixes {
        let active = current_value(prefix).is_some_and(|v| !v.is_empty());
        if active && !prefix_given {
            url.insert(prefix, true);
        } else if url.get(prefix.as_str()).is_some_and(Value::is_empty) {
            url.remove(prefix.as_str());
        }

        if url.is_set(prefix.as_str()) {
            let stripped = url
                .text("action")
                .and_then(|a| a.strip_prefix(&format!("{}_", prefix)).map(str::to_string));
            if let Some(action) = stripped {
                url.insert("action", action);
            }
        }
    }

    url.insert_default("controller", current_value("controller").unwrap_or_default());
    url.insert_default("plugin", current_value("plugin").unwrap_or_default());
}

/// Compose `/prefix/plugin/controller/action/pass.../key:value...` when no
/// route accepts the params.
fn handle_no_route(url: &Params, prefixes: &[String], separator: &str) -> String {
    const SKIP: [&str; 5] = ["bare", "action", "controller", "plugin", "prefix"];

    let mut args = Vec::new();
    let mut named = Vec::new();
    for (key, value) in url {
        if !value.is_present() {
            continue;
        }
        match key {
            Key::Index(_) => args.push(value.text().into_owned()),
            Key::Name(name) => {
                if SKIP.contains(&name.as_str()) || prefixes.contains(name) {
                    continue;
                }
                named.push(join_named(name, &value.text(), separator));
            }
        }
    }

    let mut action = url.text("action").map(|a| a.into_owned());
    if let Some(prefix) = prefixes.iter().find(|p| url.get(p.as_str()).is_some_and(|v| !v.is_empty())) {
        action = action.map(|a| a.replace(&format!("{}_", prefix), ""));
    }
    if args.is_empty() && named.is_empty() && action.as_deref().map_or(true, |a| a == "index") {
        action = None;
    }

    let controller = url.text("controller").filter(|c| !c.is_empty());
    let mut segments: Vec<String> = Vec::new();
    if let Some(prefix) = prefixes.iter().find(|p| url.is_set(p.as_str())) {
        segments.push(prefix.clone());
    }
    if let Some(plugin) = url.text("plugin").filter(|p| !p.is_empty()) {
        if Some(&plugin) != controller.as_ref() {
            segments.push(plugin.into_owned());
        }
    }
    segments.extend(controller.map(Cow::into_owned));
    segments.extend(action.filter(|a| !a.is_empty()));
    segments.extend(args);
    segments.extend(named);
    segments.join("/")
}
