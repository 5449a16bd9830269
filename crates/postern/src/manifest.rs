//! Route manifest (`routes.yaml`) parser.
//!
//! A manifest configures the router, declares named-argument rules and REST
//! resources, then lists routes in priority order:
//!
//! ```yaml
//! router:
//!   prefixes: [admin]
//! named:
//!   rules: [page, sort]
//! resources:
//!   controllers: [posts]
//! routes:
//!   - template: /
//!     defaults: { controller: pages, action: display, 0: home }
//!   - template: /blog/:year/*
//!     defaults: { controller: posts }
//!     options:
//!       patterns: { year: "[12][0-9]{3}" }
//!       pass: [year]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use postern_router::named::compile_rules;
use postern_router::{
    NamedDeclaration, NamedOptions, NamedRule, NamedRuleSpec, Params, ResourceOptions, RouteKind,
    RouteOptions, RouteTable, RouterConfig, RouterError,
};

/// Errors produced while loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// The YAML is malformed or does not fit the schema.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    /// A declaration was rejected by the router.
    #[error(transparent)]
    Router(#[from] RouterError),
}

/// A route manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoutesManifest {
    /// Table-wide settings.
    #[serde(default)]
    pub router: RouterConfig,

    /// Named-argument rules.
    #[serde(default)]
    pub named: Option<NamedSection>,

    /// REST resources.
    #[serde(default)]
    pub resources: Option<ResourcesSection>,

    /// Routes, highest priority first.
    #[serde(default)]
    pub routes: Vec<RouteDeclaration>,
}

/// The `named:` section.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedSection {
    pub rules: NamedRules,
    #[serde(default)]
    pub greedy: Option<bool>,
    #[serde(default)]
    pub reset: Option<bool>,
    #[serde(default)]
    pub default: Option<bool>,
    #[serde(default)]
    pub separator: Option<String>,
}

/// Named rules as written: a switch, a key list, or a rule map.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NamedRules {
    Toggle(bool),
    Keys(Vec<String>),
    Rules(BTreeMap<String, NamedRuleSpec>),
}

/// The `resources:` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourcesSection {
    pub controllers: Vec<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

/// One `routes:` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteDeclaration {
    pub template: String,
    #[serde(default)]
    pub defaults: Params,
    #[serde(default)]
    pub options: RouteOptionsSpec,
}

/// Route options as written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteOptionsSpec {
    #[serde(default)]
    pub patterns: BTreeMap<String, String>,
    #[serde(default)]
    pub pass: Vec<String>,
    #[serde(default)]
    pub persist: Vec<String>,
    #[serde(default)]
    pub named: Option<BTreeMap<String, NamedRuleSpec>>,
    #[serde(default)]
    pub greedy: Option<bool>,
    /// Route kind: `template` (default) or `plugin_short`.
    #[serde(default)]
    pub class: Option<String>,
}

impl RouteOptionsSpec {
    /// Resolve into router options.
    pub fn build(&self) -> Result<RouteOptions, RouterError> {
        let kind = match &self.class {
            Some(name) => name.parse::<RouteKind>()?,
            None => RouteKind::Template,
        };
        let mut options = RouteOptions::new()
            .pass(self.pass.iter().cloned())
            .persist(self.persist.iter().cloned())
            .kind(kind);
        options.patterns = self.patterns.clone();
        options.greedy = self.greedy;
        if let Some(named) = &self.named {
            options.named = Some(compile_rules(named.clone())?);
        }
        Ok(options)
    }
}

impl NamedSection {
    fn declaration(&self) -> Result<NamedDeclaration, RouterError> {
        Ok(match &self.rules {
            NamedRules::Toggle(flag) => NamedDeclaration::Toggle(*flag),
            NamedRules::Keys(keys) => NamedDeclaration::Rules(
                keys.iter()
                    .map(|k| (k.clone(), NamedRule::Always(true)))
                    .collect(),
            ),
            NamedRules::Rules(rules) => NamedDeclaration::Rules(compile_rules(rules.clone())?),
        })
    }

    fn options(&self) -> NamedOptions {
        NamedOptions {
            default: self.default,
            reset: self.reset,
            greedy: self.greedy,
            separator: self.separator.clone(),
        }
    }
}

impl ResourcesSection {
    fn options(&self) -> ResourceOptions {
        let mut options = ResourceOptions::default();
        if let Some(prefix) = &self.prefix {
            options.prefix = prefix.clone();
        }
        if let Some(id) = &self.id {
            options.id = id.clone();
        }
        options
    }
}

impl RoutesManifest {
    /// Load a manifest from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Read {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::parse(&content, path)
    }

    /// Parse a manifest from YAML content.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ManifestError> {
        serde_yaml::from_str(content).map_err(|e| ManifestError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Build a route table: named rules, then resources, then routes in
    /// file order.
    pub fn build(&self) -> Result<RouteTable, ManifestError> {
        let table = RouteTable::new(self.router.clone());

        if let Some(named) = &self.named {
            table.connect_named(named.declaration()?, &named.options());
        }
        if let Some(resources) = &self.resources {
            table.map_resources(&resources.controllers, &resources.options())?;
        }
        for route in &self.routes {
            table.connect(&route.template, route.defaults.clone(), route.options.build()?)?;
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postern_router::{NoEnvironment, Value};

    fn parse(yaml: &str) -> RoutesManifest {
        RoutesManifest::parse(yaml, Path::new("routes.yaml")).unwrap()
    }

    #[test]
    fn empty_manifest_uses_defaults() {
        let manifest = parse("{}");
        assert!(manifest.router.connect_defaults);
        assert!(manifest.routes.is_empty());
        let table = manifest.build().unwrap();
        assert_eq!(table.parse("/posts", &NoEnvironment).controller(), Some("posts"));
    }

    #[test]
    fn routes_keep_file_order() {
        let manifest = parse(
            r#"
router:
  connect_defaults: false
routes:
  - template: /
    defaults: { controller: pages, action: display, 0: home }
  - template: /blog/:year/*
    defaults: { controller: posts, action: archive }
    options:
      patterns: { year: "[12][0-9]{3}" }
      pass: [year]
"#,
        );
        let table = manifest.build().unwrap();
        assert_eq!(table.len(), 2);

        let home = table.parse("/", &NoEnvironment);
        assert_eq!(home.pass, vec!["home"]);

        let archive = table.parse("/blog/2010/rust", &NoEnvironment);
        assert_eq!(archive.action(), Some("archive"));
        assert_eq!(archive.pass, vec!["2010", "rust"]);
    }

    #[test]
    fn named_section_variants() {
        let manifest = parse(
            r#"
named:
  rules: [page, sort]
  greedy: false
"#,
        );
        let table = manifest.build().unwrap();
        let named = table.named_config();
        assert!(named.rule("page").is_some());
        assert!(!named.greedy());

        let manifest = parse(
            r#"
named:
  rules:
    page: { controller: posts, match: "^[0-9]+$" }
  separator: "~"
"#,
        );
        let table = manifest.build().unwrap();
        assert_eq!(table.named_config().separator(), "~");
    }

    #[test]
    fn resources_are_mapped() {
        let manifest = parse(
            r#"
router:
  connect_defaults: false
resources:
  controllers: [posts]
  prefix: /api/
"#,
        );
        let table = manifest.build().unwrap();
        assert_eq!(table.len(), 6);
        assert_eq!(table.route(0).unwrap().template(), "/api/posts");
    }

    #[test]
    fn guard_and_null_defaults_deserialize() {
        let manifest = parse(
            r#"
routes:
  - template: /login
    defaults: { controller: users, action: login, "[method]": [GET, POST], plugin: ~ }
"#,
        );
        let defaults = &manifest.routes[0].defaults;
        assert_eq!(defaults.get("plugin"), Some(&Value::Null));
        assert_eq!(defaults.get("[method]"), Some(&Value::from(vec!["GET", "POST"])));
    }

    #[test]
    fn unknown_class_is_rejected() {
        let manifest = parse(
            r#"
routes:
  - template: /:plugin
    options: { class: FancyRoute }
"#,
        );
        let err = manifest.build().unwrap_err();
        assert!(err.to_string().contains("E2002"));
    }

    #[test]
    fn plugin_short_class() {
        let manifest = parse(
            r#"
router:
  connect_defaults: false
routes:
  - template: /:plugin
    options:
      class: plugin_short
      patterns: { plugin: forum }
"#,
        );
        let table = manifest.build().unwrap();
        let parsed = table.parse("/forum", &NoEnvironment);
        assert_eq!(parsed.controller(), Some("forum"));
    }

    #[test]
    fn malformed_yaml_reports_path() {
        let err = RoutesManifest::parse("routes: [", Path::new("bad.yaml")).unwrap_err();
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.yaml");
        std::fs::write(&path, "routes:\n  - template: /about\n    defaults: { controller: pages }\n").unwrap();
        let manifest = RoutesManifest::load(&path).unwrap();
        assert_eq!(manifest.routes.len(), 1);

        let missing = RoutesManifest::load(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(missing, ManifestError::Read { .. }));
    }
}
