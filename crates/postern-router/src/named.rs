//! Named-argument rules.
//!
//! A path segment shaped like `key:value` is either a *named* argument
//! (extracted into a map) or a *pass* argument (kept positional). The
//! decision is made per key: rules are `true`/`false`, a bare regex, or a
//! structured rule scoped to controllers and actions. Keys without a rule
//! fall back to the table's greedy switch.

use std::borrow::Cow;
use std::collections::BTreeMap;

use regex_lite::Regex;
use serde::Deserialize;

use crate::error::RouterError;
use crate::query::{split_named, DEFAULT_SEPARATOR};

/// Keys that are named arguments when the default rule set is enabled.
pub const DEFAULT_NAMED_KEYS: [&str; 8] = [
    "page",
    "fields",
    "order",
    "limit",
    "recursive",
    "sort",
    "direction",
    "step",
];

/// Controller/action in effect when a token is classified.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamedContext<'a> {
    pub controller: Option<&'a str>,
    pub action: Option<&'a str>,
}

/// A rule deciding whether `key:value` is a named argument.
#[derive(Debug, Clone)]
pub enum NamedRule {
    /// Accept (`true`) or reject (`false`) without looking at the value.
    Always(bool),
    /// Every present constraint must hold.
    Scoped(ScopedRule),
}

/// Structured rule constraints. Empty lists mean "unconstrained".
#[derive(Debug, Clone, Default)]
pub struct ScopedRule {
    controller: Vec<String>,
    action: Vec<String>,
    pattern: Option<Regex>,
}

impl NamedRule {
    /// A bare regex rule, the shortcut for `{match: pattern}`.
    pub fn pattern(key: &str, pattern: &str) -> Result<Self, RouterError> {
        Self::scoped(key, Vec::new(), Vec::new(), Some(pattern))
    }

    /// A structured rule.
    pub fn scoped(
        key: &str,
        controller: Vec<String>,
        action: Vec<String>,
        pattern: Option<&str>,
    ) -> Result<Self, RouterError> {
        let pattern = pattern
            .map(|p| {
                Regex::new(p).map_err(|e| RouterError::InvalidNamedRule {
                    key: key.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()?;
        Ok(NamedRule::Scoped(ScopedRule {
            controller,
            action,
            pattern,
        }))
    }

    /// Evaluate the rule for a value in the given context.
    ///
    /// Scope constraints only apply when the context provides the matching
    /// field; the value regex is unanchored.
    pub fn accepts(&self, value: &str, ctx: &NamedContext<'_>) -> bool {
        match self {
            NamedRule::Always(flag) => *flag,
            NamedRule::Scoped(rule) => {
                let controller_ok = match ctx.controller {
                    Some(c) if !rule.controller.is_empty() => rule.controller.iter().any(|r| r == c),
                    _ => true,
                };
                let action_ok = match ctx.action {
                    Some(a) if !rule.action.is_empty() => rule.action.iter().any(|r| r == a),
                    _ => true,
                };
                controller_ok
                    && action_ok
                    && rule.pattern.as_ref().map_or(true, |re| re.is_match(value))
            }
        }
    }
}

/// Serialized form of a rule, as written in configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NamedRuleSpec {
    /// `page: true`
    Flag(bool),
    /// `page: "^[0-9]+$"`
    Pattern(String),
    /// `page: { controller: posts, action: [index], match: "[0-9]+" }`
    Scoped {
        #[serde(default)]
        controller: OneOrMany,
        #[serde(default)]
        action: OneOrMany,
        #[serde(default, rename = "match")]
        pattern: Option<String>,
    },
}

/// A single string or a list of strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    #[default]
    None,
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::None => Vec::new(),
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

impl NamedRuleSpec {
    /// Compile into a rule.
    pub fn into_rule(self, key: &str) -> Result<NamedRule, RouterError> {
        match self {
            NamedRuleSpec::Flag(flag) => Ok(NamedRule::Always(flag)),
            NamedRuleSpec::Pattern(p) => NamedRule::pattern(key, &p),
            NamedRuleSpec::Scoped {
                controller,
                action,
                pattern,
            } => NamedRule::scoped(
                key,
                controller.into_vec(),
                action.into_vec(),
                pattern.as_deref(),
            ),
        }
    }
}

/// Compile a map of rule specs.
pub fn compile_rules(
    specs: BTreeMap<String, NamedRuleSpec>,
) -> Result<BTreeMap<String, NamedRule>, RouterError> {
    specs
        .into_iter()
        .map(|(key, spec)| {
            let rule = spec.into_rule(&key)?;
            Ok((key, rule))
        })
        .collect()
}

/// What `connect_named` declares.
#[derive(Debug, Clone)]
pub enum NamedDeclaration {
    /// `true` enables the default keys and greedy parsing; `false` disables both.
    Toggle(bool),
    /// Explicit per-key rules.
    Rules(BTreeMap<String, NamedRule>),
}

/// Options for `connect_named`. Unset fields take the declaration's defaults.
#[derive(Debug, Clone, Default)]
pub struct NamedOptions {
    /// Merge in [`DEFAULT_NAMED_KEYS`].
    pub default: Option<bool>,
    /// Clear existing rules first.
    pub reset: Option<bool>,
    /// Treat rule-less `key:value` tokens as named.
    pub greedy: Option<bool>,
    /// Replace the key/value separator.
    pub separator: Option<String>,
}

/// The table-wide named-argument policy.
#[derive(Debug, Clone)]
pub struct NamedConfig {
    /// `None` until rules are first declared.
    rules: Option<BTreeMap<String, NamedRule>>,
    greedy: bool,
    separator: String,
}

impl Default for NamedConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR, false)
    }
}

impl NamedConfig {
    /// Create a policy with no rules declared.
    pub fn new(separator: impl Into<String>, greedy: bool) -> Self {
        Self {
            rules: None,
            greedy,
            separator: separator.into(),
        }
    }

    /// Whether any rules were ever declared.
    pub fn is_configured(&self) -> bool {
        self.rules.is_some()
    }

    /// The declared rules.
    pub fn rules(&self) -> Option<&BTreeMap<String, NamedRule>> {
        self.rules.as_ref()
    }

    /// The rule for a key.
    pub fn rule(&self, key: &str) -> Option<&NamedRule> {
        self.rules.as_ref().and_then(|r| r.get(key))
    }

    /// Greedy switch.
    pub fn greedy(&self) -> bool {
        self.greedy
    }

    /// Key/value separator.
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Apply a `connect_named` declaration.
    pub fn declare(&mut self, declaration: NamedDeclaration, options: &NamedOptions) {
        if let Some(separator) = &options.separator {
            self.separator = separator.clone();
        }

        let (named, default, reset, greedy) = match declaration {
            NamedDeclaration::Toggle(flag) => (BTreeMap::new(), flag, true, flag),
            NamedDeclaration::Rules(rules) => (rules, false, false, true),
        };
        let default = options.default.unwrap_or(default);
        let reset = options.reset.unwrap_or(reset);
        self.greedy = options.greedy.unwrap_or(greedy);

        let rules = match self.rules.take() {
            Some(existing) if !reset => existing,
            _ => BTreeMap::new(),
        };
        let rules = self.rules.insert(rules);
        rules.extend(named);
        if default {
            for key in DEFAULT_NAMED_KEYS {
                rules
                    .entry(key.to_string())
                    .or_insert(NamedRule::Always(true));
            }
        }
    }

    /// Whether a rule explicitly accepts `key:value`.
    ///
    /// Used during reverse routing, where rule-less keys are never named.
    pub fn accepts(&self, key: &str, value: &str, ctx: &NamedContext<'_>) -> bool {
        self.rule(key).is_some_and(|rule| rule.accepts(value, ctx))
    }

    /// Split a `/`-joined argument tail into pass and named arguments.
    ///
    /// `route_rules` and `route_greedy` are a route's own overrides. When a
    /// route declares rules, they layer over the table's and greedy becomes
    /// the route's explicit flag (default false); an empty rule set turns
    /// named extraction off for that route.
    pub fn split_args(
        &self,
        args: &str,
        ctx: &NamedContext<'_>,
        route_rules: Option<&BTreeMap<String, NamedRule>>,
        route_greedy: Option<bool>,
    ) -> (Vec<String>, BTreeMap<String, String>) {
        let mut greedy = route_greedy.unwrap_or(self.greedy);
        let table_rules = self.rules.as_ref();
        let rules: Cow<'_, BTreeMap<String, NamedRule>> = match route_rules {
            Some(overrides) => {
                greedy = route_greedy == Some(true);
                let mut merged = table_rules.cloned().unwrap_or_default();
                merged.extend(overrides.iter().map(|(k, r)| (k.clone(), r.clone())));
                Cow::Owned(merged)
            }
            None => match table_rules {
                Some(r) => Cow::Borrowed(r),
                None => Cow::Owned(BTreeMap::new()),
            },
        };
        let extract = route_rules.map_or(true, |r| !r.is_empty());

        let mut pass = Vec::new();
        let mut named = BTreeMap::new();
        for param in args.split('/').filter(|p| !p.is_empty()) {
            let token = if extract {
                split_named(param, &self.separator)
            } else {
                None
            };
            match token {
                Some((key, value)) => {
                    let is_named = match rules.get(key) {
                        Some(rule) => rule.accepts(value, ctx),
                        None => greedy,
                    };
                    if is_named {
                        named.insert(key.to_string(), value.to_string());
                    } else {
                        pass.push(param.to_string());
                    }
                }
                None => pass.push(param.to_string()),
            }
        }
        (pass, named)
    }
}
