//! Route template compilation.
//!
//! Turns `/:controller/:action/*` into an anchored regex plus the ordered
//! list of placeholder keys. Compilation is a pure function of the
//! template, its defaults and its option patterns.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::error::RouterError;
use crate::value::Params;

/// Route key reserved for plugin scoping; never made optional.
const PLUGIN_KEY: &str = "plugin";
/// Capture group holding the greedy tail.
const ARGS_GROUP: &str = "args";

static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([A-Za-z0-9_-]+[A-Za-z0-9])").expect("static regex"));

/// A piece of a route template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text, copied as-is.
    Literal(&'a str),
    /// A `:name` placeholder.
    Key(&'a str),
}

/// Split a template into literal text and placeholders, left to right.
pub fn segments(template: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut last = 0;
    for caps in TOKEN.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            out.push(Segment::Literal(&template[last..whole.start()]));
        }
        out.push(Segment::Key(name.as_str()));
        last = whole.end();
    }
    if last < template.len() {
        out.push(Segment::Literal(&template[last..]));
    }
    out
}

/// Result of compiling a route template.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    pattern: String,
    regex: Regex,
    keys: Vec<String>,
    optional: Vec<bool>,
    greedy: bool,
    matchers: BTreeMap<String, Regex>,
}

/// Values captured from a path.
#[derive(Debug, Default)]
pub struct Captured {
    /// Placeholder values, in template order. Non-participating optional
    /// groups are absent.
    pub values: Vec<(String, String)>,
    /// The greedy tail, without its leading slash.
    pub args: Option<String>,
}

impl CompiledRoute {
    /// The generated regex source.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Placeholder names in template order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Whether the key's whole segment may be omitted.
    pub fn is_optional(&self, key: &str) -> bool {
        self.keys
            .iter()
            .zip(&self.optional)
            .any(|(k, optional)| k == key && *optional)
    }

    /// True when the template ends in `/*`.
    pub fn is_greedy(&self) -> bool {
        self.greedy
    }

    /// Anchored matcher for a key's option pattern.
    pub fn matcher(&self, key: &str) -> Option<&Regex> {
        self.matchers.get(key)
    }

    /// All option matchers.
    pub fn matchers(&self) -> impl Iterator<Item = (&str, &Regex)> {
        self.matchers.iter().map(|(k, re)| (k.as_str(), re))
    }

    /// Run the compiled regex against a path.
    pub fn capture(&self, path: &str) -> Option<Captured> {
        let caps = self.regex.captures(path)?;
        let values = self
            .keys
            .iter()
            .enumerate()
            .filter_map(|(i, key)| {
                caps.name(&group_name(i))
                    .map(|m| (key.clone(), m.as_str().to_string()))
            })
            .collect();
        let args = caps.name(ARGS_GROUP).map(|m| m.as_str().to_string());
        Some(Captured { values, args })
    }
}

fn group_name(index: usize) -> String {
    format!("k{}", index)
}

/// Compile a route template.
///
/// A placeholder with an option pattern and a default (other than
/// `plugin`) is optional: its group, and the `/` immediately before it,
/// may be omitted from the path. A trailing `/*` becomes an optional
/// capture of the rest of the path.
pub fn compile(
    template: &str,
    defaults: &Params,
    patterns: &BTreeMap<String, String>,
) -> Result<CompiledRoute, RouterError> {
    let matchers = patterns
        .iter()
        .map(|(key, pattern)| {
            Regex::new(&format!("^(?:{})$", pattern))
                .map(|re| (key.clone(), re))
                .map_err(|e| RouterError::InvalidPattern {
                    template: template.to_string(),
                    key: key.clone(),
                    message: e.to_string(),
                })
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    if template.is_empty() || template == "/" {
        let pattern = "^/*$".to_string();
        let regex = build(template, &pattern)?;
        return Ok(CompiledRoute {
            pattern,
            regex,
            keys: Vec::new(),
            optional: Vec::new(),
            greedy: false,
            matchers,
        });
    }

    let (body, greedy) = match template.strip_suffix("/*") {
        Some(body) => (body, true),
        None => (template, false),
    };

    let mut pattern = String::from("^");
    let mut keys = Vec::new();
    let mut optional = Vec::new();

    for segment in segments(body) {
        match segment {
            Segment::Literal(text) => pattern.push_str(&regex_lite::escape(text)),
            Segment::Key(name) => {
                let group = group_name(keys.len());
                let is_optional = match patterns.get(name) {
                    Some(custom) => {
                        let opt = name != PLUGIN_KEY && defaults.contains(name);
                        let mark = if opt { "?" } else { "" };
                        if pattern.ends_with('/') {
                            pattern.pop();
                            pattern.push_str(&format!(
                                "(?:/(?P<{}>{}){}){}",
                                group, custom, mark, mark
                            ));
                        } else {
                            pattern.push_str(&format!(
                                "(?:(?P<{}>{}){}){}",
                                group, custom, mark, mark
                            ));
                        }
                        opt
                    }
                    None => {
                        pattern.push_str(&format!("(?P<{}>[^/]+)", group));
                        false
                    }
                };
                keys.push(name.to_string());
                optional.push(is_optional);
            }
        }
    }

    if greedy {
        pattern.push_str(&format!("(?:/(?P<{}>.*))?", ARGS_GROUP));
    }
    pattern.push_str("[/]*$");

    let regex = build(template, &pattern)?;
    Ok(CompiledRoute {
        pattern,
        regex,
        keys,
        optional,
        greedy,
        matchers,
    })
}

fn build(template: &str, pattern: &str) -> Result<Regex, RouterError> {
    Regex::new(pattern).map_err(|e| RouterError::InvalidPattern {
        template: template.to_string(),
        key: "*".to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn patterns(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn root_template() {
        let compiled = compile("/", &Params::new(), &BTreeMap::new()).unwrap();
        assert_eq!(compiled.pattern(), "^/*$");
        assert!(compiled.keys().is_empty());
        assert!(compiled.capture("/").is_some());
        assert!(compiled.capture("//").is_some());
        assert!(compiled.capture("/posts").is_none());
    }

    #[test]
    fn keys_in_template_order() {
        let compiled = compile("/:controller/:action/*", &Params::new(), &BTreeMap::new()).unwrap();
        assert_eq!(compiled.keys(), &["controller", "action"]);
        assert!(compiled.is_greedy());

        let caps = compiled.capture("/posts/view/5/page:2").unwrap();
        assert_eq!(
            caps.values,
            vec![
                ("controller".to_string(), "posts".to_string()),
                ("action".to_string(), "view".to_string())
            ]
        );
        assert_eq!(caps.args.as_deref(), Some("5/page:2"));
    }

    #[test]
    fn greedy_tail_is_optional() {
        let compiled = compile("/pages/*", &Params::new(), &BTreeMap::new()).unwrap();
        assert!(compiled.capture("/pages").unwrap().args.is_none());
        assert_eq!(compiled.capture("/pages/home").unwrap().args.as_deref(), Some("home"));
    }

    #[test]
    fn literals_are_escaped() {
        let compiled = compile("/files.list/:name", &Params::new(), &BTreeMap::new()).unwrap();
        assert!(compiled.capture("/files.list/a").is_some());
        assert!(compiled.capture("/filesXlist/a").is_none());
    }

    #[test]
    fn short_tokens_are_literal() {
        let compiled = compile("/:a/:id", &Params::new(), &BTreeMap::new()).unwrap();
        assert_eq!(compiled.keys(), &["id"]);
        assert!(compiled.capture("/:a/5").is_some());
    }

    #[test]
    fn optional_segment_with_default() {
        let defaults = Params::new().with("lang", "eng");
        let compiled = compile("/:lang/:controller", &defaults, &patterns(&[("lang", "[a-z]{3}")])).unwrap();
        assert!(compiled.is_optional("lang"));
        assert!(!compiled.is_optional("controller"));

        let caps = compiled.capture("/fra/posts").unwrap();
        assert_eq!(caps.values[0], ("lang".to_string(), "fra".to_string()));

        let caps = compiled.capture("/posts").unwrap();
        assert_eq!(caps.values, vec![("controller".to_string(), "posts".to_string())]);
    }

    #[test]
    fn pattern_without_default_is_mandatory() {
        let compiled =
            compile("/posts/:id", &Params::new(), &patterns(&[("id", "[0-9]+")])).unwrap();
        assert!(!compiled.is_optional("id"));
        assert!(compiled.capture("/posts/12").is_some());
        assert!(compiled.capture("/posts/abc").is_none());
        assert!(compiled.capture("/posts").is_none());
    }

    #[test]
    fn plugin_is_never_optional() {
        let defaults = Params::new().with("plugin", Value::Null);
        let compiled = compile("/:plugin", &defaults, &patterns(&[("plugin", "forum|shop")])).unwrap();
        assert!(!compiled.is_optional("plugin"));
        assert!(compiled.capture("/").is_none());
    }

    #[test]
    fn hyphenated_keys() {
        let compiled = compile("/:blog-slug", &Params::new(), &BTreeMap::new()).unwrap();
        assert_eq!(compiled.keys(), &["blog-slug"]);
        assert_eq!(compiled.capture("/hello").unwrap().values[0].1, "hello");
    }

    #[test]
    fn adjacent_optional_groups() {
        let defaults = Params::new().with("year", "2010").with("month", "01");
        let compiled = compile(
            "/archive/:year/:month",
            &defaults,
            &patterns(&[("year", "[12][0-9]{3}"), ("month", "0[1-9]|1[012]")]),
        )
        .unwrap();
        assert_eq!(compiled.capture("/archive").unwrap().values.len(), 0);
        assert_eq!(compiled.capture("/archive/2011").unwrap().values.len(), 1);
        assert_eq!(compiled.capture("/archive/2011/05").unwrap().values.len(), 2);
        assert!(compiled.capture("/archive/05").unwrap().values[0].0 == "month");
    }

    #[test]
    fn anchored_matchers() {
        let compiled = compile("/p/:id", &Params::new(), &patterns(&[("id", "[0-9]+")])).unwrap();
        let matcher = compiled.matcher("id").unwrap();
        assert!(matcher.is_match("42"));
        assert!(!matcher.is_match("42a"));
    }

    #[test]
    fn bad_pattern_is_reported() {
        let err = compile("/p/:id", &Params::new(), &patterns(&[("id", "[0-9")])).unwrap_err();
        assert!(matches!(err, RouterError::InvalidPattern { ref key, .. } if key == "id"));
    }

    #[test]
    fn segments_split() {
        assert_eq!(
            segments("/:lang/:controller/*"),
            vec![
                Segment::Literal("/"),
                Segment::Key("lang"),
                Segment::Literal("/"),
                Segment::Key("controller"),
                Segment::Literal("/*"),
            ]
        );
    }
}
