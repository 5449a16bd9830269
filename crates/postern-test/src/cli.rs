//! CLI regression tests for the `postern` binary.
//!
//! These tests invoke the binary as a subprocess to catch regressions in flag
//! names, exit codes and output formats.
//!
//! Run with: `cargo test -p postern-test`
//! Requires the `postern` binary to be built first (`cargo build -p postern`).

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

use crate::TestManifest;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns an assert_cmd Command wrapping the `postern` binary.
fn postern() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("postern").expect("postern binary not found, run `cargo build -p postern` first")
}

/// Absolute path to the shared test fixtures directory.
fn fixtures() -> PathBuf {
    // CARGO_MANIFEST_DIR = .../crates/postern-test
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("crates/")
        .parent()
        .expect("workspace root")
        .join("tests/fixtures")
}

fn blog() -> PathBuf {
    fixtures().join("blog.yaml")
}

// ---------------------------------------------------------------------------
// postern routes
// ---------------------------------------------------------------------------

#[test]
fn routes_lists_declared_routes_in_order() {
    postern()
        .args(["routes", "--manifest"])
        .arg(blog())
        .assert()
        .success()
        .stdout(contains("/api/comments").and(contains("/blog/:year/:month")))
        .stdout(contains("/:controller/:action/*").not())
        .stderr(contains("11 route(s)"));
}

#[test]
fn routes_with_defaults_json() {
    let output = postern()
        .args(["routes", "--with-defaults", "--json", "--manifest"])
        .arg(blog())
        .output()
        .expect("failed to run postern");
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    let rows = rows.as_array().expect("array");
    let templates: Vec<&str> = rows
        .iter()
        .filter_map(|r| r["template"].as_str())
        .collect();
    assert_eq!(templates.first(), Some(&"/api/comments"));
    assert_eq!(templates.last(), Some(&"/:controller/:action/*"));
    assert!(templates.contains(&"/admin/:plugin/:controller/:action/*"));
    assert!(rows.iter().any(|r| r["kind"] == "plugin_short"));
}

#[test]
fn routes_missing_manifest_exits_one() {
    postern()
        .args(["routes", "--manifest", "this-file-does-not-exist.yaml"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("manifest not found"));
}

#[test]
fn routes_invalid_yaml_exits_one() {
    postern()
        .args(["routes", "--manifest"])
        .arg(fixtures().join("invalid-yaml.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("failed to parse"));
}

#[test]
fn routes_unknown_class_exits_one() {
    postern()
        .args(["routes", "--manifest"])
        .arg(fixtures().join("invalid-class.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2002"));
}

#[test]
fn routes_rejection_is_logged() {
    postern()
        .args(["--log-level", "warn", "routes", "--manifest"])
        .arg(fixtures().join("invalid-class.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains(r#""event":"route_rejected""#).and(contains("E2002")));
}

#[test]
fn routes_invalid_pattern_exits_one() {
    postern()
        .args(["routes", "--manifest"])
        .arg(fixtures().join("invalid-pattern.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2001"));
}

// ---------------------------------------------------------------------------
// postern parse
// ---------------------------------------------------------------------------

#[test]
fn parse_root_passes_home() {
    postern()
        .args(["parse", "--manifest"])
        .arg(blog())
        .arg("/")
        .assert()
        .success()
        .stdout(contains(r#""action": "display""#).and(contains(r#""home""#)));
}

#[test]
fn parse_archive_moves_keys_to_pass() {
    let output = postern()
        .args(["parse", "--manifest"])
        .arg(blog())
        .arg("/blog/2010/05")
        .output()
        .expect("failed to run postern");
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(parsed["controller"], "posts");
    assert_eq!(parsed["action"], "archive");
    assert_eq!(parsed["pass"], serde_json::json!(["2010", "05"]));
    assert!(parsed.get("year").is_none());
}

#[test]
fn parse_default_route_extracts_named() {
    let output = postern()
        .args(["parse", "--manifest"])
        .arg(blog())
        .arg("/posts/view/5/page:2")
        .output()
        .expect("failed to run postern");
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(parsed["controller"], "posts");
    assert_eq!(parsed["action"], "view");
    assert_eq!(parsed["pass"], serde_json::json!(["5"]));
    assert_eq!(parsed["named"]["page"], "2");
}

#[test]
fn parse_method_guard() {
    postern()
        .args(["parse", "--method", "post", "--manifest"])
        .arg(blog())
        .arg("/login")
        .assert()
        .success()
        .stdout(contains(r#""controller": "users""#));

    postern()
        .args(["parse", "--method", "DELETE", "--manifest"])
        .arg(blog())
        .arg("/login")
        .assert()
        .success()
        .stdout(contains(r#""controller": "login""#));
}

#[test]
fn parse_strips_base() {
    postern()
        .args(["parse", "--base", "/app", "--manifest"])
        .arg(blog())
        .arg("/app/blog/2010/05")
        .assert()
        .success()
        .stdout(contains(r#""action": "archive""#));
}

#[test]
fn parse_unmatched_exits_one() {
    postern()
        .args(["parse", "--manifest"])
        .arg(fixtures().join("minimal.yaml"))
        .arg("/nowhere")
        .assert()
        .failure()
        .code(1)
        .stderr(contains("no route matched"));
}

#[test]
fn parse_rejects_malformed_env() {
    postern()
        .args(["parse", "--env", "HTTPS", "--manifest"])
        .arg(blog())
        .arg("/")
        .assert()
        .failure()
        .stderr(contains("KEY=VALUE"));
}

// ---------------------------------------------------------------------------
// postern url
// ---------------------------------------------------------------------------

#[test]
fn url_renders_declared_route() {
    postern()
        .args(["url", "-p", "controller=posts", "-p", "action=archive"])
        .args(["-p", "year=2010", "-p", "month=05", "--manifest"])
        .arg(blog())
        .assert()
        .success()
        .stdout("/blog/2010/05\n");
}

#[test]
fn url_named_argument_through_default_route() {
    postern()
        .args(["url", "-p", "controller=posts", "-p", "page=2", "--manifest"])
        .arg(blog())
        .assert()
        .success()
        .stdout("/posts/index/page:2\n");
}

#[test]
fn url_falls_back_to_composer() {
    postern()
        .args(["url", "-p", "controller=reports", "-p", "action=show"])
        .args(["-p", "0=a", "-p", "year=2010", "--manifest"])
        .arg(blog())
        .assert()
        .success()
        .stdout("/reports/show/a/year:2010\n");
}

#[test]
fn url_inherits_prefix_from_current_request() {
    postern()
        .args(["url", "--from", "/admin/posts/edit/5", "-p", "action=view", "--manifest"])
        .arg(blog())
        .assert()
        .success()
        .stdout("/admin/posts/view\n");

    postern()
        .args(["url", "--from", "/admin/posts/edit/5"])
        .args(["-p", "action=view", "-p", "admin=false", "--manifest"])
        .arg(blog())
        .assert()
        .success()
        .stdout("/posts/view\n");
}

#[test]
fn url_literal_path_with_base_and_full() {
    postern()
        .args(["url", "--path", "/about", "--base", "/app", "--manifest"])
        .arg(fixtures().join("minimal.yaml"))
        .assert()
        .success()
        .stdout("/app/about\n");

    postern()
        .args(["url", "--path", "/about", "--full", "--manifest"])
        .arg(fixtures().join("minimal.yaml"))
        .assert()
        .success()
        .stdout("http://localhost/about\n");
}

#[test]
fn url_from_inline_manifest() {
    let manifest = TestManifest::new(
        "router:\n  connect_defaults: false\nroutes:\n  - template: /:lang/:controller\n    defaults: { lang: eng }\n    options:\n      patterns: { lang: \"[a-z]{3}\" }\n",
    )
    .expect("manifest");

    postern()
        .args(["url", "-p", "controller=posts", "-p", "lang=fra", "--manifest"])
        .arg(manifest.path())
        .assert()
        .success()
        .stdout("/fra/posts\n");

    postern()
        .args(["url", "-p", "controller=posts", "-p", "lang=eng", "--manifest"])
        .arg(manifest.path())
        .assert()
        .success()
        .stdout("/posts\n");
}

#[test]
fn unknown_log_format_exits_one() {
    postern()
        .args(["--log-format", "xml", "routes", "--manifest"])
        .arg(blog())
        .assert()
        .failure()
        .code(1)
        .stderr(contains("unknown log format"));
}
