//! Postern route table tool.
//!
//! Loads a route manifest and parses paths or generates URLs against it.

use std::collections::HashMap;
use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use postern_lib::RoutesManifest;
use postern_router::path::strip_base;
use postern_router::{Params, Paths, RequestContext, RouteTable, UrlOptions, Value};
use postern_telemetry::{
    log_default_routes_connected, log_route_matched, log_route_not_matched, log_route_rejected,
    log_routes_loaded, log_url_generated, LogFormat, Telemetry, TelemetryConfig,
};

#[derive(Parser, Debug)]
#[command(name = "postern", about = "Postern route table tool", version)]
struct Cli {
    /// Log level.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log format (json or pretty).
    #[arg(long, global = true, default_value = "json")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the connected routes in priority order.
    Routes {
        /// Route manifest (YAML).
        #[arg(short, long)]
        manifest: String,

        /// Include the generated default routes.
        #[arg(long)]
        with_defaults: bool,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Parse a request path into route parameters.
    Parse {
        /// Route manifest (YAML).
        #[arg(short, long)]
        manifest: String,

        /// Request path.
        path: String,

        /// Request method, checked by `[method]` guards.
        #[arg(long, default_value = "GET")]
        method: String,

        /// Extra request variables (`HTTPS=on`).
        #[arg(long = "env", value_parser = parse_key_val)]
        env: Vec<(String, String)>,

        /// Application base path, stripped before parsing.
        #[arg(long, default_value = "")]
        base: String,
    },

    /// Generate a URL.
    Url {
        /// Route manifest (YAML).
        #[arg(short, long)]
        manifest: String,

        /// URL parameters (`controller=posts`, `0=5`, `admin=true`).
        #[arg(short, long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,

        /// Literal path to resolve instead of parameters.
        #[arg(long, conflicts_with = "params")]
        path: Option<String>,

        /// Current request path; its parameters fill in missing keys.
        #[arg(long)]
        from: Option<String>,

        /// Application base path.
        #[arg(long, default_value = "")]
        base: String,

        /// Prefix the full base URL.
        #[arg(long)]
        full: bool,

        /// Escape `&` in query strings.
        #[arg(long)]
        escape: bool,
    },
}

/// Parse a `KEY=VALUE` argument.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Command-line text to a parameter value; `true`/`false` become flags.
fn param_value(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        other => Value::from(other),
    }
}

fn load_table(manifest: &str) -> Result<RouteTable, String> {
    let path = Path::new(manifest);
    if !path.exists() {
        return Err(format!("manifest not found: {}", manifest));
    }
    let manifest = RoutesManifest::load(path).map_err(|e| e.to_string())?;
    let table = manifest.build().map_err(|e| {
        log_route_rejected!(manifest = %path.display(), error = %e, "route manifest rejected");
        e.to_string()
    })?;
    log_routes_loaded!(
        manifest = %path.display(),
        routes = table.len(),
        "route manifest loaded"
    );
    Ok(table)
}

fn run_routes(manifest: &str, with_defaults: bool, json: bool) -> ExitCode {
    let table = match load_table(manifest) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };
    if with_defaults {
        let before = table.len();
        table.ensure_default_routes();
        log_default_routes_connected!(count = table.len() - before, "default routes connected");
    }

    let mut rows = Vec::new();
    for (index, route) in table.routes().iter().enumerate() {
        let compiled = match route.compile() {
            Ok(compiled) => compiled,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::from(1);
            }
        };
        rows.push(serde_json::json!({
            "index": index,
            "template": route.template(),
            "pattern": compiled.pattern(),
            "keys": compiled.keys(),
            "defaults": route.defaults(),
            "kind": route.kind().as_str(),
        }));
    }

    if json {
        match serde_json::to_string_pretty(&rows) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::from(1);
            }
        }
    } else {
        for (index, route) in table.routes().iter().enumerate() {
            println!("{:>3}  {}", index, route.template());
        }
        eprintln!("{} route(s)", table.len());
    }
    ExitCode::SUCCESS
}

fn run_parse(manifest: &str, path: &str, method: &str, env: &[(String, String)], base: &str) -> ExitCode {
    let table = match load_table(manifest) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    let mut vars: HashMap<String, String> = env.iter().cloned().collect();
    vars.insert("REQUEST_METHOD".to_string(), method.to_uppercase());

    let target = strip_base(path, base);
    let parsed = table.parse(&target, &vars);
    match parsed.route {
        Some(index) => log_route_matched!(path = %target, route = index, "route matched"),
        None => log_route_not_matched!(path = %target, "no route matched"),
    }

    match serde_json::to_string_pretty(&parsed) {
        Ok(out) => println!("{}", out),
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    }
    if parsed.route.is_none() {
        eprintln!("no route matched {}", target);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

struct UrlRequest<'a> {
    params: &'a [(String, String)],
    path: Option<&'a str>,
    from: Option<&'a str>,
    base: &'a str,
    options: UrlOptions,
}

fn run_url(manifest: &str, request: UrlRequest<'_>) -> ExitCode {
    let table = match load_table(manifest) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    let mut ctx = RequestContext::new();
    if let Some(from) = request.from {
        let here = format!("{}{}", request.base, from);
        let current = table.parse(from, &HashMap::<String, String>::new());
        ctx.push(current, Paths::new(request.base, here));
    } else if !request.base.is_empty() {
        ctx.push(Default::default(), Paths::new(request.base, request.base));
    }

    let url = match request.path {
        Some(path) => table.url(path, &request.options, &ctx),
        None => {
            let params: Params = request
                .params
                .iter()
                .map(|(k, v)| (k.as_str(), param_value(v)))
                .collect();
            table.url(params, &request.options, &ctx)
        }
    };
    log_url_generated!(url = %url, "url generated");
    println!("{}", url);
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(log_format) = LogFormat::parse(&cli.log_format) else {
        eprintln!("error: unknown log format: {}", cli.log_format);
        return ExitCode::from(1);
    };
    let config = TelemetryConfig::new()
        .with_log_level(cli.log_level.as_str())
        .with_log_format(log_format);
    if let Err(e) = Telemetry::init(config) {
        eprintln!("error: {}", e);
        return ExitCode::from(1);
    }

    match cli.command {
        Commands::Routes {
            manifest,
            with_defaults,
            json,
        } => run_routes(&manifest, with_defaults, json),
        Commands::Parse {
            manifest,
            path,
            method,
            env,
            base,
        } => run_parse(&manifest, &path, &method, &env, &base),
        Commands::Url {
            manifest,
            params,
            path,
            from,
            base,
            full,
            escape,
        } => run_url(
            &manifest,
            UrlRequest {
                params: &params,
                path: path.as_deref(),
                from: from.as_deref(),
                base: &base,
                options: UrlOptions { full, escape },
            },
        ),
    }
}
