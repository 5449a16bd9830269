//! Path routing and reverse routing.
//!
//! A [`RouteTable`] holds an ordered list of [`Route`]s compiled from
//! templates such as `/:controller/:action/*`. Parsing maps a request path
//! to [`RouteParams`] (controller, action, pass and named arguments);
//! [`RouteTable::url`] runs the same routes backwards to build a path from
//! a parameter bag, falling back to a generic composition when no route
//! accepts it.

pub mod compile;
pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod inflector;
pub mod named;
pub mod path;
pub mod patterns;
pub mod plugin;
pub mod query;
pub mod resources;
pub mod route;
pub mod table;
pub mod value;

pub use compile::{compile, CompiledRoute};
pub use config::RouterConfig;
pub use context::{Paths, RequestContext, RequestFrame};
pub use env::{Environment, NoEnvironment};
pub use error::RouterError;
pub use named::{NamedConfig, NamedContext, NamedDeclaration, NamedOptions, NamedRule, NamedRuleSpec};
pub use plugin::{strip_plugin, PluginRegistry, StaticPlugins};
pub use resources::ResourceOptions;
pub use route::{Route, RouteKind, RouteOptions, RouteParams};
pub use table::{RouteTable, UrlOptions, UrlSpec};
pub use value::{Key, Params, Value};
