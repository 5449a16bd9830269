//! REST resource routes.

use crate::error::RouterError;
use crate::inflector::underscore;
use crate::patterns::{ID, UUID};
use crate::route::RouteOptions;
use crate::table::{connect_locked, RouteTable};
use crate::value::Params;

/// (action, method, has id) for each generated route, in connect order.
const RESOURCE_MAP: [(&str, &str, bool); 6] = [
    ("index", "GET", false),
    ("view", "GET", true),
    ("add", "POST", false),
    ("edit", "PUT", true),
    ("delete", "DELETE", true),
    ("edit", "POST", true),
];

/// Options for [`RouteTable::map_resources`].
#[derive(Debug, Clone)]
pub struct ResourceOptions {
    /// Path prepended to every resource, e.g. `/api/`.
    pub prefix: String,
    /// Pattern the `:id` segment must match.
    pub id: String,
}

impl Default for ResourceOptions {
    fn default() -> Self {
        Self {
            prefix: "/".to_string(),
            id: format!("{}|{}", ID, UUID),
        }
    }
}

impl RouteTable {
    /// Connect method-guarded index/view/add/edit/delete routes for each
    /// controller. Returns every resource mapped so far.
    pub fn map_resources<I, S>(
        &self,
        controllers: I,
        options: &ResourceOptions,
    ) -> Result<Vec<String>, RouterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.state.write();
        for controller in controllers {
            let name = underscore(controller.as_ref());
            for (action, method, with_id) in RESOURCE_MAP {
                let template = if with_id {
                    format!("{}{}/:id", options.prefix, name)
                } else {
                    format!("{}{}", options.prefix, name)
                };
                let defaults = Params::new()
                    .with("controller", name.as_str())
                    .with("action", action)
                    .with("[method]", method);
                let route_options = RouteOptions::new()
                    .pattern("id", options.id.as_str())
                    .pass(["id"]);
                connect_locked(&mut state, &template, defaults, route_options)?;
            }
            if !state.resources.contains(&name) {
                state.resources.push(name);
            }
        }
        Ok(state.resources.clone())
    }
}
