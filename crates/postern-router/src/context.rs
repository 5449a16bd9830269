//! Per-request routing context.
//!
//! Each dispatched request (and each nested sub-request) pushes a frame
//! holding its parsed parameters and paths; the frame is popped when the
//! request finishes. URL generation reads the innermost frame.

use serde::Serialize;

use crate::route::RouteParams;

/// Paths of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paths {
    /// Application base path, e.g. `/app`. Empty when mounted at the root.
    pub base: String,
    /// Full path of the current request, base included.
    pub here: String,
    /// Base of static assets.
    pub webroot: String,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            base: String::new(),
            here: "/".to_string(),
            webroot: "/".to_string(),
        }
    }
}

impl Paths {
    pub fn new(base: impl Into<String>, here: impl Into<String>) -> Self {
        let base = base.into();
        let webroot = format!("{}/", base.trim_end_matches('/'));
        Self {
            base,
            here: here.into(),
            webroot,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestFrame {
    pub params: RouteParams,
    pub paths: Paths,
}

/// Stack of request frames, outermost first.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    frames: Vec<RequestFrame>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context holding a single top-level request.
    pub fn for_request(params: RouteParams, paths: Paths) -> Self {
        let mut ctx = Self::new();
        ctx.push(params, paths);
        ctx
    }

    /// Enter a (sub-)request.
    pub fn push(&mut self, params: RouteParams, paths: Paths) {
        self.frames.push(RequestFrame { params, paths });
    }

    /// Leave the innermost request.
    pub fn pop(&mut self) -> Option<RequestFrame> {
        self.frames.pop()
    }

    fn frame(&self, current: bool) -> Option<&RequestFrame> {
        if current {
            self.frames.last()
        } else {
            self.frames.first()
        }
    }

    /// Parameters of the innermost request (`current`) or of the top-level one.
    pub fn params(&self, current: bool) -> Option<&RouteParams> {
        self.frame(current).map(|f| &f.params)
    }

    /// Paths of the innermost request (`current`) or of the top-level one.
    pub fn paths(&self, current: bool) -> Option<&Paths> {
        self.frame(current).map(|f| &f.paths)
    }

    /// Route matched by the innermost request.
    pub fn current_route(&self) -> Option<usize> {
        self.frames.last().and_then(|f| f.params.route)
    }

    /// Route matched by the top-level request.
    pub fn request_route(&self) -> Option<usize> {
        self.frames.first().and_then(|f| f.params.route)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
