use thiserror::Error;

/// Errors produced while declaring routes.
///
/// Parsing a path and generating a URL never fail; only declarations can.
#[derive(Debug, Error)]
pub enum RouterError {
    /// E2001: A route option or generated pattern is not a valid regex.
    #[error("E2001: invalid pattern for '{key}' in route '{template}': {message}")]
    InvalidPattern {
        template: String,
        key: String,
        message: String,
    },

    /// E2002: A route class name does not name a known route kind.
    #[error("E2002: unknown route class '{0}'")]
    UnknownRouteClass(String),

    /// E2003: A route declaration does not satisfy its kind's contract.
    #[error("E2003: route '{template}' rejected: {reason}")]
    InvalidRoute { template: String, reason: String },

    /// E2004: A named-parameter rule carries an invalid regex.
    #[error("E2004: invalid named-parameter rule for '{key}': {message}")]
    InvalidNamedRule { key: String, message: String },
}
