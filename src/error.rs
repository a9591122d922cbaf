//! Router error definitions.
//!
//! Every error here is a setup-time error: it is raised while routes are being
//! registered or static adapters are being configured, never while serving.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building a [`Mux`](crate::routing::Mux).
#[derive(Debug, Error)]
pub enum RouterError {
    /// The route pattern is syntactically invalid.
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    /// The method prefix of a pattern is not a valid HTTP method token.
    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),

    /// A convenience method (e.g. `get`) was combined with a pattern carrying
    /// a different method prefix.
    #[error("route `{pattern}` declares method {declared} but was registered as {expected}")]
    MethodMismatch {
        pattern: String,
        declared: String,
        expected: String,
    },

    /// A handler is already bound for this method and pattern.
    #[error("a handler is already registered for {method} {pattern}")]
    DuplicateRoute { method: String, pattern: String },

    /// The path matcher rejected the pattern (overlapping or malformed route).
    #[error("route `{pattern}` conflicts with an existing route: {source}")]
    Conflict {
        pattern: String,
        #[source]
        source: matchit::InsertError,
    },

    /// The static file root does not exist or is not a directory.
    #[error("static file root `{}` is not a readable directory", .0.display())]
    MissingFilesystem(PathBuf),

    /// A directory adapter was given a pattern without a tail capture.
    #[error("pattern `{0}` must end with a wildcard capture such as `{{path...}}`")]
    MissingWildcard(String),

    /// A filesystem prefix was not absolute.
    #[error("filesystem prefix `{0}` must begin with `/`")]
    RelativePrefix(String),

    /// Route snapshot serialization failed.
    #[error("failed to serialize routes: {0}")]
    Serialize(#[from] serde_json::Error),
}
