//! Route pattern parsing.
//!
//! # Syntax
//! ```text
//! [METHOD ]/literal/{name}/{rest...}
//!
//! "GET /users/{id}"     GET only (HEAD is answered by the GET handler)
//! "/users/{id}"         every method
//! "/files/{path...}"    tail capture, must be the final segment
//! "/{$}"                explicit exact match (patterns are always exact here)
//! ```
//!
//! # Design Decisions
//! - Prefix joining is a clean path join: empty and `.` segments vanish, `..`
//!   pops, and the result always starts with `/` and never ends with one
//! - Captures are translated to `matchit` syntax; the first spelling of a route is kept
//!   as the route's registry key

use axum::http::Method;

use crate::error::RouterError;

/// A pattern split into its optional method and its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub method: Option<Method>,
    pub path: String,
}

impl Pattern {
    /// Parse `"METHOD /path"` or `"/path"`.
    pub fn parse(pattern: &str) -> Result<Self, RouterError> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(invalid(pattern, "empty pattern"));
        }

        let (method, path) = if trimmed.starts_with('/') {
            (None, trimmed)
        } else {
            let (token, rest) = trimmed
                .split_once(char::is_whitespace)
                .ok_or_else(|| invalid(pattern, "path must begin with `/`"))?;
            let method = Method::from_bytes(token.as_bytes())
                .map_err(|_| RouterError::InvalidMethod(token.to_string()))?;
            (Some(method), rest.trim_start())
        };

        if !path.starts_with('/') {
            return Err(invalid(pattern, "path must begin with `/`"));
        }
        if path.contains(char::is_whitespace) {
            return Err(invalid(pattern, "path must not contain whitespace"));
        }

        Ok(Self {
            method,
            path: path.to_string(),
        })
    }
}

/// Join a group prefix and a sub-pattern path.
///
/// `join("/api/", "/v1//users")` is `/api/v1/users`; joining is idempotent
/// under repeated nesting.
pub fn join(prefix: &str, path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in prefix.split('/').chain(path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Name of the trailing `{name...}` capture, if any.
pub fn wildcard_name(path: &str) -> Option<&str> {
    let last = path.rsplit('/').next()?;
    last.strip_prefix('{')?
        .strip_suffix("...}")
        .filter(|name| !name.is_empty())
}

/// Translate a pattern path into `matchit` route syntax.
pub fn to_matcher_syntax(path: &str) -> Result<String, RouterError> {
    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len() - 1;
    let mut out = Vec::with_capacity(segments.len());

    for (i, segment) in segments.iter().enumerate() {
        let Some(inner) = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
        else {
            out.push(segment.to_string());
            continue;
        };

        if inner == "$" {
            if i != last {
                return Err(invalid(path, "`{$}` must be the final segment"));
            }
            out.push(String::new());
        } else if let Some(name) = inner.strip_suffix("...") {
            if i != last {
                return Err(invalid(path, "wildcard capture must be the final segment"));
            }
            if name.is_empty() {
                return Err(invalid(path, "wildcard capture needs a name"));
            }
            out.push(format!("{{*{name}}}"));
        } else if inner.is_empty() {
            return Err(invalid(path, "capture needs a name"));
        } else {
            out.push(format!("{{{inner}}}"));
        }
    }

    Ok(out.join("/"))
}

fn invalid(pattern: &str, reason: &'static str) -> RouterError {
    RouterError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    }
}
