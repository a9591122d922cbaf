//! Path matching.
//!
//! # Responsibilities
//! - Map path templates to per-method bindings
//! - Delegate literal and capture matching to `matchit`
//! - Answer HEAD with the GET binding when no HEAD binding exists
//!
//! # Design Decisions
//! - One `matchit` entry per path template; methods are resolved afterwards,
//!   so several methods can share a template
//! - A request whose path matches but whose method has no binding is reported
//!   as unmatched together with the template, letting the fallback answer
//!   OPTIONS for it
//! - Generic over the bound value so the matcher knows nothing about groups
//! - Templates that differ only in spelling (`/{$}` and `/`) share one slot,
//!   and `insert` reports the slot's spelling so callers key on it
//! - A `{name...}` tail also answers the bare prefix (`/files/`) with an
//!   empty capture, unless a literal route claims that path

use axum::http::Method;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RouterError;
use crate::routing::params::PathParams;
use crate::routing::pattern;

/// Outcome of a lookup.
#[derive(Debug)]
pub enum Lookup<T> {
    /// A binding accepts this method and path.
    Matched { value: Arc<T>, params: PathParams },
    /// Nothing accepts the request. `pattern` is the template the path
    /// matched, if any.
    Unmatched { pattern: Option<String> },
}

#[derive(Debug)]
struct Slot<T> {
    pattern: String,
    tail: Option<String>,
    by_method: HashMap<Method, Arc<T>>,
    any: Option<Arc<T>>,
}

impl<T> Slot<T> {
    fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            tail: pattern::wildcard_name(pattern).map(str::to_string),
            by_method: HashMap::new(),
            any: None,
        }
    }

    fn select(&self, method: &Method) -> Option<&Arc<T>> {
        self.by_method
            .get(method)
            .or_else(|| {
                if *method == Method::HEAD {
                    self.by_method.get(&Method::GET)
                } else {
                    None
                }
            })
            .or(self.any.as_ref())
    }
}

/// Where a `matchit` route leads.
#[derive(Debug, Clone, Copy)]
struct Target {
    slot: usize,
    /// Route is the bare prefix of the slot's tail capture.
    empty_tail: bool,
}

/// Method-aware wrapper around `matchit::Router`.
#[derive(Debug)]
pub struct Matcher<T> {
    tree: matchit::Router<Target>,
    slots: Vec<Slot<T>>,
    index: HashMap<String, usize>,
    /// Bare-prefix routes added for tail captures, keyed by route.
    empty_tails: HashMap<String, usize>,
}

impl<T> Matcher<T> {
    pub fn new() -> Self {
        Self {
            tree: matchit::Router::new(),
            slots: Vec::new(),
            index: HashMap::new(),
            empty_tails: HashMap::new(),
        }
    }

    /// Bind `value` to `method` (or every method when `None`) on `pattern`.
    ///
    /// Returns the spelling of the template the binding landed on, which is
    /// `pattern` unless an equivalent template was registered first.
    pub fn insert(
        &mut self,
        method: Option<&Method>,
        pattern: &str,
        value: T,
    ) -> Result<String, RouterError> {
        let route = pattern::to_matcher_syntax(pattern)?;

        let slot_id = match self.index.get(&route) {
            Some(&id) => id,
            None => self.add_slot(pattern, route)?,
        };

        let slot = &mut self.slots[slot_id];
        let duplicate = || RouterError::DuplicateRoute {
            method: method.map_or_else(|| "*".to_string(), |m| m.to_string()),
            pattern: pattern.to_string(),
        };
        match method {
            Some(method) => {
                if slot.by_method.contains_key(method) {
                    return Err(duplicate());
                }
                slot.by_method.insert(method.clone(), Arc::new(value));
            }
            None => {
                if slot.any.is_some() {
                    return Err(duplicate());
                }
                slot.any = Some(Arc::new(value));
            }
        }
        Ok(slot.pattern.clone())
    }

    fn add_slot(&mut self, pattern: &str, route: String) -> Result<usize, RouterError> {
        let id = self.slots.len();
        let conflict = |source| RouterError::Conflict {
            pattern: pattern.to_string(),
            source,
        };

        // A literal route takes its path back from a tail capture's bare prefix.
        let reclaimed = self.empty_tails.remove(&route);
        let displaced = reclaimed.and_then(|_| self.tree.remove(route.as_str()));
        let target = Target {
            slot: id,
            empty_tail: false,
        };
        if let Err(source) = self.tree.insert(route.clone(), target) {
            if let (Some(owner), Some(previous)) = (reclaimed, displaced) {
                let _ = self.tree.insert(route.clone(), previous);
                self.empty_tails.insert(route, owner);
            }
            return Err(conflict(source));
        }

        let slot = Slot::new(pattern);
        if slot.tail.is_some() {
            if let Some(bare) = route.rfind("{*").map(|at| &route[..at]) {
                let bare = bare.to_string();
                let target = Target {
                    slot: id,
                    empty_tail: true,
                };
                if self.tree.insert(bare.clone(), target).is_ok() {
                    self.empty_tails.insert(bare, id);
                }
            }
        }

        self.slots.push(slot);
        self.index.insert(route, id);
        Ok(id)
    }

    /// Find the binding for `method` and `path`.
    pub fn lookup(&self, method: &Method, path: &str) -> Lookup<T> {
        let Ok(matched) = self.tree.at(path) else {
            return Lookup::Unmatched { pattern: None };
        };
        let target = *matched.value;
        let slot = &self.slots[target.slot];

        match slot.select(method) {
            Some(value) => {
                let mut params = PathParams::from(&matched.params);
                if let (true, Some(tail)) = (target.empty_tail, &slot.tail) {
                    params.push(tail, "");
                }
                Lookup::Matched {
                    value: Arc::clone(value),
                    params,
                }
            }
            None => Lookup::Unmatched {
                pattern: Some(slot.pattern.clone()),
            },
        }
    }

    /// The registered template `path` matches, regardless of method.
    pub fn template_for(&self, path: &str) -> Option<&str> {
        let matched = self.tree.at(path).ok()?;
        Some(self.slots[matched.value.slot].pattern.as_str())
    }
}

impl<T> Default for Matcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(lookup: Lookup<&'static str>) -> Option<&'static str> {
        match lookup {
            Lookup::Matched { value, .. } => Some(*value),
            Lookup::Unmatched { .. } => None,
        }
    }

    #[test]
    fn test_methods_share_template() {
        let mut matcher = Matcher::new();
        matcher.insert(Some(&Method::GET), "/widgets", "list").unwrap();
        matcher.insert(Some(&Method::POST), "/widgets", "create").unwrap();

        assert_eq!(matched(matcher.lookup(&Method::GET, "/widgets")), Some("list"));
        assert_eq!(matched(matcher.lookup(&Method::POST, "/widgets")), Some("create"));
    }

    #[test]
    fn test_head_falls_back_to_get() {
        let mut matcher = Matcher::new();
        matcher.insert(Some(&Method::GET), "/page", "get").unwrap();
        assert_eq!(matched(matcher.lookup(&Method::HEAD, "/page")), Some("get"));

        matcher.insert(Some(&Method::HEAD), "/page", "head").unwrap();
        assert_eq!(matched(matcher.lookup(&Method::HEAD, "/page")), Some("head"));
    }

    #[test]
    fn test_any_method_binding() {
        let mut matcher = Matcher::new();
        matcher.insert(None, "/hook", "any").unwrap();
        matcher.insert(Some(&Method::GET), "/hook", "get").unwrap();

        assert_eq!(matched(matcher.lookup(&Method::DELETE, "/hook")), Some("any"));
        assert_eq!(matched(matcher.lookup(&Method::GET, "/hook")), Some("get"));
    }

    #[test]
    fn test_unmatched_reports_template() {
        let mut matcher = Matcher::new();
        matcher.insert(Some(&Method::GET), "/users/{id}", "user").unwrap();

        match matcher.lookup(&Method::DELETE, "/users/9") {
            Lookup::Unmatched { pattern } => assert_eq!(pattern.as_deref(), Some("/users/{id}")),
            Lookup::Matched { .. } => panic!("DELETE must not match"),
        }
        match matcher.lookup(&Method::GET, "/nowhere") {
            Lookup::Unmatched { pattern } => assert_eq!(pattern, None),
            Lookup::Matched { .. } => panic!("unknown path must not match"),
        }
    }

    #[test]
    fn test_captures_are_extracted() {
        let mut matcher = Matcher::new();
        matcher
            .insert(Some(&Method::GET), "/files/{path...}", "files")
            .unwrap();
        match matcher.lookup(&Method::GET, "/files/css/site.css") {
            Lookup::Matched { params, .. } => assert_eq!(params.get("path"), Some("css/site.css")),
            Lookup::Unmatched { .. } => panic!("expected a match"),
        }
    }

    #[test]
    fn test_equivalent_templates_share_slot() {
        let mut matcher = Matcher::new();
        assert_eq!(matcher.insert(Some(&Method::GET), "/{$}", "home").unwrap(), "/{$}");
        assert_eq!(matcher.insert(Some(&Method::POST), "/", "post").unwrap(), "/{$}");

        assert_eq!(matched(matcher.lookup(&Method::POST, "/")), Some("post"));
        assert_eq!(matcher.template_for("/"), Some("/{$}"));
    }

    #[test]
    fn test_tail_capture_matches_bare_prefix() {
        let mut matcher = Matcher::new();
        matcher
            .insert(Some(&Method::GET), "/files/{path...}", "files")
            .unwrap();

        match matcher.lookup(&Method::GET, "/files/") {
            Lookup::Matched { value, params } => {
                assert_eq!(*value, "files");
                assert_eq!(params.get("path"), Some(""));
            }
            Lookup::Unmatched { .. } => panic!("bare prefix must match the tail capture"),
        }
        assert_eq!(matcher.template_for("/files/"), Some("/files/{path...}"));
        assert_eq!(matched(matcher.lookup(&Method::GET, "/files")), None);
    }

    #[test]
    fn test_literal_route_claims_bare_prefix() {
        let mut matcher = Matcher::new();
        matcher
            .insert(Some(&Method::GET), "/files/{path...}", "files")
            .unwrap();
        matcher.insert(Some(&Method::GET), "/files/{$}", "index").unwrap();

        assert_eq!(matched(matcher.lookup(&Method::GET, "/files/")), Some("index"));
        assert_eq!(matched(matcher.lookup(&Method::GET, "/files/x")), Some("files"));

        let mut first = Matcher::new();
        first.insert(Some(&Method::GET), "/docs/{$}", "index").unwrap();
        first
            .insert(Some(&Method::GET), "/docs/{page...}", "page")
            .unwrap();
        assert_eq!(matched(first.lookup(&Method::GET, "/docs/")), Some("index"));
    }

    #[test]
    fn test_duplicate_and_conflict() {
        let mut matcher = Matcher::new();
        matcher.insert(Some(&Method::GET), "/users/{id}", "a").unwrap();

        assert!(matches!(
            matcher.insert(Some(&Method::GET), "/users/{id}", "b"),
            Err(RouterError::DuplicateRoute { .. })
        ));
        assert!(matches!(
            matcher.insert(Some(&Method::GET), "/users/{name}", "c"),
            Err(RouterError::Conflict { .. })
        ));
    }
}
