//! Allowed-method bookkeeping per route pattern.
//!
//! # Responsibilities
//! - Record which methods each pattern accepts (GET implies HEAD)
//! - Answer sorted `Allow` lists for automatic OPTIONS responses
//! - Hand out route snapshots for introspection
//!
//! # Design Decisions
//! - `RwLock`: registration takes the write lock, OPTIONS and dumps share reads
//! - Each entry keeps a memoised sorted list, rebuilt under the write lock only
//!   when its method set actually changes, so readers never see half an update
//! - Snapshots are deep copies; nothing internal escapes the lock

use axum::http::Method;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};

/// Snapshot of one registered route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    /// Full pattern path, group prefixes included.
    pub pattern: String,
    /// Allowed methods, sorted.
    pub methods: Vec<String>,
    /// True when a method-less handler is bound (it answers every method).
    #[serde(skip_serializing_if = "is_false")]
    pub any_method: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug)]
struct Entry {
    methods: BTreeSet<String>,
    sorted: Arc<[String]>,
    any_method: bool,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            methods: BTreeSet::new(),
            sorted: Arc::from(Vec::<String>::new()),
            any_method: false,
        }
    }
}

impl Entry {
    fn insert(&mut self, method: &str) -> bool {
        if self.methods.contains(method) {
            return false;
        }
        self.methods.insert(method.to_string());
        true
    }

    fn refresh(&mut self) {
        self.sorted = self.methods.iter().cloned().collect();
    }
}

/// Thread-safe pattern → allowed methods table.
#[derive(Debug, Default)]
pub struct Registry {
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `method` on `pattern`. Registering GET also allows HEAD.
    pub fn register(&self, pattern: &str, method: &Method) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.entry(pattern.to_string()).or_default();

        let mut changed = entry.insert(method.as_str());
        if *method == Method::GET {
            changed |= entry.insert(Method::HEAD.as_str());
        }
        if changed {
            entry.refresh();
        }
    }

    /// Record a method-less binding for `pattern`.
    pub fn register_any(&self, pattern: &str) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.entry(pattern.to_string()).or_default().any_method = true;
    }

    /// Sorted allowed methods for `pattern`; empty when unknown.
    pub fn allowed_methods(&self, pattern: &str) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(pattern)
            .map(|entry| entry.sorted.to_vec())
            .unwrap_or_default()
    }

    /// The `Allow` header value for `pattern`, `None` when nothing is allowed.
    pub fn allow_header(&self, pattern: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(pattern)
            .filter(|entry| !entry.sorted.is_empty())
            .map(|entry| entry.sorted.join(", "))
    }

    /// Whether anything at all is registered for `pattern`.
    pub fn contains(&self, pattern: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.contains_key(pattern)
    }

    /// Snapshot of every route, sorted by pattern.
    pub fn routes(&self) -> Vec<Route> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .map(|(pattern, entry)| Route {
                pattern: pattern.clone(),
                methods: entry.sorted.to_vec(),
                any_method: entry.any_method,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
