//! Layered metadata scopes.
//!
//! A [`Metadata`] holds ordered local entries plus an optional parent scope.
//! Lookups fall through to the parent chain; nothing is ever written through
//! a child. "Changing" metadata means building a new scope on top of the old
//! one (see [`Metadata::overlay`]).

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// An ordered key/value scope with read fallback to a parent scope.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    entries: IndexMap<String, Value>,
    parent: Option<Arc<Metadata>>,
}

impl Metadata {
    /// An empty root scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty scope that reads through to `parent`.
    pub fn with_parent(parent: Arc<Metadata>) -> Self {
        Self {
            entries: IndexMap::new(),
            parent: Some(parent),
        }
    }

    /// A root scope holding `entries`.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut metadata = Self::new();
        metadata.extend_local(entries);
        metadata
    }

    /// A scope whose local entries are `overrides`, shadowing `parent`.
    pub fn overlay<I, K, V>(parent: Arc<Metadata>, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut metadata = Self::with_parent(parent);
        metadata.extend_local(overrides);
        metadata
    }

    // Construction-time only: a scope is never handed out before this runs.
    fn extend_local<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        // A repeated key keeps its first position and takes the last value.
        for (key, value) in entries {
            self.entries.insert(key.into(), value.into());
        }
    }

    /// Look up `key` locally, then through the parent chain.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(value) = current.get_local(key) {
                return Some(value);
            }
            scope = current.parent.as_deref();
        }
        None
    }

    /// Look up `key` in this scope only.
    pub fn get_local(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Whether `key` is visible from this scope.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// String value for `key`, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Integer value for `key`, if present and an integer.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    /// Boolean value for `key`, if present and a boolean.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// The parent scope, if any.
    pub fn parent(&self) -> Option<&Metadata> {
        self.parent.as_deref()
    }

    /// Local entries in insertion order.
    pub fn local_entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The effective view: every visible key once, with the value a lookup
    /// would return. Local keys come first, then each parent's unshadowed keys.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut out = Vec::new();
        let mut scope = Some(self);
        while let Some(current) = scope {
            for (key, value) in &current.entries {
                if seen.insert(key.as_str()) {
                    out.push((key.as_str(), value));
                }
            }
            scope = current.parent.as_deref();
        }
        out.into_iter()
    }

    /// Visible keys, in the same order as [`Metadata::iter`].
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(k, _)| k)
    }

    /// Number of visible keys.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no key is visible from this scope.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten the effective view into a JSON object.
    pub fn to_json(&self) -> Map<String, Value> {
        self.iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Arc<Metadata> {
        Arc::new(Metadata::from_entries([("Title", "Home"), ("Layout", "page")]))
    }

    #[test]
    fn lookup_falls_back_to_parent() {
        let child = Metadata::overlay(base(), [("Draft", true)]);
        assert_eq!(child.get_bool("Draft"), Some(true));
        assert_eq!(child.get_str("Title"), Some("Home"));
        assert!(child.get("Missing").is_none());
    }

    #[test]
    fn local_entries_shadow_parent() {
        let parent = base();
        let child = Metadata::overlay(parent.clone(), [("Title", "About")]);
        assert_eq!(child.get_str("Title"), Some("About"));
        assert_eq!(parent.get_str("Title"), Some("Home"));
        assert!(child.get_local("Layout").is_none());
    }

    #[test]
    fn lookup_walks_several_levels() {
        let root = base();
        let mid = Arc::new(Metadata::overlay(root, [("Count", 1)]));
        let leaf = Metadata::overlay(mid, [("Count", 2)]);
        assert_eq!(leaf.get_i64("Count"), Some(2));
        assert_eq!(leaf.parent().and_then(|p| p.get_i64("Count")), Some(1));
        assert_eq!(leaf.get_str("Layout"), Some("page"));
    }

    #[test]
    fn duplicate_keys_keep_first_position() {
        let metadata = Metadata::from_entries([("A", 1), ("B", 2), ("A", 3)]);
        let locals: Vec<_> = metadata.local_entries().collect();
        assert_eq!(locals.len(), 2);
        assert_eq!(locals[0], ("A", &Value::from(3)));
        assert_eq!(locals[1].0, "B");
    }

    #[test]
    fn replacing_keys_in_a_large_scope_keeps_order() {
        let first = (0..500).map(|i| (format!("K{i}"), Value::from(i)));
        let again = (0..500).rev().map(|i| (format!("K{i}"), Value::from(-i)));
        let metadata = Metadata::from_entries(first.chain(again));

        let locals: Vec<_> = metadata.local_entries().collect();
        assert_eq!(locals.len(), 500);
        assert_eq!(locals[0].0, "K0");
        assert_eq!(locals[499].0, "K499");
        assert_eq!(metadata.get_local("K250"), Some(&Value::from(-250)));
    }

    #[test]
    fn effective_view_reports_each_key_once() {
        let child = Metadata::overlay(base(), [("Title", "About"), ("Draft", "yes")]);
        let keys: Vec<_> = child.keys().collect();
        assert_eq!(keys, vec!["Title", "Draft", "Layout"]);
        assert_eq!(child.len(), 3);

        let json = child.to_json();
        assert_eq!(json["Title"], Value::from("About"));
        assert_eq!(json["Layout"], Value::from("page"));
    }

    #[test]
    fn empty_scope_with_parent_is_not_empty() {
        let child = Metadata::with_parent(base());
        assert!(!child.is_empty());
        assert!(Metadata::new().is_empty());
    }

    #[test]
    fn typed_getters_reject_wrong_types() {
        let metadata: Metadata = [("N", Value::from(5)), ("S", Value::from("5"))]
            .into_iter()
            .collect();
        assert_eq!(metadata.get_i64("N"), Some(5));
        assert_eq!(metadata.get_i64("S"), None);
        assert_eq!(metadata.get_str("N"), None);
    }
}
