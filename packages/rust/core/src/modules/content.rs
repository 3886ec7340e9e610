//! Closure-driven modules: replace content, add metadata.

use serde_json::Value;

use docflow_shared::Result;

use crate::context::ExecutionContext;
use crate::document::{Document, no_overrides};
use crate::module::Module;

type ContentFn = Box<dyn Fn(&Document) -> Result<String> + Send + Sync>;
type ValueFn = Box<dyn Fn(&Document) -> Result<Value> + Send + Sync>;

/// Replaces each document's content with the result of a closure.
pub struct Content {
    content: ContentFn,
}

impl Content {
    pub fn new<F>(content: F) -> Self
    where
        F: Fn(&Document) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            content: Box::new(content),
        }
    }

    /// Insert `prefix` before the existing content.
    pub fn prepend(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self::new(move |doc| Ok(format!("{prefix}{}", doc.content().unwrap_or_default())))
    }

    /// Add `suffix` after the existing content.
    pub fn append(suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        Self::new(move |doc| Ok(format!("{}{suffix}", doc.content().unwrap_or_default())))
    }
}

impl Module for Content {
    fn execute(&self, inputs: Vec<Document>, _context: &ExecutionContext) -> Result<Vec<Document>> {
        inputs
            .iter()
            .map(|doc| Ok(doc.clone_with((self.content)(doc)?, no_overrides())))
            .collect()
    }

    fn name(&self) -> &str {
        "Content"
    }
}

/// Adds metadata to each document. Keys are applied in one layer, in the
/// order they were added.
pub struct Meta {
    entries: Vec<(String, ValueFn)>,
}

impl Meta {
    /// Set `key` to the value computed from each document.
    pub fn new<F>(key: impl Into<String>, value: F) -> Self
    where
        F: Fn(&Document) -> Result<Value> + Send + Sync + 'static,
    {
        let value: ValueFn = Box::new(value);
        Self {
            entries: vec![(key.into(), value)],
        }
    }

    /// Set a fixed value for every key in `values`.
    pub fn constants<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let entries = values
            .into_iter()
            .map(|(key, value)| {
                let f: ValueFn = Box::new(move |_: &Document| Ok(value.clone()));
                (key.into(), f)
            })
            .collect();
        Self { entries }
    }

    /// Also set `key` to a computed value.
    pub fn and<F>(mut self, key: impl Into<String>, value: F) -> Self
    where
        F: Fn(&Document) -> Result<Value> + Send + Sync + 'static,
    {
        let value: ValueFn = Box::new(value);
        self.entries.push((key.into(), value));
        self
    }
}

impl Module for Meta {
    fn execute(&self, inputs: Vec<Document>, _context: &ExecutionContext) -> Result<Vec<Document>> {
        inputs
            .iter()
            .map(|doc| {
                let overrides = self
                    .entries
                    .iter()
                    .map(|(key, value)| Ok((key.clone(), value(doc)?)))
                    .collect::<Result<Vec<(String, Value)>>>()?;
                Ok(doc.clone_metadata(overrides))
            })
            .collect()
    }

    fn name(&self) -> &str {
        "Meta"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use docflow_shared::DocflowError;

    use super::*;
    use crate::metadata::Metadata;

    fn context() -> ExecutionContext {
        ExecutionContext::new("test", Arc::new(Metadata::new()))
    }

    fn doc(content: &str) -> Document {
        context().new_document(Some(content.to_string()), [("Title", "t")])
    }

    #[test]
    fn prepend_and_append_wrap_content() {
        let ctx = context();
        let out = Content::prepend("<").execute(vec![doc("x")], &ctx).unwrap();
        let out = Content::append(">").execute(out, &ctx).unwrap();
        assert_eq!(out[0].content(), Some("<x>"));
        assert_eq!(out[0].metadata().get_str("Title"), Some("t"));
    }

    #[test]
    fn content_closure_error_aborts() {
        let failing = Content::new(|_| Err(DocflowError::module("Content", "nope")));
        assert!(failing.execute(vec![doc("x")], &context()).is_err());
    }

    #[test]
    fn meta_computes_values_per_document() {
        let meta = Meta::new("Length", |d| Ok(Value::from(d.content().map_or(0, str::len))))
            .and("Upper", |d| Ok(Value::from(d.content().unwrap_or_default().to_uppercase())));

        let out = meta.execute(vec![doc("abc"), doc("de")], &context()).unwrap();
        assert_eq!(out[0].metadata().get_i64("Length"), Some(3));
        assert_eq!(out[1].metadata().get_str("Upper"), Some("DE"));
        assert_eq!(out[1].content(), Some("de"));
    }

    #[test]
    fn meta_constants_shadow_existing_keys() {
        let meta = Meta::constants([("Title", Value::from("new")), ("Draft", Value::from(true))]);
        let out = meta.execute(vec![doc("x")], &context()).unwrap();
        assert_eq!(out[0].metadata().get_str("Title"), Some("new"));
        assert_eq!(out[0].metadata().get_bool("Draft"), Some(true));
    }
}
