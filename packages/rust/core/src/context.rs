//! Execution context: how modules run further modules.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use docflow_shared::Result;

use crate::document::Document;
use crate::metadata::Metadata;
use crate::module::ModuleRef;

/// The capability handed to every module while it executes.
///
/// There is no separate nested-pipeline type: a sub-pipeline is a module list
/// run through [`ExecutionContext::execute`], the same way the engine runs
/// top-level pipelines.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pipeline: Arc<str>,
    metadata: Arc<Metadata>,
    depth: usize,
}

impl ExecutionContext {
    /// A root context for `pipeline`, reading engine-wide `metadata`.
    pub fn new(pipeline: impl Into<Arc<str>>, metadata: Arc<Metadata>) -> Self {
        Self {
            pipeline: pipeline.into(),
            metadata,
            depth: 0,
        }
    }

    /// Name of the pipeline being executed.
    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    /// Engine-wide metadata scope.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Number of enclosing `execute` calls (1 for top-level modules).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Run `inputs` through `modules` in order, feeding each module's output
    /// to the next. An empty module list returns `inputs` unchanged.
    ///
    /// The first error aborts the whole call.
    #[instrument(skip_all, fields(pipeline = %self.pipeline, depth = self.depth + 1, modules = modules.len()))]
    pub fn execute(&self, modules: &[ModuleRef], inputs: Vec<Document>) -> Result<Vec<Document>> {
        let nested = self.descend();
        let mut documents = inputs;
        for module in modules {
            let input_count = documents.len();
            documents = module.execute(documents, &nested)?;
            debug!(
                module = module.name(),
                inputs = input_count,
                outputs = documents.len(),
                "module executed"
            );
        }
        Ok(documents)
    }

    /// A new document whose metadata reads through to the engine scope.
    pub fn new_document<I, K, V>(&self, content: Option<String>, entries: I) -> Document
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Document::new(content, Metadata::overlay(Arc::clone(&self.metadata), entries))
    }

    fn descend(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            metadata: Arc::clone(&self.metadata),
            depth: self.depth + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use docflow_shared::DocflowError;

    use super::*;
    use crate::document::no_overrides;
    use crate::module::{Module, module};

    fn context() -> ExecutionContext {
        ExecutionContext::new("test", Arc::new(Metadata::from_entries([("Site", "docs")])))
    }

    fn docs(contents: &[&str]) -> Vec<Document> {
        let ctx = context();
        contents
            .iter()
            .map(|c| ctx.new_document(Some((*c).to_string()), no_overrides()))
            .collect()
    }

    struct Suffix(&'static str);

    impl Module for Suffix {
        fn execute(&self, inputs: Vec<Document>, _context: &ExecutionContext) -> Result<Vec<Document>> {
            Ok(inputs
                .iter()
                .map(|d| d.clone_with(format!("{}{}", d.content().unwrap_or_default(), self.0), no_overrides()))
                .collect())
        }
    }

    struct Fail;

    impl Module for Fail {
        fn execute(&self, _inputs: Vec<Document>, _context: &ExecutionContext) -> Result<Vec<Document>> {
            Err(DocflowError::module("Fail", "boom"))
        }
    }

    struct RecordDepth(Mutex<Vec<usize>>);

    impl Module for RecordDepth {
        fn execute(&self, inputs: Vec<Document>, context: &ExecutionContext) -> Result<Vec<Document>> {
            self.0.lock().unwrap().push(context.depth());
            Ok(inputs)
        }
    }

    #[test]
    fn empty_module_list_is_identity() {
        let inputs = docs(&["a", "b", "c"]);
        let ids: Vec<_> = inputs.iter().map(Document::id).collect();

        let outputs = context().execute(&[], inputs).expect("execute");

        let out_ids: Vec<_> = outputs.iter().map(Document::id).collect();
        assert_eq!(out_ids, ids);
    }

    #[test]
    fn modules_run_in_sequence() {
        let modules = vec![module(Suffix("1")), module(Suffix("2"))];
        let outputs = context().execute(&modules, docs(&["a", "b"])).expect("execute");
        let contents: Vec<_> = outputs.iter().map(|d| d.content().unwrap()).collect();
        assert_eq!(contents, vec!["a12", "b12"]);
    }

    #[test]
    fn first_error_aborts() {
        let after = Arc::new(RecordDepth(Mutex::new(Vec::new())));
        let modules: Vec<ModuleRef> = vec![module(Fail), after.clone() as ModuleRef];
        let err = context().execute(&modules, docs(&["a"])).unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert!(after.0.lock().unwrap().is_empty());
    }

    #[test]
    fn new_documents_read_engine_metadata() {
        let doc = context().new_document(None, [("Title", "x")]);
        assert_eq!(doc.metadata().get_str("Site"), Some("docs"));
        assert_eq!(doc.metadata().get_str("Title"), Some("x"));
    }

    #[test]
    fn nested_execution_increases_depth() {
        struct Nest(Vec<ModuleRef>);

        impl Module for Nest {
            fn execute(&self, inputs: Vec<Document>, context: &ExecutionContext) -> Result<Vec<Document>> {
                context.execute(&self.0, inputs)
            }
        }

        let recorder = Arc::new(RecordDepth(Mutex::new(Vec::new())));
        let inner: Vec<ModuleRef> = vec![recorder.clone() as ModuleRef];
        let modules: Vec<ModuleRef> = vec![recorder.clone() as ModuleRef, module(Nest(inner))];
        context().execute(&modules, docs(&["a"])).expect("execute");

        assert_eq!(*recorder.0.lock().unwrap(), vec![1, 2]);
    }
}
