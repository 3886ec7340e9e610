//! Named pipelines and the engine that runs them in order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use docflow_shared::{DocflowError, Result};

use crate::context::ExecutionContext;
use crate::document::{Document, no_overrides};
use crate::metadata::Metadata;
use crate::module::{ModuleRef, Modules};

/// A named, ordered module list.
pub struct Pipeline {
    name: String,
    modules: Modules,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, modules: Modules) -> Self {
        Self {
            name: name.into(),
            modules,
        }
    }

    /// Append a module.
    pub fn then(mut self, module: ModuleRef) -> Self {
        self.modules.push(module);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modules(&self) -> &[ModuleRef] {
        &self.modules
    }
}

/// Output of one pipeline run.
#[derive(Debug)]
pub struct PipelineOutput {
    /// Pipeline name.
    pub name: String,
    /// Final documents, in pipeline output order.
    pub documents: Vec<Document>,
}

/// Result of [`Engine::execute`].
#[derive(Debug)]
pub struct EngineResult {
    /// One entry per pipeline, in execution order.
    pub outputs: Vec<PipelineOutput>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

impl EngineResult {
    /// Documents produced by the pipeline called `name`.
    pub fn documents(&self, name: &str) -> Option<&[Document]> {
        self.outputs
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.documents.as_slice())
    }

    /// Documents produced across all pipelines.
    pub fn document_count(&self) -> usize {
        self.outputs.iter().map(|o| o.documents.len()).sum()
    }
}

/// Progress callback for reporting engine status.
pub trait ProgressReporter: Send + Sync {
    /// Called before a pipeline starts (`index` is 1-based).
    fn pipeline_started(&self, name: &str, index: usize, total: usize);
    /// Called after a pipeline completes.
    fn pipeline_finished(&self, name: &str, documents: usize);
    /// Called when every pipeline has completed.
    fn done(&self, result: &EngineResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn pipeline_started(&self, _name: &str, _index: usize, _total: usize) {}
    fn pipeline_finished(&self, _name: &str, _documents: usize) {}
    fn done(&self, _result: &EngineResult) {}
}

/// Holds engine-wide metadata and the pipelines to run.
pub struct Engine {
    metadata: Arc<Metadata>,
    pipelines: Vec<Pipeline>,
}

impl Engine {
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata: Arc::new(metadata),
            pipelines: Vec::new(),
        }
    }

    /// Register a pipeline. Names must be unique.
    pub fn add_pipeline(&mut self, pipeline: Pipeline) -> Result<()> {
        if self.pipelines.iter().any(|p| p.name == pipeline.name) {
            return Err(DocflowError::config(format!(
                "duplicate pipeline name '{}'",
                pipeline.name
            )));
        }
        self.pipelines.push(pipeline);
        Ok(())
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    /// Engine-wide metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Run every pipeline in registration order.
    ///
    /// Each pipeline starts from a single seed document with no content whose
    /// metadata reads through to the engine scope. The first error aborts the
    /// run; outputs of pipelines that already finished are discarded.
    #[instrument(skip_all, fields(pipelines = self.pipelines.len()))]
    pub fn execute(&self, progress: &dyn ProgressReporter) -> Result<EngineResult> {
        let start = Instant::now();
        let total = self.pipelines.len();
        let mut outputs = Vec::with_capacity(total);

        for (i, pipeline) in self.pipelines.iter().enumerate() {
            progress.pipeline_started(&pipeline.name, i + 1, total);

            let context = ExecutionContext::new(pipeline.name.as_str(), Arc::clone(&self.metadata));
            let seed = context.new_document(None, no_overrides());
            let documents = context.execute(&pipeline.modules, vec![seed])?;

            info!(pipeline = %pipeline.name, documents = documents.len(), "pipeline complete");
            progress.pipeline_finished(&pipeline.name, documents.len());

            outputs.push(PipelineOutput {
                name: pipeline.name.clone(),
                documents,
            });
        }

        let result = EngineResult {
            outputs,
            elapsed: start.elapsed(),
        };
        progress.done(&result);

        info!(
            documents = result.document_count(),
            elapsed_ms = result.elapsed.as_millis(),
            "engine run complete"
        );

        Ok(result)
    }
}
