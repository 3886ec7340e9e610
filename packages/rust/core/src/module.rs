//! The module contract every pipeline step implements.

use std::sync::Arc;

use docflow_shared::Result;

use crate::context::ExecutionContext;
use crate::document::Document;

/// A pipeline step: turns an ordered batch of documents into a new batch.
///
/// A module may emit zero, one or many documents per input, or ignore its
/// inputs and manufacture documents. Output order is the module's own
/// iteration order. Modules may keep configuration or counters (behind
/// interior mutability) but see documents only through `execute`.
pub trait Module: Send + Sync {
    /// Run this module on `inputs`.
    ///
    /// Use `context` to run nested module lists or to reach engine-wide
    /// metadata.
    fn execute(&self, inputs: Vec<Document>, context: &ExecutionContext) -> Result<Vec<Document>>;

    /// Human-readable module name for tracing.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// A shared handle to a module. Module lists hold these so the same module
/// (and its state) can appear in several places.
pub type ModuleRef = Arc<dyn Module>;

/// An ordered module list: a pipeline or a sub-pipeline.
pub type Modules = Vec<ModuleRef>;

/// Wrap a module into a [`ModuleRef`].
pub fn module(m: impl Module + 'static) -> ModuleRef {
    Arc::new(m)
}

// `docflow_core::modules::content::Content<{{closure}}>` -> `Content`
fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
