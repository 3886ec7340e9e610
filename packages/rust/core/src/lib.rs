//! Document pipeline core for docflow.
//!
//! Documents ([`Document`]) carry content plus layered [`Metadata`]. Modules
//! ([`Module`]) turn a batch of documents into a new batch, and an
//! [`ExecutionContext`] runs module lists, including the nested lists that
//! [`If`](modules::If) branches delegate to. [`Engine`] runs named pipelines
//! on top of that.

pub mod configure;
pub mod context;
pub mod document;
pub mod engine;
pub mod metadata;
pub mod module;
pub mod modules;

#[cfg(test)]
mod testing;

pub use configure::build_engine;
pub use context::ExecutionContext;
pub use document::{Document, DocumentId, no_overrides};
pub use engine::{Engine, EngineResult, Pipeline, PipelineOutput, ProgressReporter, SilentProgress};
pub use metadata::Metadata;
pub use module::{Module, ModuleRef, Modules, module};
