//! Build an [`Engine`] from an [`AppConfig`].
//!
//! Each `[[pipelines]]` entry becomes: an optional `ReadFiles`, an optional
//! `Meta` for `set`, and an optional `If` built from `branches` and
//! `otherwise`.

use serde_json::Value;
use tracing::debug;

use docflow_shared::{ActionConfig, AppConfig, BranchConfig, PipelineConfig, Result};

use crate::document::Document;
use crate::engine::{Engine, Pipeline};
use crate::metadata::Metadata;
use crate::module::{ModuleRef, Modules, module};
use crate::modules::{Content, If, Meta, ReadFiles};

/// Validate `config` and wire up an engine. All configuration errors surface
/// here, before anything runs.
pub fn build_engine(config: &AppConfig) -> Result<Engine> {
    config.validate()?;

    let metadata: Metadata = config
        .metadata
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let mut engine = Engine::new(metadata);

    for pipeline in &config.pipelines {
        let modules = build_modules(pipeline)?;
        debug!(pipeline = %pipeline.name, modules = modules.len(), "pipeline configured");
        engine.add_pipeline(Pipeline::new(pipeline.name.clone(), modules))?;
    }

    Ok(engine)
}

fn build_modules(pipeline: &PipelineConfig) -> Result<Modules> {
    let mut modules = Modules::new();

    if let Some(pattern) = &pipeline.read {
        let mut read = ReadFiles::new(pattern)?;
        if pipeline.recursive {
            read = read.recursive();
        }
        modules.push(module(read));
    }

    if !pipeline.set.is_empty() {
        modules.push(module(Meta::constants(pipeline.set.clone())));
    }

    if let Some(branch) = build_branch(&pipeline.branches, pipeline.otherwise.as_ref()) {
        modules.push(branch);
    }

    Ok(modules)
}

fn build_branch(
    branches: &[BranchConfig],
    otherwise: Option<&ActionConfig>,
) -> Option<ModuleRef> {
    let mut iter = branches.iter();
    let Some(first) = iter.next() else {
        // An `otherwise` with no branches applies to everything.
        return otherwise
            .filter(|action| !action.is_noop())
            .map(|action| module(If::new(|_: &Document| true, action_modules(action))));
    };

    let mut chain = If::new(predicate(first), action_modules(&first.action));
    for branch in iter {
        chain = chain.else_if(predicate(branch), action_modules(&branch.action));
    }

    Some(match otherwise {
        Some(action) => module(chain.otherwise(action_modules(action))),
        None => module(chain),
    })
}

fn predicate(branch: &BranchConfig) -> impl Fn(&Document) -> bool + Send + Sync + 'static {
    let key = branch.key.clone();
    let equals: Option<Value> = branch.equals.clone();
    let exists = branch.exists;
    move |doc: &Document| {
        let value = doc.get(&key);
        let equals_ok = equals.as_ref().is_none_or(|expected| value == Some(expected));
        let exists_ok = exists.is_none_or(|want| value.is_some() == want);
        equals_ok && exists_ok
    }
}

fn action_modules(action: &ActionConfig) -> Modules {
    let mut modules = Modules::new();
    if !action.set.is_empty() {
        modules.push(module(Meta::constants(action.set.clone())));
    }
    if action.prepend.is_some() || action.append.is_some() {
        let prefix = action.prepend.clone().unwrap_or_default();
        let suffix = action.append.clone().unwrap_or_default();
        modules.push(module(Content::new(move |doc| {
            Ok(format!("{prefix}{}{suffix}", doc.content().unwrap_or_default()))
        })));
    }
    modules
}
