//! Conditional branching: `If` / `ElseIf` / `Else` at the document level.
//!
//! Each condition claims the not-yet-claimed documents its predicate accepts
//! and runs them through its own module list. Results are grouped by branch
//! in registration order, followed by the documents no condition claimed.

use tracing::{debug, instrument};

use docflow_shared::Result;

use crate::context::ExecutionContext;
use crate::document::Document;
use crate::module::{Module, Modules};

type Predicate = Box<dyn Fn(&Document) -> Result<bool> + Send + Sync>;

struct Condition {
    /// `None` always matches (the `Else` branch).
    predicate: Option<Predicate>,
    modules: Modules,
}

/// Routes each document to the first condition whose predicate accepts it.
///
/// Built with [`If::new`] and [`If::else_if`]. Finishing with
/// [`If::otherwise`] adds the `Else` branch and returns an [`IfElse`], which
/// has no way to add further conditions.
///
/// ```ignore
/// let branch = If::new(|d| d.content() == Some("b"), vec![module(double)])
///     .otherwise(vec![module(exclaim)]);
/// ```
pub struct If {
    conditions: Vec<Condition>,
}

impl If {
    /// Start with a predicate and the modules it guards.
    pub fn new<P>(predicate: P, modules: Modules) -> Self
    where
        P: Fn(&Document) -> bool + Send + Sync + 'static,
    {
        Self::try_new(move |doc| Ok(predicate(doc)), modules)
    }

    /// Start with a fallible predicate. A predicate error aborts execution.
    pub fn try_new<P>(predicate: P, modules: Modules) -> Self
    where
        P: Fn(&Document) -> Result<bool> + Send + Sync + 'static,
    {
        let predicate: Predicate = Box::new(predicate);
        Self {
            conditions: vec![Condition {
                predicate: Some(predicate),
                modules,
            }],
        }
    }

    /// Add a condition checked against documents earlier conditions rejected.
    pub fn else_if<P>(self, predicate: P, modules: Modules) -> Self
    where
        P: Fn(&Document) -> bool + Send + Sync + 'static,
    {
        self.try_else_if(move |doc| Ok(predicate(doc)), modules)
    }

    /// Fallible form of [`If::else_if`].
    pub fn try_else_if<P>(mut self, predicate: P, modules: Modules) -> Self
    where
        P: Fn(&Document) -> Result<bool> + Send + Sync + 'static,
    {
        let predicate: Predicate = Box::new(predicate);
        self.conditions.push(Condition {
            predicate: Some(predicate),
            modules,
        });
        self
    }

    /// Add the `Else` branch: every document still unclaimed goes to `modules`.
    pub fn otherwise(mut self, modules: Modules) -> IfElse {
        self.conditions.push(Condition {
            predicate: None,
            modules,
        });
        IfElse { inner: self }
    }

    /// Number of registered conditions.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Always false: an `If` starts with one condition.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl Module for If {
    fn execute(&self, inputs: Vec<Document>, context: &ExecutionContext) -> Result<Vec<Document>> {
        execute_conditions(&self.conditions, inputs, context)
    }

    fn name(&self) -> &str {
        "If"
    }
}

/// An [`If`] closed by an `Else` branch. Leaves no document unclaimed.
pub struct IfElse {
    inner: If,
}

impl IfElse {
    /// Number of registered conditions, including the `Else`.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Always false.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Module for IfElse {
    fn execute(&self, inputs: Vec<Document>, context: &ExecutionContext) -> Result<Vec<Document>> {
        execute_conditions(&self.inner.conditions, inputs, context)
    }

    fn name(&self) -> &str {
        "If"
    }
}

#[instrument(skip_all, fields(conditions = conditions.len(), inputs = inputs.len()))]
fn execute_conditions(
    conditions: &[Condition],
    inputs: Vec<Document>,
    context: &ExecutionContext,
) -> Result<Vec<Document>> {
    let mut results = Vec::new();
    let mut remaining = inputs;

    for (index, condition) in conditions.iter().enumerate() {
        let mut matched = Vec::new();
        let mut unmatched = Vec::new();
        for document in remaining {
            let hit = match &condition.predicate {
                Some(predicate) => predicate(&document)?,
                None => true,
            };
            if hit {
                matched.push(document);
            } else {
                unmatched.push(document);
            }
        }

        debug!(
            branch = index,
            matched = matched.len(),
            unmatched = unmatched.len(),
            "partitioned documents"
        );

        results.extend(context.execute(&condition.modules, matched)?);
        remaining = unmatched;
    }

    // Documents no condition claimed pass through untouched.
    results.extend(remaining);
    Ok(results)
}
