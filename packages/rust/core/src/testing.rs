//! Test-only modules.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use docflow_shared::Result;

use crate::context::ExecutionContext;
use crate::document::Document;
use crate::module::Module;

/// Emits `additional_outputs + 1` clones per input. Each clone's content is
/// the input content (or nothing) followed by a running value, which is also
/// stored under `value_key`. Every count survives across calls.
pub(crate) struct CountModule {
    value_key: String,
    additional_outputs: usize,
    value: AtomicI64,
    execute_count: AtomicUsize,
    input_count: AtomicUsize,
    output_count: AtomicUsize,
}

impl CountModule {
    pub(crate) fn new(value_key: impl Into<String>) -> Self {
        Self {
            value_key: value_key.into(),
            additional_outputs: 0,
            value: AtomicI64::new(0),
            execute_count: AtomicUsize::new(0),
            input_count: AtomicUsize::new(0),
            output_count: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_additional_outputs(mut self, additional: usize) -> Self {
        self.additional_outputs = additional;
        self
    }

    pub(crate) fn execute_count(&self) -> usize {
        self.execute_count.load(Ordering::SeqCst)
    }

    pub(crate) fn input_count(&self) -> usize {
        self.input_count.load(Ordering::SeqCst)
    }

    pub(crate) fn output_count(&self) -> usize {
        self.output_count.load(Ordering::SeqCst)
    }

    pub(crate) fn value(&self) -> i64 {
        self.value.load(Ordering::SeqCst)
    }
}

impl Module for CountModule {
    fn execute(&self, inputs: Vec<Document>, _context: &ExecutionContext) -> Result<Vec<Document>> {
        self.execute_count.fetch_add(1, Ordering::SeqCst);
        let mut outputs = Vec::with_capacity(inputs.len() * (self.additional_outputs + 1));
        for input in &inputs {
            self.input_count.fetch_add(1, Ordering::SeqCst);
            for _ in 0..=self.additional_outputs {
                self.output_count.fetch_add(1, Ordering::SeqCst);
                let value = self.value.fetch_add(1, Ordering::SeqCst) + 1;
                let content = format!("{}{value}", input.content().unwrap_or_default());
                outputs.push(input.clone_with(content, [(self.value_key.as_str(), value)]));
            }
        }
        Ok(outputs)
    }

    fn name(&self) -> &str {
        "Count"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::document::no_overrides;
    use crate::metadata::Metadata;

    #[test]
    fn counts_survive_across_calls() {
        let ctx = ExecutionContext::new("test", Arc::new(Metadata::new()));
        let count = CountModule::new("N").with_additional_outputs(1);

        let first = count
            .execute(vec![ctx.new_document(None, no_overrides())], &ctx)
            .expect("first");
        let second = count.execute(first, &ctx).expect("second");

        assert_eq!(count.execute_count(), 2);
        assert_eq!(count.input_count(), 3);
        assert_eq!(count.output_count(), 6);
        assert_eq!(count.value(), 6);

        let contents: Vec<_> = second.iter().map(|d| d.content().unwrap()).collect();
        assert_eq!(contents, vec!["13", "14", "25", "26"]);
        assert_eq!(second[3].metadata().get_i64("N"), Some(6));
    }
}
