//! Per-step accumulated context.
//!
//! A [`TaskContext`] carries the outputs of earlier steps into a later
//! step's prompt. In sequential mode the context grows monotonically: step
//! *k* sees exactly the outputs of steps `0..k` in their original order,
//! never pruned or reordered. In parallel mode every independent step runs
//! with an empty context, and only the synthesis step receives one holding
//! all independent outputs.

use serde::{Deserialize, Serialize};

/// One prior step's output, attributed to the skill that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Name of the skill that produced this output.
    pub skill_name: String,
    /// The output text.
    pub output: String,
}

/// Ordered collection of prior step outputs visible to one step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskContext {
    entries: Vec<ContextEntry>,
}

impl TaskContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step output. Entries keep insertion order.
    pub fn push(&mut self, skill_name: impl Into<String>, output: impl Into<String>) {
        self.entries.push(ContextEntry {
            skill_name: skill_name.into(),
            output: output.into(),
        });
    }

    /// Number of prior outputs visible in this context.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the context holds no prior outputs.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries in insertion order.
    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_preserves_order() {
        let mut ctx = TaskContext::new();
        assert!(ctx.is_empty());

        ctx.push("alpha", "first output");
        ctx.push("beta", "second output");

        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.entries()[0].skill_name, "alpha");
        assert_eq!(ctx.entries()[1].skill_name, "beta");
    }
}
