//! Orchestration errors.

use thiserror::Error;

/// Errors that can occur during skill discovery, decision making, or chain
/// execution.
///
/// Only the plumbing layers (discovery, registry, LLM transport) surface
/// these to callers directly; [`crate::orchestrator::SkillOrchestrator`]
/// converts every variant into a terminal
/// [`crate::executor::ExecutionResult`] before returning.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// YAML front-matter parsing or serialization failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File I/O error during skill discovery.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A SKILL.md file is structurally invalid.
    #[error("skill parse error: {0}")]
    SkillParse(String),

    /// An LLM response could not be decoded as the expected JSON shape.
    #[error("decision parse error: {0}")]
    DecisionParse(String),

    /// A completion request failed (transport, auth, or provider error).
    #[error("LLM error: {0}")]
    Llm(String),

    /// An agent runtime invocation failed.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// The registry holds no skills.
    #[error("no skills available in the registry")]
    EmptyRegistry,
}
