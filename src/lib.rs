//! # skillweave
//!
//! LLM-driven skill orchestration. Given a free-form task and a directory of
//! discoverable skill bundles, skillweave decides whether any skill is needed
//! at all, which skill(s) fit, and whether they should run as a sequential
//! chain (each step building on the last) or in parallel (independent steps
//! merged by a final synthesis step), then drives the execution and returns a
//! uniform result record.
//!
//! # Architecture
//!
//! ```text
//! SkillOrchestrator
//!   ├── SkillRegistry (discovery of SKILL.md bundles, cached snapshot)
//!   ├── DecisionEngine (necessity check + selection over LLM JSON)
//!   │     └── scorer (deterministic relevance fallback, no network)
//!   ├── plan (pure execution-plan builder: single | chain)
//!   └── ChainExecutor (sequential / parallel + synthesis)
//!         └── AgentRuntime (one isolated invocation per step)
//! ```
//!
//! Every failure path inside one orchestration call is converted into a
//! terminal [`ExecutionResult`]; the orchestrator never panics or propagates
//! an error past its own boundary.

pub mod config;
pub mod context;
pub mod decision;
pub mod error;
pub mod executor;
pub mod llm;
pub mod orchestrator;
pub mod plan;
pub mod prompts;
pub mod registry;
pub mod runtime;
pub mod scorer;
pub mod skill;

pub use config::OrchestratorConfig;
pub use context::{ContextEntry, TaskContext};
pub use decision::{Decision, DecisionEngine, ExecutionMode, OrchestrationDecision};
pub use error::OrchestrationError;
pub use executor::{AgentOutput, ChainExecutor, ExecutionResult, ExecutionStatus};
pub use llm::{CompletionClient, OpenAiClient};
pub use orchestrator::SkillOrchestrator;
pub use plan::{build_plan, ExecutionPlan, PlanKind, PlanStep};
pub use registry::{DirectorySkillRegistry, InMemoryRegistry, SkillRegistry};
pub use runtime::{AgentRuntime, LlmAgentRuntime};
pub use skill::Skill;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
