//! Chain executor.
//!
//! Drives an execution plan through the agent runtime and normalizes every
//! outcome into an [`ExecutionResult`]. Three running shapes:
//!
//! - **single**: one invocation with an empty context;
//! - **sequential**: steps strictly in order, each step's context holding
//!   every prior output; any failure aborts the whole chain (later steps
//!   assume a complete, contiguous context, so nothing partial is kept);
//! - **parallel**: independent steps with empty contexts and bounded
//!   concurrency, then one synthesis step over all collected outputs. A
//!   single step failure is captured in that step's output slot instead of
//!   aborting the batch; a synthesis failure downgrades the result to
//!   partial while preserving the independent outputs.
//!
//! Outputs are always attributed to the originating skill and planned step
//! number, never to completion order, which in parallel mode is not
//! deterministic.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::OrchestratorConfig;
use crate::context::TaskContext;
use crate::decision::ExecutionMode;
use crate::plan::{ExecutionPlan, PlanKind, PlanStep};
use crate::prompts;
use crate::runtime::AgentRuntime;
use crate::skill::Skill;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Terminal status of one orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Every step (and synthesis, when applicable) succeeded.
    Completed,
    /// Independent steps finished but synthesis failed; their outputs are
    /// preserved.
    Partial,
    /// The run failed; no usable final result.
    Failed,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStatus::Completed => write!(f, "completed"),
            ExecutionStatus::Partial => write!(f, "partial"),
            ExecutionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One step's attributed output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentOutput {
    /// Identifier of the skill that produced the output.
    pub skill_name: String,
    /// The output text (or a captured error string in parallel mode).
    pub output: String,
    /// 1-based planned step number.
    pub step: usize,
}

/// Terminal record of one orchestration run. Created once, never mutated
/// after return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Unique identifier of this run.
    pub id: Uuid,
    /// Terminal status.
    pub status: ExecutionStatus,
    /// Final result payload, when one exists.
    pub result: Option<String>,
    /// Per-step outputs in planned order.
    pub agent_outputs: Vec<AgentOutput>,
    /// Error description for failed or partial runs.
    pub error: Option<String>,
}

impl ExecutionResult {
    /// A completed run.
    pub fn completed(result: Option<String>, agent_outputs: Vec<AgentOutput>) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: ExecutionStatus::Completed,
            result,
            agent_outputs,
            error: None,
        }
    }

    /// A partial run: independent outputs preserved, synthesis missing.
    pub fn partial(agent_outputs: Vec<AgentOutput>, error: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: ExecutionStatus::Partial,
            result: None,
            agent_outputs,
            error: Some(error.into()),
        }
    }

    /// A failed run.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: ExecutionStatus::Failed,
            result: None,
            agent_outputs: Vec::new(),
            error: Some(error.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// ChainExecutor
// ---------------------------------------------------------------------------

/// Executes plans against an agent runtime.
pub struct ChainExecutor {
    runtime: Arc<dyn AgentRuntime>,
    max_parallel_workers: usize,
    synthesis_context_limit: usize,
}

impl ChainExecutor {
    /// Create an executor over a runtime, taking its limits from the
    /// configuration.
    pub fn new(runtime: Arc<dyn AgentRuntime>, config: &OrchestratorConfig) -> Self {
        Self {
            runtime,
            max_parallel_workers: config.max_parallel_workers.max(1),
            synthesis_context_limit: config.synthesis_context_limit,
        }
    }

    /// Execute a plan. `skills` must parallel `plan.flow` in order; `task`
    /// is the original task text, used by the synthesis step.
    pub async fn execute(
        &self,
        task: &str,
        plan: &ExecutionPlan,
        skills: &[Skill],
        mode: ExecutionMode,
    ) -> ExecutionResult {
        if plan.flow.len() != skills.len() || skills.is_empty() {
            return ExecutionResult::failed(format!(
                "plan has {} step(s) but selection has {} skill(s)",
                plan.flow.len(),
                skills.len(),
            ));
        }

        match (plan.kind, mode) {
            (PlanKind::Single, _) => self.run_single(&plan.flow[0], &skills[0]).await,
            (PlanKind::Chain, ExecutionMode::Sequential) => {
                self.run_sequential(&plan.flow, skills).await
            }
            (PlanKind::Chain, ExecutionMode::Parallel) => {
                self.run_parallel(task, &plan.flow, skills).await
            }
        }
    }

    /// One invocation with an empty context.
    async fn run_single(&self, step: &PlanStep, skill: &Skill) -> ExecutionResult {
        log::info!("Executing single skill '{}'", skill.name);

        let context = TaskContext::new();
        match self.runtime.run(skill, &step.instructions, &context).await {
            Ok(output) => ExecutionResult::completed(
                Some(output.clone()),
                vec![AgentOutput {
                    skill_name: skill.name.clone(),
                    output,
                    step: 1,
                }],
            ),
            Err(e) => {
                log::error!("Single skill '{}' failed: {}", skill.name, e);
                ExecutionResult::failed(e.to_string())
            }
        }
    }

    /// Strictly ordered chain with a monotonically growing context.
    async fn run_sequential(&self, flow: &[PlanStep], skills: &[Skill]) -> ExecutionResult {
        log::info!("Executing sequential chain of {} step(s)", flow.len());

        let mut context = TaskContext::new();
        let mut outputs: Vec<AgentOutput> = Vec::new();

        for (step, skill) in flow.iter().zip(skills) {
            log::debug!(
                "Sequential step {}/{}: '{}' ({} prior output(s))",
                step.position,
                flow.len(),
                skill.name,
                context.len(),
            );

            match self.runtime.run(skill, &step.instructions, &context).await {
                Ok(output) => {
                    context.push(&skill.name, output.clone());
                    outputs.push(AgentOutput {
                        skill_name: skill.name.clone(),
                        output,
                        step: step.position,
                    });
                }
                Err(e) => {
                    // Later steps assume a complete, contiguous context; a
                    // gap would produce semantically broken output, so the
                    // whole chain fails and nothing partial is kept.
                    log::error!(
                        "Sequential step {} ('{}') failed, aborting chain: {}",
                        step.position,
                        skill.name,
                        e,
                    );
                    return ExecutionResult::failed(format!(
                        "step {} ({}) failed: {e}",
                        step.position, skill.name,
                    ));
                }
            }
        }

        let result = outputs.last().map(|o| o.output.clone());
        ExecutionResult::completed(result, outputs)
    }

    /// Independent steps with bounded concurrency, then one synthesis
    /// step over every collected output.
    async fn run_parallel(
        &self,
        task: &str,
        flow: &[PlanStep],
        skills: &[Skill],
    ) -> ExecutionResult {
        let concurrency = self.max_parallel_workers.min(flow.len());
        log::info!(
            "Executing {} parallel step(s) with up to {} worker(s)",
            flow.len(),
            concurrency,
        );

        let step_futures = flow.iter().zip(skills).enumerate().map(|(index, (step, skill))| {
            let runtime = Arc::clone(&self.runtime);
            async move {
                let context = TaskContext::new();
                let output = match runtime.run(skill, &step.instructions, &context).await {
                    Ok(text) => text,
                    Err(e) => {
                        // One broken skill must not block its siblings; the
                        // failure is captured in this step's output slot.
                        log::warn!(
                            "Parallel step {} ('{}') failed: {}",
                            step.position,
                            skill.name,
                            e,
                        );
                        format!("Error: {e}")
                    }
                };
                (index, output)
            }
        });

        let mut collected: Vec<(usize, String)> = stream::iter(step_futures)
            .buffer_unordered(concurrency)
            .collect()
            .await;
        // Report in planned order regardless of completion order.
        collected.sort_by_key(|&(index, _)| index);

        let outputs: Vec<AgentOutput> = collected
            .into_iter()
            .map(|(index, output)| AgentOutput {
                skill_name: skills[index].name.clone(),
                output,
                step: flow[index].position,
            })
            .collect();

        self.synthesize(task, outputs).await
    }

    /// Run the synthesis step over the independent outputs.
    async fn synthesize(&self, task: &str, outputs: Vec<AgentOutput>) -> ExecutionResult {
        let mut context = TaskContext::new();
        for output in &outputs {
            context.push(
                &output.skill_name,
                truncate_chars(&output.output, self.synthesis_context_limit),
            );
        }

        let synthesis_skill = Skill::synthesis();
        let instructions = prompts::synthesis_instructions(task, outputs.len());

        log::info!("Synthesizing {} parallel output(s)", outputs.len());
        match self
            .runtime
            .run(&synthesis_skill, &instructions, &context)
            .await
        {
            Ok(result) => {
                let mut all_outputs = outputs;
                all_outputs.push(AgentOutput {
                    skill_name: synthesis_skill.name,
                    output: result.clone(),
                    step: all_outputs.len() + 1,
                });
                ExecutionResult::completed(Some(result), all_outputs)
            }
            Err(e) => {
                // The independent outputs remain useful on their own, so
                // this downgrades to partial instead of failing outright.
                log::error!("Synthesis step failed: {}", e);
                ExecutionResult::partial(outputs, format!("synthesis failed: {e}"))
            }
        }
    }
}

/// Bound a string to `limit` characters on a char boundary.
fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        text.chars().take(limit).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
