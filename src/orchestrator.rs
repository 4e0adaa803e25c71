//! Top-level skill orchestrator.
//!
//! Ties the pieces together for one task: read the registry snapshot, run
//! the decision engine, build the execution plan, log the flow, and drive
//! the chain executor, or answer directly when the task needs no skill at
//! all. Every failure on any path is converted into a terminal
//! [`ExecutionResult`]; nothing propagates past this boundary.

use std::sync::Arc;

use crate::config::OrchestratorConfig;
use crate::decision::{Decision, DecisionEngine, ExecutionMode};
use crate::executor::{AgentOutput, ChainExecutor, ExecutionResult};
use crate::llm::{CompletionClient, OpenAiClient};
use crate::plan::{build_plan, render_flow_diagram, PlanKind};
use crate::prompts;
use crate::registry::SkillRegistry;
use crate::runtime::{AgentRuntime, LlmAgentRuntime};
use crate::skill::Skill;

/// Label attached to the single output of a direct (skill-less) answer.
pub const DIRECT_RESPONSE_NAME: &str = "direct-response";

/// Orchestrates skill selection and execution for one task at a time.
///
/// Holds no per-task state: each [`SkillOrchestrator::orchestrate`] call
/// works against the registry snapshot taken at its start and leaves
/// nothing behind.
pub struct SkillOrchestrator {
    client: Option<Arc<dyn CompletionClient>>,
    engine: DecisionEngine,
    executor: ChainExecutor,
}

impl SkillOrchestrator {
    /// Build an orchestrator from a configuration.
    ///
    /// With an API key the decision engine and the agent runtime both run
    /// against the completion API; without one the engine degrades to
    /// deterministic relevance scoring and agent execution is unavailable.
    pub fn new(config: &OrchestratorConfig) -> Result<Self, crate::error::OrchestrationError> {
        let client: Option<Arc<dyn CompletionClient>> = if config.api_key.is_some() {
            Some(Arc::new(OpenAiClient::new(config)?))
        } else {
            log::warn!("No API key configured; decisions fall back to relevance scoring");
            None
        };

        let runtime: Arc<dyn AgentRuntime> = match client.as_ref() {
            Some(c) => Arc::new(LlmAgentRuntime::new(Arc::clone(c))),
            None => Arc::new(UnavailableRuntime),
        };

        Ok(Self::with_parts(config, client, runtime))
    }

    /// Build an orchestrator from explicit parts. The injection seam used
    /// by tests and by embedders with their own runtime.
    pub fn with_parts(
        config: &OrchestratorConfig,
        client: Option<Arc<dyn CompletionClient>>,
        runtime: Arc<dyn AgentRuntime>,
    ) -> Self {
        let engine = match client.as_ref() {
            Some(c) => DecisionEngine::new(Arc::clone(c)),
            None => DecisionEngine::offline(),
        };

        Self {
            client,
            engine,
            executor: ChainExecutor::new(runtime, config),
        }
    }

    /// Route and execute one task. Always returns a terminal result.
    pub async fn orchestrate(&self, task: &str, registry: &dyn SkillRegistry) -> ExecutionResult {
        log::info!("Orchestrating task: {}", task);

        let skills = match registry.list_skills() {
            Ok(skills) => skills,
            Err(e) => {
                log::error!("Registry listing failed: {}", e);
                return ExecutionResult::failed(e.to_string());
            }
        };
        log::info!("Registry snapshot holds {} skill(s)", skills.len());

        match self.engine.decide(task, &skills).await {
            Decision::NoSkillsNeeded { reasoning } => {
                log::info!("Answering directly without skills ({})", reasoning);
                self.answer_directly(task).await
            }
            Decision::UseSkills(decision) => {
                let selection: Vec<Skill> = decision
                    .selected
                    .iter()
                    .map(|&i| skills[i].clone())
                    .collect();
                let names: Vec<&str> = selection.iter().map(|s| s.name.as_str()).collect();
                log::info!(
                    "Selected skill(s): {} (mode: {})",
                    names.join(", "),
                    decision.mode,
                );
                if !decision.reasoning.is_empty() {
                    log::debug!("Selection reasoning: {}", decision.reasoning);
                }
                if !decision.dependencies.is_empty() {
                    log::debug!("Dependencies: {:?}", decision.dependencies);
                }

                let plan = build_plan(&selection);
                if plan.kind == PlanKind::Chain {
                    for line in render_flow_diagram(&plan, decision.mode).lines() {
                        log::info!("{}", line);
                    }
                }

                self.executor
                    .execute(task, &plan, &selection, decision.mode)
                    .await
            }
        }
    }

    /// Answer a task directly from the model, without any skill.
    async fn answer_directly(&self, task: &str) -> ExecutionResult {
        let Some(client) = self.client.as_ref() else {
            return ExecutionResult::failed(
                "task needs no skills but no completion client is configured for a direct answer",
            );
        };

        match client.complete(&prompts::direct_answer_prompt(task)).await {
            Ok(answer) => ExecutionResult::completed(
                Some(answer.clone()),
                vec![AgentOutput {
                    skill_name: DIRECT_RESPONSE_NAME.to_string(),
                    output: answer,
                    step: 1,
                }],
            ),
            Err(e) => {
                log::error!("Direct answer failed: {}", e);
                ExecutionResult::failed(e.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Offline runtime stub
// ---------------------------------------------------------------------------

/// Placeholder runtime used when no completion client is configured.
/// Selection still works offline; execution does not.
struct UnavailableRuntime;

#[async_trait::async_trait]
impl AgentRuntime for UnavailableRuntime {
    async fn run(
        &self,
        skill: &Skill,
        _instructions: &str,
        _context: &crate::context::TaskContext,
    ) -> Result<String, crate::error::OrchestrationError> {
        Err(crate::error::OrchestrationError::Runtime(format!(
            "cannot execute skill '{}': no completion client configured",
            skill.name,
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TaskContext;
    use crate::error::OrchestrationError;
    use crate::executor::ExecutionStatus;
    use crate::registry::InMemoryRegistry;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    struct ScriptedClient {
        responses: Mutex<VecDeque<String>>,
    }

    impl ScriptedClient {
        fn new(responses: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, _prompt: &str) -> Result<String, OrchestrationError> {
            self.responses
                .lock()
                .pop_front()
                .ok_or_else(|| OrchestrationError::Llm("script exhausted".to_string()))
        }
    }

    struct CountingRuntime {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl AgentRuntime for CountingRuntime {
        async fn run(
            &self,
            skill: &Skill,
            _instructions: &str,
            _context: &TaskContext,
        ) -> Result<String, OrchestrationError> {
            *self.calls.lock() += 1;
            Ok(format!("{} output", skill.name))
        }
    }

    fn registry() -> InMemoryRegistry {
        InMemoryRegistry::new(vec![
            Skill::new("market-analysis", "Analyzes market trends and indicators"),
            Skill::new("problem-solving", "Applies frameworks to solve problems"),
        ])
    }

    #[tokio::test]
    async fn test_direct_answer_scenario() {
        // Necessity says no skills; the next completion is the direct answer.
        let client = ScriptedClient::new(&[
            r#"{"needs_skills": false, "reasoning": "general knowledge"}"#,
            "Paris is the capital of France.",
        ]);
        let runtime = Arc::new(CountingRuntime {
            calls: Mutex::new(0),
        });
        let orchestrator = SkillOrchestrator::with_parts(
            &OrchestratorConfig::default(),
            Some(client),
            runtime.clone(),
        );

        let result = orchestrator
            .orchestrate("What is the capital of France?", &registry())
            .await;

        assert_eq!(result.status, ExecutionStatus::Completed);
        assert_eq!(result.agent_outputs.len(), 1);
        assert_eq!(result.agent_outputs[0].skill_name, DIRECT_RESPONSE_NAME);
        assert_eq!(result.result.as_deref(), Some("Paris is the capital of France."));
        // No skill invocation happened.
        assert_eq!(*runtime.calls.lock(), 0);
    }

    #[tokio::test]
    async fn test_single_skill_selection_executes_once() {
        let client = ScriptedClient::new(&[
            r#"{"needs_skills": true, "reasoning": "needs market data"}"#,
            r#"{"selected_skill_indices": [0], "execution_mode": "sequential", "reasoning": "direct match"}"#,
        ]);
        let runtime = Arc::new(CountingRuntime {
            calls: Mutex::new(0),
        });
        let orchestrator = SkillOrchestrator::with_parts(
            &OrchestratorConfig::default(),
            Some(client),
            runtime.clone(),
        );

        let result = orchestrator
            .orchestrate("analyze today's market", &registry())
            .await;

        assert_eq!(result.status, ExecutionStatus::Completed);
        assert_eq!(result.agent_outputs.len(), 1);
        assert_eq!(result.agent_outputs[0].skill_name, "market-analysis");
        assert_eq!(*runtime.calls.lock(), 1);
    }

    #[tokio::test]
    async fn test_two_skill_parallel_chain() {
        let client = ScriptedClient::new(&[
            r#"{"needs_skills": true, "reasoning": ""}"#,
            r#"{"selected_skill_indices": [0, 1], "execution_mode": "parallel", "reasoning": "complementary"}"#,
        ]);
        let runtime = Arc::new(CountingRuntime {
            calls: Mutex::new(0),
        });
        let orchestrator = SkillOrchestrator::with_parts(
            &OrchestratorConfig::default(),
            Some(client),
            runtime.clone(),
        );

        let result = orchestrator
            .orchestrate("analyze the market and solve the pricing problem", &registry())
            .await;

        assert_eq!(result.status, ExecutionStatus::Completed);
        // Two independent steps plus the synthesis step.
        assert_eq!(result.agent_outputs.len(), 3);
        assert_eq!(*runtime.calls.lock(), 3);
    }

    #[tokio::test]
    async fn test_registry_failure_becomes_failed_result() {
        struct BrokenRegistry;
        impl SkillRegistry for BrokenRegistry {
            fn list_skills(&self) -> Result<Vec<Skill>, OrchestrationError> {
                Err(OrchestrationError::Io(std::io::Error::other("disk gone")))
            }
        }

        let runtime = Arc::new(CountingRuntime {
            calls: Mutex::new(0),
        });
        let orchestrator =
            SkillOrchestrator::with_parts(&OrchestratorConfig::default(), None, runtime);

        let result = orchestrator.orchestrate("anything", &BrokenRegistry).await;
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_offline_orchestrator_still_selects_and_executes() {
        let runtime = Arc::new(CountingRuntime {
            calls: Mutex::new(0),
        });
        let orchestrator = SkillOrchestrator::with_parts(
            &OrchestratorConfig::default(),
            None,
            runtime.clone(),
        );

        let result = orchestrator
            .orchestrate("analyze market trends and indicators", &registry())
            .await;

        // Offline decision selected the market skill deterministically and
        // the injected runtime executed it.
        assert_eq!(result.status, ExecutionStatus::Completed);
        assert_eq!(result.agent_outputs[0].skill_name, "market-analysis");
        assert_eq!(*runtime.calls.lock(), 1);
    }
}
