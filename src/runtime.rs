//! Agent runtime interface.
//!
//! The executor drives skills through the [`AgentRuntime`] trait: one
//! invocation per step, repeatable and independent, with no shared mutable
//! state between invocations. That independence is what makes parallel-mode
//! isolation safe. The skill (including its filesystem root) travels by reference
//! into each call; nothing is stashed in ambient process state.
//!
//! [`LlmAgentRuntime`] is the built-in implementation: it renders the
//! skill persona, resource inventory, instructions, and accumulated
//! context into a single completion request.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::TaskContext;
use crate::error::OrchestrationError;
use crate::llm::CompletionClient;
use crate::prompts;
use crate::skill::Skill;

/// Executes one skill against an instruction/context pair.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Run a skill once. Must be invocable repeatedly and concurrently
    /// with no implicit shared state between invocations.
    async fn run(
        &self,
        skill: &Skill,
        instructions: &str,
        context: &TaskContext,
    ) -> Result<String, OrchestrationError>;
}

/// LLM-backed agent runtime.
pub struct LlmAgentRuntime {
    client: Arc<dyn CompletionClient>,
}

impl LlmAgentRuntime {
    /// Create a runtime over a completion client.
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AgentRuntime for LlmAgentRuntime {
    async fn run(
        &self,
        skill: &Skill,
        instructions: &str,
        context: &TaskContext,
    ) -> Result<String, OrchestrationError> {
        log::debug!(
            "Running skill '{}' with {} prior output(s) in context",
            skill.name,
            context.len(),
        );

        let prompt = prompts::agent_prompt(skill, instructions, context);
        let output = self
            .client
            .complete(&prompt)
            .await
            .map_err(|e| OrchestrationError::Runtime(format!("skill '{}': {e}", skill.name)))?;

        log::info!(
            "Skill '{}' produced {} chars of output",
            skill.name,
            output.len(),
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Client that records the prompts it receives.
    struct RecordingClient {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionClient for RecordingClient {
        async fn complete(&self, prompt: &str) -> Result<String, OrchestrationError> {
            self.prompts.lock().push(prompt.to_string());
            Ok("agent output".to_string())
        }
    }

    #[tokio::test]
    async fn test_runtime_renders_persona_and_context() {
        let client = Arc::new(RecordingClient {
            prompts: Mutex::new(Vec::new()),
        });
        let runtime = LlmAgentRuntime::new(client.clone());

        let skill = Skill::new("market-analysis", "Analyzes markets").with_persona(
            "Market Analyst",
            "Understand the market",
            "Veteran analyst",
        );
        let mut context = TaskContext::new();
        context.push("gatherer", "collected data");

        let output = runtime
            .run(&skill, "analyze the collected data", &context)
            .await
            .unwrap();
        assert_eq!(output, "agent output");

        let prompts = client.prompts.lock();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Market Analyst"));
        assert!(prompts[0].contains("collected data"));
        assert!(prompts[0].contains("analyze the collected data"));
    }

    #[tokio::test]
    async fn test_runtime_failure_names_the_skill() {
        struct FailingClient;

        #[async_trait]
        impl CompletionClient for FailingClient {
            async fn complete(&self, _prompt: &str) -> Result<String, OrchestrationError> {
                Err(OrchestrationError::Llm("boom".to_string()))
            }
        }

        let runtime = LlmAgentRuntime::new(Arc::new(FailingClient));
        let skill = Skill::new("fragile", "Fails");
        let err = runtime
            .run(&skill, "do something", &TaskContext::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("fragile"));
    }
}
