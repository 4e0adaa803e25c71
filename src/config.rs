//! Orchestrator configuration.
//!
//! All tunables for one orchestration run live in [`OrchestratorConfig`],
//! which is constructed once at process start (from the environment or
//! explicitly) and passed by reference into the decision engine, executor,
//! and runtime adapter. Nothing reads environment variables after startup,
//! so concurrently running steps can never observe a mid-flight change.

use serde::{Deserialize, Serialize};

/// Configuration for the skill orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Model identifier for decision and agent completions
    /// (e.g., "gpt-4o-mini").
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature. Kept low so orchestration decisions stay
    /// consistent across runs.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// API key for the completion endpoint. `None` switches the decision
    /// engine into its deterministic offline mode.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible completion API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
    /// Maximum retries for retryable completion failures (429, 5xx).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Upper bound on concurrently running parallel-mode steps.
    #[serde(default = "default_max_parallel_workers")]
    pub max_parallel_workers: usize,
    /// Maximum characters of each step output fed into the synthesis
    /// step's context.
    #[serde(default = "default_synthesis_context_limit")]
    pub synthesis_context_limit: usize,
}

fn default_model() -> String { "gpt-4o-mini".to_string() }
fn default_temperature() -> f64 { 0.3 }
fn default_base_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_timeout_secs() -> f64 { 120.0 }
fn default_max_retries() -> u32 { 2 }
fn default_max_parallel_workers() -> usize { 4 }
fn default_synthesis_context_limit() -> usize { 4000 }

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            api_key: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            max_parallel_workers: default_max_parallel_workers(),
            synthesis_context_limit: default_synthesis_context_limit(),
        }
    }
}

impl OrchestratorConfig {
    /// Build a configuration from the process environment.
    ///
    /// Recognized variables: `OPENAI_MODEL`, `OPENAI_TEMPERATURE`,
    /// `OPENAI_API_KEY`, `OPENAI_BASE_URL`. Unset or unparseable values
    /// fall back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            if !model.trim().is_empty() {
                config.model = model;
            }
        }
        if let Ok(temp) = std::env::var("OPENAI_TEMPERATURE") {
            match temp.parse::<f64>() {
                Ok(t) => config.temperature = t,
                Err(_) => log::warn!("Ignoring unparseable OPENAI_TEMPERATURE: {:?}", temp),
            }
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                config.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            if !url.trim().is_empty() {
                config.base_url = url.trim_end_matches('/').to_string();
            }
        }

        config
    }

    /// Builder: set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Builder: set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Builder: set the parallel worker cap.
    pub fn with_max_parallel_workers(mut self, cap: usize) -> Self {
        self.max_parallel_workers = cap.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.temperature, 0.3);
        assert!(config.api_key.is_none());
        assert_eq!(config.max_parallel_workers, 4);
        assert_eq!(config.synthesis_context_limit, 4000);
    }

    #[test]
    fn test_builder_methods() {
        let config = OrchestratorConfig::default()
            .with_model("gpt-4o")
            .with_api_key("sk-test")
            .with_max_parallel_workers(0);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        // Cap is clamped to at least one worker.
        assert_eq!(config.max_parallel_workers, 1);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: OrchestratorConfig = serde_json::from_str(r#"{"model": "gpt-4o"}"#).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.base_url, "https://api.openai.com/v1");
    }
}
