//! Completion client.
//!
//! The decision engine and the LLM-backed agent runtime reach the outside
//! world through one narrow edge: a single-prompt completion call. The
//! concrete client speaks the OpenAI-compatible Chat Completions API via
//! `reqwest`, with bounded retries and exponential backoff for transient
//! failures (429, 5xx) and immediate errors for client-side failures (4xx).

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::OrchestratorConfig;
use crate::error::OrchestrationError;

/// A blocking (awaited) request/response completion call.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one prompt and return the model's text response.
    async fn complete(&self, prompt: &str) -> Result<String, OrchestrationError>;
}

/// OpenAI-compatible Chat Completions client.
#[derive(Debug)]
pub struct OpenAiClient {
    model: String,
    temperature: f64,
    api_key: String,
    base_url: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Build a client from the orchestrator configuration.
    ///
    /// Fails when no API key is configured or the HTTP client cannot be
    /// constructed.
    pub fn new(config: &OrchestratorConfig) -> Result<Self, OrchestrationError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            OrchestrationError::Llm(
                "API key not set. Set OPENAI_API_KEY or pass api_key in the configuration."
                    .to_string(),
            )
        })?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs_f64(config.timeout_secs))
            .build()
            .map_err(|e| OrchestrationError::Llm(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            client,
        })
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                {"role": "user", "content": prompt}
            ],
        })
    }

    fn parse_response(response: &Value) -> Result<String, OrchestrationError> {
        response["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                OrchestrationError::Llm("response has no choices[0].message.content".to_string())
            })
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, OrchestrationError> {
        log::debug!(
            "Completion request: model={}, prompt={} chars",
            self.model,
            prompt.len(),
        );

        let endpoint = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(prompt);

        let mut last_error: Option<OrchestrationError> = None;
        let mut retry_delay = std::time::Duration::from_secs(1);

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                log::warn!("Completion retry attempt {} after {:?}", attempt, retry_delay);
                tokio::time::sleep(retry_delay).await;
                retry_delay *= 2;
            }

            let response = match self
                .client
                .post(&endpoint)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = Some(OrchestrationError::Llm(e.to_string()));
                    continue;
                }
            };

            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                last_error = Some(OrchestrationError::Llm("rate limited (429)".to_string()));
                continue;
            }
            if status.is_server_error() {
                last_error = Some(OrchestrationError::Llm(format!("server error: {status}")));
                continue;
            }

            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    last_error = Some(OrchestrationError::Llm(e.to_string()));
                    continue;
                }
            };

            if status.is_client_error() {
                return Err(OrchestrationError::Llm(format!(
                    "API error ({}): {}",
                    status,
                    &text[..text.len().min(500)]
                )));
            }

            let response_json: Value = serde_json::from_str(&text).map_err(|e| {
                OrchestrationError::Llm(format!(
                    "failed to parse response: {} - body: {}",
                    e,
                    &text[..text.len().min(500)]
                ))
            })?;

            return Self::parse_response(&response_json);
        }

        Err(last_error
            .unwrap_or_else(|| OrchestrationError::Llm("completion failed after all retries".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_api_key() {
        let config = OrchestratorConfig::default();
        assert!(OpenAiClient::new(&config).is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let config = OrchestratorConfig::default().with_api_key("sk-test");
        let client = OpenAiClient::new(&config).unwrap();
        let body = client.request_body("hello");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_parse_response_extracts_content() {
        let response = json!({
            "choices": [{"message": {"role": "assistant", "content": "hi there"}}]
        });
        assert_eq!(OpenAiClient::parse_response(&response).unwrap(), "hi there");

        let empty = json!({"choices": []});
        assert!(OpenAiClient::parse_response(&empty).is_err());
    }
}
