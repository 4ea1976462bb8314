// file: src/extractor/service.rs
// description: completion service boundary: trait plus OpenAI-style HTTP client
// reference: https://platform.openai.com/docs/api-reference/chat

use crate::config::ServiceConfig;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// One structured-extraction call: a system prompt carrying the schema and a
/// user message carrying the chunk text (or a corrective follow-up).
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
}

/// The single capability the pipeline needs from the model service. Tests
/// inject deterministic stubs; production uses [`HttpCompletionService`].
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

pub struct HttpCompletionService {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl HttpCompletionService {
    pub fn new(config: &ServiceConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| PipelineError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn classify_status(status: u16, retry_after_ms: Option<u64>, detail: String) -> PipelineError {
        match status {
            429 => PipelineError::RateLimited { retry_after_ms },
            401 | 403 => PipelineError::Config(format!(
                "service rejected credentials (status {}): {}",
                status, detail
            )),
            408 => PipelineError::TransientService(detail),
            s if s >= 500 => PipelineError::TransientService(format!("status {}: {}", s, detail)),
            s => PipelineError::Service { status: s, detail },
        }
    }
}

#[async_trait]
impl CompletionService for HttpCompletionService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint);

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        debug!(
            "Requesting extraction from {} ({} chars of prompt)",
            url,
            request.system.len() + request.user.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::TransientService(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000);
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Self::classify_status(status.as_u16(), retry_after_ms, detail));
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::InvalidResponse(format!("response not JSON: {}", e)))?;

        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(PipelineError::InvalidResponse(
                "service returned no completion content".to_string(),
            ));
        }

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_status_maps_to_rate_limited() {
        let err = HttpCompletionService::classify_status(429, Some(2000), "slow down".into());
        assert_eq!(err.kind(), "RateLimited");
        assert!(err.is_transient());
    }

    #[test]
    fn test_server_errors_are_transient() {
        let err = HttpCompletionService::classify_status(503, None, "unavailable".into());
        assert_eq!(err.kind(), "TransientServiceError");
    }

    #[test]
    fn test_bad_credentials_are_fatal_config() {
        let err = HttpCompletionService::classify_status(401, None, "bad key".into());
        assert_eq!(err.kind(), "ConfigurationError");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_other_client_errors_do_not_retry() {
        let err = HttpCompletionService::classify_status(400, None, "bad request".into());
        assert_eq!(err.kind(), "ServiceError");
        assert!(!err.is_transient());
        assert!(!err.is_content_shape());
    }
}
