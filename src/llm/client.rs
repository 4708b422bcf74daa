//! Minimal HTTP client for hosted chat-completion APIs.
//!
//! One request shape across providers: a system prompt, a user prompt, a
//! token budget, and an optional temperature. The response is the single
//! text field extracted from each provider's nested response structure.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::types::{Error, Result};

/// One chat-completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

/// Narrow seam over the hosted model so the synthesis stages can be tested
/// with a deterministic stub.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: ChatRequest<'_>) -> Result<String>;
}

/// Hosted provider, selected from the model identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// AWS Bedrock converse endpoint (region-scoped model ids such as
    /// `apac.anthropic.claude-3-7-sonnet-20250219-v1:0`).
    Bedrock,
    /// Anthropic messages API (`claude-*` models).
    Anthropic,
    /// OpenAI chat completions API (`gpt-*` models).
    OpenAI,
}

/// Chat-completion client for Bedrock, Anthropic, and OpenAI.
pub struct LlmClient {
    api_key: String,
    model: String,
    region: String,
    provider: Provider,
    client: Client,
}

/// Bedrock converse API response.
#[derive(Debug, Deserialize)]
struct ConverseResponse {
    output: ConverseOutput,
}

#[derive(Debug, Deserialize)]
struct ConverseOutput {
    message: ConverseMessage,
}

#[derive(Debug, Deserialize)]
struct ConverseMessage {
    content: Vec<ConverseContent>,
}

#[derive(Debug, Deserialize)]
struct ConverseContent {
    text: String,
}

/// Anthropic API response.
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: String,
}

/// OpenAI API response.
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: String,
}

impl LlmClient {
    /// Select a provider from the model identifier. Bare `claude-*` and
    /// `gpt-*` names go to the vendor APIs; everything else (including
    /// region-prefixed ids like `apac.anthropic.*`) goes to Bedrock.
    fn detect(model: &str) -> Provider {
        if model.starts_with("claude") {
            Provider::Anthropic
        } else if model.starts_with("gpt") {
            Provider::OpenAI
        } else {
            Provider::Bedrock
        }
    }

    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `model` - model identifier, also used to pick the provider
    /// * `region` - region for the Bedrock endpoint; ignored by the
    ///   vendor APIs
    /// * `api_key` - bearer token or API key for the chosen provider
    pub fn new(model: String, region: String, api_key: String) -> Self {
        let provider = Self::detect(&model);
        Self {
            api_key,
            model,
            region,
            provider,
            client: Client::new(),
        }
    }

    /// Create a client with credentials from the environment.
    ///
    /// Reads `AWS_BEARER_TOKEN_BEDROCK`, `ANTHROPIC_API_KEY`, or
    /// `OPENAI_API_KEY` depending on the model identifier.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the required variable is not set.
    pub fn from_env(model: &str, region: &str) -> Result<Self> {
        let variable = match Self::detect(model) {
            Provider::Bedrock => "AWS_BEARER_TOKEN_BEDROCK",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
        };
        let api_key = std::env::var(variable).map_err(|_| {
            Error::ConfigError(format!("{} environment variable not set", variable))
        })?;
        Ok(Self::new(model.to_string(), region.to_string(), api_key))
    }

    /// Provider this client talks to.
    pub fn provider(&self) -> Provider {
        self.provider
    }

    async fn read_body(label: &str, response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::LlmError(format!("Failed to read response: {}", e)))?;
        if !status.is_success() {
            return Err(Error::LlmError(format!(
                "{} API error {}: {}",
                label, status, body
            )));
        }
        Ok(body)
    }

    /// Call the Bedrock converse endpoint.
    async fn call_bedrock(&self, request: &ChatRequest<'_>) -> Result<String> {
        let url = format!(
            "https://bedrock-runtime.{}.amazonaws.com/model/{}/converse",
            self.region, self.model
        );

        let mut inference_config = json!({ "maxTokens": request.max_tokens });
        if let Some(temperature) = request.temperature {
            inference_config["temperature"] = json!(temperature);
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&json!({
                "messages": [
                    {"role": "user", "content": [{"text": request.user}]}
                ],
                "system": [{"text": request.system}],
                "inferenceConfig": inference_config
            }))
            .send()
            .await
            .map_err(|e| Error::LlmError(format!("Bedrock API error: {}", e)))?;

        let body = Self::read_body("Bedrock", response).await?;
        let parsed: ConverseResponse = serde_json::from_str(&body)
            .map_err(|e| Error::LlmError(format!("Failed to parse Bedrock response: {}", e)))?;

        parsed
            .output
            .message
            .content
            .into_iter()
            .next()
            .map(|content| content.text)
            .ok_or_else(|| Error::LlmError("No content in Bedrock response".to_string()))
    }

    /// Call the Anthropic messages API.
    async fn call_anthropic(&self, request: &ChatRequest<'_>) -> Result<String> {
        let mut payload = json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "system": request.system,
            "messages": [
                {"role": "user", "content": request.user}
            ]
        });
        if let Some(temperature) = request.temperature {
            payload["temperature"] = json!(temperature);
        }

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::LlmError(format!("Anthropic API error: {}", e)))?;

        let body = Self::read_body("Anthropic", response).await?;
        let parsed: AnthropicResponse = serde_json::from_str(&body)
            .map_err(|e| Error::LlmError(format!("Failed to parse Anthropic response: {}", e)))?;

        parsed
            .content
            .into_iter()
            .next()
            .map(|content| content.text)
            .ok_or_else(|| Error::LlmError("No content in Anthropic response".to_string()))
    }

    /// Call the OpenAI chat completions API.
    async fn call_openai(&self, request: &ChatRequest<'_>) -> Result<String> {
        let mut payload = json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user}
            ]
        });
        if let Some(temperature) = request.temperature {
            payload["temperature"] = json!(temperature);
        }

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::LlmError(format!("OpenAI API error: {}", e)))?;

        let body = Self::read_body("OpenAI", response).await?;
        let parsed: OpenAIResponse = serde_json::from_str(&body)
            .map_err(|e| Error::LlmError(format!("Failed to parse OpenAI response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::LlmError("No choices in OpenAI response".to_string()))
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn complete(&self, request: ChatRequest<'_>) -> Result<String> {
        match self.provider {
            Provider::Bedrock => self.call_bedrock(&request).await,
            Provider::Anthropic => self.call_anthropic(&request).await,
            Provider::OpenAI => self.call_openai(&request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_detection_from_model_id() {
        assert_eq!(
            LlmClient::detect("apac.anthropic.claude-3-7-sonnet-20250219-v1:0"),
            Provider::Bedrock
        );
        assert_eq!(
            LlmClient::detect("anthropic.claude-3-5-sonnet-20241022-v2:0"),
            Provider::Bedrock
        );
        assert_eq!(
            LlmClient::detect("claude-3-7-sonnet-20250219"),
            Provider::Anthropic
        );
        assert_eq!(LlmClient::detect("gpt-4o"), Provider::OpenAI);
    }

    #[test]
    fn bedrock_response_text_extraction() {
        let body = r#"{
            "output": {"message": {"role": "assistant", "content": [{"text": "SELECT 1;"}]}},
            "stopReason": "end_turn",
            "usage": {"inputTokens": 10, "outputTokens": 4}
        }"#;
        let parsed: ConverseResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.output.message.content[0].text, "SELECT 1;");
    }

    #[test]
    fn anthropic_response_text_extraction() {
        let body = r#"{"content": [{"type": "text", "text": "SELECT 2;"}], "model": "claude"}"#;
        let parsed: AnthropicResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.content[0].text, "SELECT 2;");
    }

    #[test]
    fn openai_response_text_extraction() {
        let body = r#"{"choices": [{"index": 0, "message": {"role": "assistant", "content": "SELECT 3;"}}]}"#;
        let parsed: OpenAIResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "SELECT 3;");
    }
}
