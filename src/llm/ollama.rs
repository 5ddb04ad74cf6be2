//! Ollama chat client.
//!
//! Uses the non-streaming `/api/chat` endpoint. Structured calls pass the
//! JSON schema through Ollama's `format` field and parse the reply content.

use super::{parse_json_output, transport_error, LanguageModel};
use crate::config::ModelConfig;
use crate::error::LlmError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Message in the chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a Value>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Client for a local or remote Ollama server.
pub struct OllamaClient {
    http_client: reqwest::Client,
    base_url: String,
    model_name: String,
    temperature: f32,
    timeout_seconds: u64,
}

impl OllamaClient {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            model_name: config.name.clone(),
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
        })
    }

    async fn chat(&self, system: &str, input: &str, format: Option<&Value>) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.base_url);

        let request = OllamaChatRequest {
            model: &self.model_name,
            messages: vec![ChatMessage::system(system), ChatMessage::user(input)],
            stream: false,
            format,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        };

        debug!(
            "Sending Ollama chat request (model {}, {} input bytes, structured: {})",
            self.model_name,
            input.len(),
            format.is_some()
        );

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, &self.base_url, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Request(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(chat_response.message.content)
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn generate_text(&self, system: &str, input: &str) -> Result<String, LlmError> {
        self.chat(system, input, None).await
    }

    async fn generate_json(
        &self,
        system: &str,
        input: &str,
        schema: &Value,
    ) -> Result<Value, LlmError> {
        let content = self.chat(system, input, Some(schema)).await?;
        parse_json_output(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn config_for(url: String) -> ModelConfig {
        ModelConfig {
            ollama_url: url,
            name: "test-model".to_string(),
            timeout_seconds: 5,
            ..ModelConfig::default()
        }
    }

    #[tokio::test]
    async fn test_generate_text() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_body(Matcher::PartialJson(json!({
                "model": "test-model",
                "stream": false
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": {"role": "assistant", "content": "hello"}, "done": true}"#)
            .create_async()
            .await;

        let client = OllamaClient::new(&config_for(server.url())).unwrap();
        let text = client.generate_text("sys", "hi").await.unwrap();

        assert_eq!(text, "hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_json_sends_schema_as_format() {
        let schema = json!({"type": "object"});
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_body(Matcher::PartialJson(json!({ "format": {"type": "object"} })))
            .with_status(200)
            .with_body(
                r#"{"message": {"role": "assistant", "content": "{\"search_queries\": [\"a\"]}"}, "done": true}"#,
            )
            .create_async()
            .await;

        let client = OllamaClient::new(&config_for(server.url())).unwrap();
        let value = client.generate_json("sys", "topic", &schema).await.unwrap();

        assert_eq!(value["search_queries"][0], "a");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/chat")
            .with_status(500)
            .with_body("model not found")
            .create_async()
            .await;

        let client = OllamaClient::new(&config_for(server.url())).unwrap();
        let err = client.generate_text("sys", "hi").await.unwrap_err();

        match err {
            LlmError::Api { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "model not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
