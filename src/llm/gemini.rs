//! Gemini `generateContent` client.
//!
//! Structured calls request `application/json` output constrained by a
//! response schema (types rewritten to Gemini's uppercase tags).

use super::tool_schema::gemini_schema;
use super::{parse_json_output, transport_error, LanguageModel};
use crate::config::ModelConfig;
use crate::error::LlmError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<RequestContent>,
    system_instruction: RequestContent,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Client for the Gemini REST API.
pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
    model_name: String,
    api_key: String,
    temperature: f32,
    timeout_seconds: u64,
}

impl GeminiClient {
    pub fn new(config: &ModelConfig, api_key: String) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.gemini_url.trim_end_matches('/').to_string(),
            model_name: config.name.clone(),
            api_key,
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
        })
    }

    async fn generate(
        &self,
        system: &str,
        input: &str,
        schema: Option<&Value>,
    ) -> Result<String, LlmError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model_name);

        let request = GeminiRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart {
                    text: input.to_string(),
                }],
            }],
            system_instruction: RequestContent {
                role: "system",
                parts: vec![RequestPart {
                    text: system.to_string(),
                }],
            },
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type: schema.map(|_| "application/json"),
                response_schema: schema.map(gemini_schema),
            },
        };

        debug!(
            "Calling Gemini model {} ({} input bytes, structured: {})",
            self.model_name,
            input.len(),
            schema.is_some()
        );

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, &self.base_url, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Request(format!("Failed to parse Gemini response: {}", e)))?;

        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(LlmError::Blocked(reason));
        }

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(text)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate_text(&self, system: &str, input: &str) -> Result<String, LlmError> {
        self.generate(system, input, None).await
    }

    async fn generate_json(
        &self,
        system: &str,
        input: &str,
        schema: &Value,
    ) -> Result<Value, LlmError> {
        let text = self.generate(system, input, Some(schema)).await?;
        parse_json_output(&text)
    }
}
