//! Analysis client for summarization, image description, and refinement.
//!
//! Talks to an Ollama-compatible API. Calls are treated as opaque,
//! potentially slow, potentially failing remote requests; there is no
//! retry — a failed call fails the single user action that issued it.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::LlmConfig;
use crate::models::SummarizeConfig;

/// Analysis client.
pub struct AnalysisClient {
    config: LlmConfig,
    client: Client,
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    #[allow(dead_code)]
    done: bool,
}

impl AnalysisClient {
    /// Create a new analysis client with the given configuration.
    pub fn new(config: LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300)) // 5 min timeout for slow models
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Get the config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Check if the analysis service is reachable.
    pub async fn is_available(&self) -> bool {
        if !self.config.enabled {
            return false;
        }
        let url = format!("{}/api/tags", self.config.endpoint);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Summarize a text with the given parameters.
    pub async fn summarize(
        &self,
        text: &str,
        summarize: &SummarizeConfig,
    ) -> Result<String, AnalysisError> {
        let prompt = self
            .config
            .get_summarize_prompt()
            .replace("{content}", self.truncate_content(text))
            .replace("{length}", summarize.length.as_str())
            .replace("{focus}", summarize.focus.as_str())
            .replace("{format}", summarize.format.as_str());

        debug!("Requesting summary ({} chars)", text.len());
        let response = self.call_api(&self.config.model, &prompt, None).await?;

        let summary = response.trim().to_string();
        if summary.is_empty() {
            return Err(AnalysisError::Parse("Empty summary response".to_string()));
        }
        Ok(summary)
    }

    /// Describe an image given its base64 data URI.
    pub async fn describe_image(&self, image_data_uri: &str) -> Result<String, AnalysisError> {
        let (_, payload) = split_data_uri(image_data_uri).ok_or_else(|| {
            AnalysisError::Parse("Image is not a base64 data URI".to_string())
        })?;

        debug!("Requesting image description");
        let prompt = self.config.get_describe_prompt().to_string();
        let response = self
            .call_api(
                self.config.vision_model(),
                &prompt,
                Some(vec![payload.to_string()]),
            )
            .await?;

        let description = response.trim().to_string();
        if description.is_empty() {
            return Err(AnalysisError::Parse(
                "Empty description response".to_string(),
            ));
        }
        Ok(description)
    }

    /// Rewrite a summary or description from user feedback.
    pub async fn refine(
        &self,
        original_text: &str,
        initial_summary: &str,
        user_feedback: &str,
        refinement_instructions: &str,
    ) -> Result<String, AnalysisError> {
        let prompt = self
            .config
            .get_refine_prompt()
            .replace("{content}", self.truncate_content(original_text))
            .replace("{summary}", initial_summary)
            .replace("{feedback}", user_feedback)
            .replace("{instructions}", refinement_instructions);

        debug!("Requesting refinement");
        let response = self.call_api(&self.config.model, &prompt, None).await?;

        let refined = response.trim().to_string();
        if refined.is_empty() {
            return Err(AnalysisError::Parse(
                "Empty refinement response".to_string(),
            ));
        }
        Ok(refined)
    }

    /// Truncate content to configured maximum (UTF-8 safe).
    fn truncate_content<'a>(&self, text: &'a str) -> &'a str {
        if text.len() <= self.config.max_content_chars {
            return text;
        }
        // Find a valid UTF-8 boundary at or before max_content_chars
        let mut end = self.config.max_content_chars;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    }

    /// Call the API with a prompt and optional image payloads.
    async fn call_api(
        &self,
        model: &str,
        prompt: &str,
        images: Option<Vec<String>>,
    ) -> Result<String, AnalysisError> {
        if !self.config.enabled {
            return Err(AnalysisError::Disabled);
        }

        let request = OllamaRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            stream: false,
            images,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.config.endpoint);
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AnalysisError::Api(format!("HTTP {}: {}", status, body)));
        }

        let api_resp: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| AnalysisError::Parse(e.to_string()))?;

        Ok(api_resp.response)
    }
}

/// Split a `data:<mime>;base64,<payload>` URI into its MIME type and payload.
pub(crate) fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    uri.strip_prefix("data:")?.split_once(";base64,")
}

/// Errors that can occur during analysis calls.
#[derive(Debug)]
pub enum AnalysisError {
    /// Failed to connect to the analysis service
    Connection(String),
    /// API returned an error
    Api(String),
    /// Failed to parse a request or response
    Parse(String),
    /// Analysis calls are disabled
    Disabled,
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::Connection(msg) => write!(f, "Connection error: {}", msg),
            AnalysisError::Api(msg) => write!(f, "API error: {}", msg),
            AnalysisError::Parse(msg) => write!(f, "Parse error: {}", msg),
            AnalysisError::Disabled => write!(f, "Analysis calls are disabled"),
        }
    }
}

impl std::error::Error for AnalysisError {}
