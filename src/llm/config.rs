//! Analysis client configuration.

use serde::{Deserialize, Serialize};

use super::prompts::{DEFAULT_DESCRIBE_PROMPT, DEFAULT_REFINE_PROMPT, DEFAULT_SUMMARIZE_PROMPT};

/// Configuration for the analysis client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Whether analysis calls are enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Ollama-style API endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model used for summarization and refinement
    #[serde(default = "default_model")]
    pub model: String,
    /// Model used for image description (falls back to `model` when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_model: Option<String>,
    /// Maximum tokens in a response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum characters of content sent per call
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    /// Custom summarize prompt ({content}, {length}, {focus}, {format})
    #[serde(default)]
    pub summarize_prompt: Option<String>,
    /// Custom describe prompt (image rides the request's image channel)
    #[serde(default)]
    pub describe_prompt: Option<String>,
    /// Custom refine prompt ({content}, {summary}, {feedback}, {instructions})
    #[serde(default)]
    pub refine_prompt: Option<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "dolphin-llama3:8b".to_string()
}

fn default_max_tokens() -> u32 {
    768
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_content_chars() -> usize {
    12000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            model: default_model(),
            vision_model: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_content_chars: default_max_content_chars(),
            summarize_prompt: None,
            describe_prompt: None,
            refine_prompt: None,
        }
    }
}

impl LlmConfig {
    /// Apply environment variable overrides.
    ///
    /// Supported env vars: `MEDIASAGE_LLM_ENABLED`, `MEDIASAGE_LLM_ENDPOINT`,
    /// `MEDIASAGE_LLM_MODEL`, `MEDIASAGE_LLM_VISION_MODEL`,
    /// `MEDIASAGE_LLM_MAX_TOKENS`, `MEDIASAGE_LLM_TEMPERATURE`,
    /// `MEDIASAGE_LLM_MAX_CONTENT_CHARS`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("MEDIASAGE_LLM_ENABLED") {
            self.enabled = val.eq_ignore_ascii_case("true") || val == "1";
        }
        if let Ok(val) = std::env::var("MEDIASAGE_LLM_ENDPOINT") {
            self.endpoint = val;
        }
        if let Ok(val) = std::env::var("MEDIASAGE_LLM_MODEL") {
            self.model = val;
        }
        if let Ok(val) = std::env::var("MEDIASAGE_LLM_VISION_MODEL") {
            self.vision_model = Some(val);
        }
        if let Ok(val) = std::env::var("MEDIASAGE_LLM_MAX_TOKENS") {
            if let Ok(n) = val.parse() {
                self.max_tokens = n;
            }
        }
        if let Ok(val) = std::env::var("MEDIASAGE_LLM_TEMPERATURE") {
            if let Ok(t) = val.parse() {
                self.temperature = t;
            }
        }
        if let Ok(val) = std::env::var("MEDIASAGE_LLM_MAX_CONTENT_CHARS") {
            if let Ok(n) = val.parse() {
                self.max_content_chars = n;
            }
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Model used for image description.
    pub fn vision_model(&self) -> &str {
        self.vision_model.as_deref().unwrap_or(&self.model)
    }

    /// Get the summarize prompt, custom or default.
    pub fn get_summarize_prompt(&self) -> &str {
        self.summarize_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SUMMARIZE_PROMPT)
    }

    /// Get the describe prompt, custom or default.
    pub fn get_describe_prompt(&self) -> &str {
        self.describe_prompt
            .as_deref()
            .unwrap_or(DEFAULT_DESCRIBE_PROMPT)
    }

    /// Get the refine prompt, custom or default.
    pub fn get_refine_prompt(&self) -> &str {
        self.refine_prompt.as_deref().unwrap_or(DEFAULT_REFINE_PROMPT)
    }
}
