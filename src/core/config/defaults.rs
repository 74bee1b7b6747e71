use crate::core::config::data::Config;
use crate::core::constants::{
    DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL, DEFAULT_REASONING_EFFORT,
    DEFAULT_REASONING_SUMMARY, DEFAULT_SYSTEM_PROMPT,
};
use crate::core::transport::{TransportConfig, DEFAULT_BASE_URL};

/// Effective settings for a chat session after defaults are filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSettings {
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub reasoning_effort: String,
    pub reasoning_summary: String,
    pub web_search: bool,
    pub proxy_url: Option<String>,
    pub system_prompt: String,
}

impl ChatSettings {
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig::new(&self.base_url, &self.api_key).with_proxy(self.proxy_url.clone())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl Config {
    pub fn model_or_default(&self) -> &str {
        non_blank(&self.model).unwrap_or(DEFAULT_MODEL)
    }

    pub fn base_url_or_default(&self) -> &str {
        non_blank(&self.base_url).unwrap_or(DEFAULT_BASE_URL)
    }

    /// Fills unset keys with defaults. `api_key` only comes from the
    /// environment and may be empty; the client rejects that before any
    /// request is sent.
    pub fn resolve(&self, api_key: Option<String>) -> ChatSettings {
        ChatSettings {
            model: self.model_or_default().to_string(),
            base_url: self.base_url_or_default().to_string(),
            api_key: api_key.unwrap_or_default(),
            max_output_tokens: self
                .max_output_tokens
                .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
            temperature: self.temperature.unwrap_or(0.0),
            reasoning_effort: non_blank(&self.reasoning_effort)
                .unwrap_or(DEFAULT_REASONING_EFFORT)
                .to_string(),
            reasoning_summary: non_blank(&self.reasoning_summary)
                .unwrap_or(DEFAULT_REASONING_SUMMARY)
                .to_string(),
            web_search: self.web_search.unwrap_or(true),
            proxy_url: non_blank(&self.proxy_url).map(str::to_string),
            system_prompt: non_blank(&self.system_prompt)
                .unwrap_or(DEFAULT_SYSTEM_PROMPT)
                .to_string(),
        }
    }
}
