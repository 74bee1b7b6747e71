//! Environment overrides layered on top of the config file.

use tracing::{debug, warn};

use crate::core::config::data::Config;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const MODEL_VAR: &str = "LLM_MODEL";
pub const MAX_TOKENS_VAR: &str = "LLM_MAX_TOKENS";
pub const TEMPERATURE_VAR: &str = "LLM_TEMPERATURE";
pub const PROXY_URL_VAR: &str = "PROXY_URL";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct EnvOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub proxy_url: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`. Empty values count as unset and
    /// numbers that fail to parse are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            api_key: get(API_KEY_VAR),
            base_url: get(BASE_URL_VAR),
            model: get(MODEL_VAR),
            max_output_tokens: get(MAX_TOKENS_VAR).and_then(|value| value.parse().ok()),
            temperature: get(TEMPERATURE_VAR).and_then(|value| value.parse().ok()),
            proxy_url: get(PROXY_URL_VAR),
        }
    }
}

impl Config {
    pub fn apply_env(&mut self, overrides: &EnvOverrides) {
        if let Some(base_url) = &overrides.base_url {
            self.base_url = Some(base_url.clone());
        }
        if let Some(model) = &overrides.model {
            self.model = Some(model.clone());
        }
        if let Some(max_output_tokens) = overrides.max_output_tokens {
            self.max_output_tokens = Some(max_output_tokens);
        }
        if let Some(temperature) = overrides.temperature {
            self.temperature = Some(temperature);
        }
        if let Some(proxy_url) = &overrides.proxy_url {
            self.proxy_url = Some(proxy_url.clone());
        }
    }
}

/// Loads `.env` from the working directory when present. Existing
/// environment variables win over file entries.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!(error = %err, "Failed to load .env"),
    }
}
