use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk configuration (`config.toml`). Every key is optional; unset keys
/// fall back to built-in defaults, and environment variables override both.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Default model for requests (e.g., "gpt-5-mini-2025-08-07")
    pub model: Option<String>,
    /// Provider base URL without the `/v1/responses` suffix
    pub base_url: Option<String>,
    pub max_output_tokens: Option<u32>,
    /// Sampling temperature; ignored by models that reject it
    pub temperature: Option<f32>,
    /// Reasoning effort: low, medium, or high
    pub reasoning_effort: Option<String>,
    /// Reasoning summary verbosity: auto, concise, or detailed
    pub reasoning_summary: Option<String>,
    /// Let the model call the web search tool
    pub web_search: Option<bool>,
    /// Explicit outbound proxy; overrides environment-derived proxies
    pub proxy_url: Option<String>,
    /// System instructions; replaces the built-in prompt
    pub system_prompt: Option<String>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
