//! Setting and unsetting individual config keys by name.

use std::fmt;

use crate::core::config::data::Config;

pub const CONFIG_KEYS: &[&str] = &[
    "model",
    "base-url",
    "max-output-tokens",
    "temperature",
    "reasoning-effort",
    "reasoning-summary",
    "web-search",
    "proxy-url",
    "system-prompt",
];

/// Errors that can occur when modifying configuration settings.
#[derive(Debug, PartialEq)]
pub enum SettingError {
    /// The provided setting key is not recognized.
    UnknownKey(String),
    /// The provided value could not be parsed as a boolean.
    InvalidBoolean(String),
    /// The provided value could not be parsed as a number.
    InvalidNumber { key: &'static str, input: String },
    /// The value is outside the accepted set.
    InvalidChoice {
        key: &'static str,
        input: String,
        allowed: &'static [&'static str],
    },
    /// An error occurred while persisting the configuration.
    ConfigError(String),
}

impl SettingError {
    /// Print the error message to stderr with appropriate formatting.
    pub fn print(&self) {
        match self {
            SettingError::UnknownKey(key) => {
                eprintln!("❌ Unknown config key: {key}");
                eprintln!("   Known keys: {}", CONFIG_KEYS.join(", "));
            }
            SettingError::InvalidBoolean(input) => {
                eprintln!("❌ Invalid boolean value: {input}");
                eprintln!("   Use 'on' or 'off' (also accepts true/false, yes/no)");
            }
            SettingError::InvalidChoice { allowed, .. } => {
                eprintln!("❌ {self}");
                eprintln!("   Expected one of: {}", allowed.join(", "));
            }
            other => eprintln!("❌ {other}"),
        }
    }
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => write!(f, "Unknown config key: {key}"),
            SettingError::InvalidBoolean(input) => write!(f, "Invalid boolean value: {input}"),
            SettingError::InvalidNumber { key, input } => {
                write!(f, "Invalid number for {key}: {input}")
            }
            SettingError::InvalidChoice { key, input, .. } => {
                write!(f, "Invalid value for {key}: {input}")
            }
            SettingError::ConfigError(msg) => write!(f, "Failed to save configuration: {msg}"),
        }
    }
}

impl std::error::Error for SettingError {}

const REASONING_EFFORTS: &[&str] = &["minimal", "low", "medium", "high"];
const REASONING_SUMMARIES: &[&str] = &["auto", "concise", "detailed"];

/// Accepts: on/off, true/false, yes/no, 1/0 (case-insensitive).
pub fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

pub fn format_bool(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn canonical_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, SettingError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingError::InvalidNumber {
            key,
            input: value.to_string(),
        })
}

fn parse_choice(
    key: &'static str,
    value: &str,
    allowed: &'static [&'static str],
) -> Result<String, SettingError> {
    let normalized = value.trim().to_lowercase();
    if allowed.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(SettingError::InvalidChoice {
            key,
            input: value.to_string(),
            allowed,
        })
    }
}

impl Config {
    /// Sets `key` from its textual form. Keys accept either dashes or
    /// underscores.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), SettingError> {
        match canonical_key(key).as_str() {
            "model" => self.model = Some(value.trim().to_string()),
            "base-url" => self.base_url = Some(value.trim().to_string()),
            "max-output-tokens" => {
                self.max_output_tokens = Some(parse_number("max-output-tokens", value)?)
            }
            "temperature" => self.temperature = Some(parse_number("temperature", value)?),
            "reasoning-effort" => {
                self.reasoning_effort =
                    Some(parse_choice("reasoning-effort", value, REASONING_EFFORTS)?)
            }
            "reasoning-summary" => {
                self.reasoning_summary =
                    Some(parse_choice("reasoning-summary", value, REASONING_SUMMARIES)?)
            }
            "web-search" => {
                let enabled = parse_bool(value)
                    .ok_or_else(|| SettingError::InvalidBoolean(value.to_string()))?;
                self.web_search = Some(enabled);
            }
            "proxy-url" => self.proxy_url = Some(value.trim().to_string()),
            "system-prompt" => self.system_prompt = Some(value.to_string()),
            _ => return Err(SettingError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), SettingError> {
        match canonical_key(key).as_str() {
            "model" => self.model = None,
            "base-url" => self.base_url = None,
            "max-output-tokens" => self.max_output_tokens = None,
            "temperature" => self.temperature = None,
            "reasoning-effort" => self.reasoning_effort = None,
            "reasoning-summary" => self.reasoning_summary = None,
            "web-search" => self.web_search = None,
            "proxy-url" => self.proxy_url = None,
            "system-prompt" => self.system_prompt = None,
            _ => return Err(SettingError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}
