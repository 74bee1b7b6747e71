use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Provider-shaped payload for `POST /v1/responses`.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct ResponsesRequest {
    pub model: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub instructions: String,
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ReasoningParams>,
}

impl ResponsesRequest {
    /// Copy of this payload with streaming turned off, used for the one-shot
    /// non-streaming retry.
    pub fn without_streaming(&self) -> Self {
        Self {
            stream: false,
            ..self.clone()
        }
    }
}

#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReasoningParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ResponsesResponse {
    #[serde(default)]
    pub output_text: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output: Vec<ResponseOutputBlock>,
    #[serde(default)]
    pub usage: Option<ResponseUsage>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ResponseOutputBlock {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<ResponseContentItem>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ResponseContentItem {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
}

#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResponseUsage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub input_tokens: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output_tokens: u64,
}

/// Treats an explicit `null` like a missing field. Reasoning blocks, for
/// example, arrive with `"content": null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ResponsesResponse {
    /// Answer text: top-level `output_text` when present, otherwise the
    /// text items of every output block concatenated in order.
    pub fn text(&self) -> String {
        match self.output_text.as_deref() {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => self.aggregate_output_text(),
        }
    }

    fn aggregate_output_text(&self) -> String {
        self.output
            .iter()
            .flat_map(|block| block.content.iter())
            .filter(|item| item.kind == "output_text" || item.kind == "text")
            .map(|item| item.text.as_str())
            .collect()
    }

    pub fn usage(&self) -> ResponseUsage {
        self.usage.unwrap_or_default()
    }
}
