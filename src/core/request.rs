//! Generic chat requests and their projection onto the Responses wire payload.

use serde_json::Value;

use crate::api::{ReasoningParams, ResponsesRequest};
use crate::core::message::Message;

/// Model families that reject a sampling temperature.
const TEMPERATURE_REJECTING_PREFIXES: &[&str] = &["gpt-5", "o3"];

const HISTORY_HEADER: &str = "Previous conversation:\n";
const CURRENT_MESSAGE_MARKER: &str = "Current user message: ";

/// A provider-neutral chat request. Built once, then only read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    pub system: String,
    pub prompt: String,
    pub history: Vec<Message>,
    pub model: Option<String>,
    pub max_output_tokens: Option<u32>,
    pub temperature: f32,
    pub stop: Vec<String>,
    pub tools: Vec<Value>,
    pub tool_choice: Option<String>,
    pub include: Vec<String>,
    pub reasoning_effort: String,
    pub reasoning_summary: String,
}

impl Request {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_tools(mut self, tools: Vec<Value>, tool_choice: Option<String>) -> Self {
        self.tools = tools;
        self.tool_choice = tool_choice;
        self
    }

    pub fn with_include(mut self, include: Vec<String>) -> Self {
        self.include = include;
        self
    }

    pub fn with_reasoning(
        mut self,
        effort: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        self.reasoning_effort = effort.into();
        self.reasoning_summary = summary.into();
        self
    }

    /// The model this request targets: its own override, else `default_model`.
    pub fn resolve_model<'a>(&'a self, default_model: &'a str) -> &'a str {
        match self.model.as_deref() {
            Some(model) if !model.trim().is_empty() => model,
            _ => default_model,
        }
    }
}

/// Whether `model` accepts a sampling temperature.
pub fn supports_temperature(model: &str) -> bool {
    let model = model.to_ascii_lowercase();
    !TEMPERATURE_REJECTING_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

/// Folds prior turns and the current prompt into the single textual input
/// the provider receives.
///
/// Without history the trimmed prompt is returned verbatim. With history, the
/// user and assistant turns are rendered as a readable transcript (tool and
/// reasoning turns are skipped), followed by a marker line and the trimmed
/// prompt.
pub fn build_input_with_history(prompt: &str, history: &[Message]) -> String {
    let prompt = prompt.trim();
    if history.is_empty() {
        return prompt.to_string();
    }

    let mut input = String::from(HISTORY_HEADER);
    for message in history {
        let Some(label) = message.role.history_label() else {
            continue;
        };
        input.push_str(label);
        input.push_str(": ");
        input.push_str(&message.content);
        input.push_str("\n\n");
    }
    input.push_str(CURRENT_MESSAGE_MARKER);
    input.push_str(prompt);
    input
}

/// Projects a [`Request`] onto the wire payload for `model`.
pub fn build_wire_request(request: &Request, default_model: &str, stream: bool) -> ResponsesRequest {
    let model = request.resolve_model(default_model).to_string();

    let temperature = (request.temperature > 0.0 && supports_temperature(&model))
        .then_some(request.temperature);

    let effort = non_empty(&request.reasoning_effort);
    let summary = non_empty(&request.reasoning_summary);
    let reasoning = (effort.is_some() || summary.is_some())
        .then_some(ReasoningParams { effort, summary });

    ResponsesRequest {
        model,
        instructions: request.system.trim().to_string(),
        input: build_input_with_history(&request.prompt, &request.history),
        max_output_tokens: request.max_output_tokens.filter(|tokens| *tokens > 0),
        temperature,
        stream,
        stop: request.stop.clone(),
        tools: request.tools.clone(),
        tool_choice: request
            .tool_choice
            .as_deref()
            .and_then(non_empty),
        include: request.include.clone(),
        reasoning,
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
