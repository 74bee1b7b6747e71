//! Line-level demultiplexing of the Responses server-sent-event body.
//!
//! The body interleaves three logical sub-streams (answer text, tool activity,
//! reasoning narration) plus terminal events. [`SseDemuxer`] is fed one line at
//! a time and turns each `data:` line into zero or more [`StreamEvent`]s.

use serde::Deserialize;

pub const EVENT_OUTPUT_TEXT_DELTA: &str = "response.output_text.delta";
pub const EVENT_TOOL_CALL_DELTA: &str = "response.tool_call.delta";
pub const EVENT_WEB_SEARCH_CALL_DELTA: &str = "response.web_search_call.delta";
pub const EVENT_REASONING_DELTA: &str = "response.reasoning.delta";
pub const EVENT_SUMMARY_DELTA: &str = "response.summary.delta";
pub const EVENT_COMPLETED: &str = "response.completed";
pub const EVENT_ERROR: &str = "error";

const WEB_SEARCH_MARKER: &str = "web_search_call";
const SUMMARY_TEXT_MARKER: &str = "summary_text";
const REASONING_TYPE_MARKER: &str = "\"type\":\"reasoning\"";

/// One decoded unit of a streamed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    TextDelta(String),
    /// Raw, undecoded tool-call payload.
    ToolDelta(String),
    ReasoningDelta(String),
    Completed,
    /// Raw payload of a server `error` event.
    Error(String),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed | StreamEvent::Error(_))
    }
}

#[derive(Deserialize)]
struct DeltaPayload {
    #[serde(default)]
    delta: Option<String>,
}

/// Decodes a `data:` payload that is either a bare string or a JSON object
/// carrying a `delta` field. A JSON object without `delta` decodes to an
/// empty string; anything that fails to parse is used verbatim.
pub fn parse_delta(payload: &str) -> String {
    if payload.starts_with('{') {
        if let Ok(parsed) = serde_json::from_str::<DeltaPayload>(payload) {
            return parsed.delta.unwrap_or_default();
        }
    }
    payload.to_string()
}

fn extract_event_name(line: &str) -> Option<&str> {
    line.strip_prefix("event:").map(str::trim)
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}

/// Stateful SSE line classifier.
///
/// The current event name is set by an `event:` line and persists across any
/// number of following `data:` lines; blank lines do not reset it.
#[derive(Debug, Default)]
pub struct SseDemuxer {
    current_event: String,
}

impl SseDemuxer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies one line, appending any resulting events to `out` in the
    /// order they should be delivered.
    pub fn process_line(&mut self, line: &str, out: &mut Vec<StreamEvent>) {
        if let Some(name) = extract_event_name(line) {
            self.current_event = name.to_string();
            return;
        }

        let Some(payload) = extract_data_payload(line) else {
            return;
        };

        match self.current_event.as_str() {
            EVENT_OUTPUT_TEXT_DELTA => {
                let delta = parse_delta(payload);
                if !delta.is_empty() {
                    out.push(StreamEvent::TextDelta(delta));
                }
            }
            EVENT_TOOL_CALL_DELTA | EVENT_WEB_SEARCH_CALL_DELTA => {
                out.push(StreamEvent::ToolDelta(payload.to_string()));
            }
            EVENT_REASONING_DELTA | EVENT_SUMMARY_DELTA => {
                out.push(StreamEvent::ReasoningDelta(parse_delta(payload)));
            }
            EVENT_COMPLETED => out.push(StreamEvent::Completed),
            EVENT_ERROR => out.push(StreamEvent::Error(payload.to_string())),
            _ => {}
        }

        // Some server versions send these payloads without a distinct event
        // name, so they are detected from the payload text as well.
        if payload.contains(WEB_SEARCH_MARKER) {
            out.push(StreamEvent::ToolDelta(payload.to_string()));
        }
        if payload.contains(SUMMARY_TEXT_MARKER) || payload.contains(REASONING_TYPE_MARKER) {
            out.push(StreamEvent::ReasoningDelta(parse_delta(payload)));
        }
    }

    /// Convenience wrapper over [`process_line`](Self::process_line) for a
    /// complete body.
    pub fn process_body(&mut self, body: &str) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        for line in body.lines() {
            self.process_line(line.trim_end_matches('\r'), &mut events);
        }
        events
    }
}
