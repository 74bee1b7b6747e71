//! Reconciles demultiplexed stream events into an ordered transcript.
//!
//! Each of the three streamed kinds (answer text, tool activity, reasoning)
//! has its own [`KindState`]. The first delta of a kind within a turn creates
//! that kind's entry at the end of the transcript; every later delta of the
//! same kind appends to that entry, so positions follow first appearance and
//! never move while other kinds keep streaming.

use serde_json::Value;

use crate::core::message::{Message, TranscriptRole};
use crate::core::sse::StreamEvent;

/// Label shown for a tool call whose payloads carried no `query`.
pub const TOOL_PLACEHOLDER: &str = "Searching…";
pub const ERROR_MARKER: &str = "(error)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Text,
    Tool,
    Reasoning,
}

impl StreamKind {
    pub fn role(self) -> TranscriptRole {
        match self {
            StreamKind::Text => TranscriptRole::Assistant,
            StreamKind::Tool => TranscriptRole::Tool,
            StreamKind::Reasoning => TranscriptRole::Reasoning,
        }
    }
}

/// Per-kind state within one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindState {
    #[default]
    Inactive,
    /// Deltas of this kind append to the entry at `index`.
    Active { index: usize },
}

impl KindState {
    pub fn active_index(self) -> Option<usize> {
        match self {
            KindState::Inactive => None,
            KindState::Active { index } => Some(index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub role: TranscriptRole,
    /// Append-only buffer. Tool entries hold their raw payloads.
    pub text: String,
    /// Position at which this entry first appeared.
    pub index: usize,
    /// Display label for tool entries: the latest extracted query.
    pub label: Option<String>,
    /// Set when the turn completed normally.
    pub finalized: bool,
}

impl TranscriptEntry {
    fn new(role: TranscriptRole, index: usize) -> Self {
        Self {
            role,
            text: String::new(),
            index,
            label: None,
            finalized: false,
        }
    }

    /// Text a renderer should show for this entry.
    pub fn display_text(&self) -> &str {
        match self.role {
            TranscriptRole::Tool => self.label.as_deref().unwrap_or(TOOL_PLACEHOLDER),
            _ => &self.text,
        }
    }
}

/// Consumer-visible effect of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptUpdate {
    /// `delta` was appended to the entry at `index`; `created` is true for the
    /// first delta of that kind in this turn.
    Appended {
        kind: StreamKind,
        index: usize,
        delta: String,
        created: bool,
    },
    Completed,
    Failed { index: usize },
}

#[derive(Debug, Default, Clone)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    text: KindState,
    tool: KindState,
    reasoning: KindState,
    in_turn: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn in_turn(&self) -> bool {
        self.in_turn
    }

    pub fn state(&self, kind: StreamKind) -> KindState {
        match kind {
            StreamKind::Text => self.text,
            StreamKind::Tool => self.tool,
            StreamKind::Reasoning => self.reasoning,
        }
    }

    fn state_mut(&mut self, kind: StreamKind) -> &mut KindState {
        match kind {
            StreamKind::Text => &mut self.text,
            StreamKind::Tool => &mut self.tool,
            StreamKind::Reasoning => &mut self.reasoning,
        }
    }

    /// User and assistant turns, in order, for the next request's history.
    pub fn history(&self) -> Vec<Message> {
        self.entries
            .iter()
            .filter(|entry| entry.role.history_label().is_some())
            .map(|entry| Message::new(entry.role, entry.text.clone()))
            .collect()
    }

    /// Starts a new turn with the user's prompt. Entries from earlier turns
    /// are never reopened.
    pub fn begin_turn(&mut self, prompt: impl Into<String>) -> usize {
        self.reset_states();
        let index = self.entries.len();
        let mut entry = TranscriptEntry::new(TranscriptRole::User, index);
        entry.text = prompt.into();
        entry.finalized = true;
        self.entries.push(entry);
        self.in_turn = true;
        index
    }

    pub fn apply(&mut self, event: StreamEvent) -> TranscriptUpdate {
        match event {
            StreamEvent::TextDelta(delta) => self.append(StreamKind::Text, delta),
            StreamEvent::ReasoningDelta(delta) => self.append(StreamKind::Reasoning, delta),
            StreamEvent::ToolDelta(payload) => {
                let update = self.append(StreamKind::Tool, payload.clone());
                if let KindState::Active { index } = self.tool {
                    if let Some(query) = extract_query(&payload) {
                        self.entries[index].label = Some(query);
                    }
                }
                update
            }
            StreamEvent::Completed => {
                self.complete();
                TranscriptUpdate::Completed
            }
            StreamEvent::Error(message) => TranscriptUpdate::Failed {
                index: self.fail(&message),
            },
        }
    }

    fn append(&mut self, kind: StreamKind, delta: String) -> TranscriptUpdate {
        let (index, created) = match self.state(kind) {
            KindState::Active { index } => (index, false),
            KindState::Inactive => {
                let index = self.entries.len();
                self.entries.push(TranscriptEntry::new(kind.role(), index));
                *self.state_mut(kind) = KindState::Active { index };
                (index, true)
            }
        };
        self.entries[index].text.push_str(&delta);
        TranscriptUpdate::Appended {
            kind,
            index,
            delta,
            created,
        }
    }

    fn complete(&mut self) {
        for kind in [StreamKind::Text, StreamKind::Tool, StreamKind::Reasoning] {
            if let Some(index) = self.state(kind).active_index() {
                self.entries[index].finalized = true;
            }
        }
        self.reset_states();
    }

    /// Appends an error marker to the turn's text entry, creating one when no
    /// text has arrived, and ends the turn. Other active entries stay
    /// unfinalized.
    fn fail(&mut self, message: &str) -> usize {
        let marker = format!("{ERROR_MARKER} {}", message.trim());
        let index = match self.text {
            KindState::Active { index } => {
                let entry = &mut self.entries[index];
                if !entry.text.is_empty() {
                    entry.text.push('\n');
                }
                entry.text.push_str(&marker);
                index
            }
            KindState::Inactive => {
                let index = self.entries.len();
                let mut entry = TranscriptEntry::new(TranscriptRole::Assistant, index);
                entry.text = marker;
                self.entries.push(entry);
                index
            }
        };
        self.reset_states();
        index
    }

    fn reset_states(&mut self) {
        self.text = KindState::Inactive;
        self.tool = KindState::Inactive;
        self.reasoning = KindState::Inactive;
        self.in_turn = false;
    }
}

/// Best-effort extraction of a human-readable query from a raw tool payload.
///
/// This is a heuristic fallback, not a decoder: it searches JSON objects
/// recursively for a string-valued `query` key, then falls back to a plain
/// text scan for `"query":"..."`. Returns `None` when nothing is found; the
/// caller shows [`TOOL_PLACEHOLDER`] in that case.
pub fn extract_query(payload: &str) -> Option<String> {
    let payload = payload.trim();
    if payload.is_empty() {
        return None;
    }

    if payload.starts_with('{') {
        if let Ok(value) = serde_json::from_str::<Value>(payload) {
            if let Some(query) = find_query(&value) {
                return Some(query.to_string());
            }
        }
    }

    scan_query(payload)
}

fn find_query(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(query)) = map.get("query") {
                if !query.is_empty() {
                    return Some(query.as_str());
                }
            }
            map.values().find_map(find_query)
        }
        Value::Array(items) => items.iter().find_map(find_query),
        _ => None,
    }
}

fn scan_query(payload: &str) -> Option<String> {
    let start = payload.find("\"query\"")? + "\"query\"".len();
    let rest = payload[start..].trim_start();
    let rest = rest.strip_prefix(':')?.trim_start();
    let rest = rest.strip_prefix('"')?;
    let end = rest.find('"')?;
    let query = &rest[..end];
    (!query.is_empty()).then(|| query.to_string())
}
