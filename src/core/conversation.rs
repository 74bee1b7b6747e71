//! Drives one chat session: owns the transcript and at most one active turn.

use std::path::Path;

use serde_json::json;
use tracing::{debug, warn};

use crate::core::chat_stream::{ChatStreamService, ResponsesClient, TurnHandle, TurnUpdate};
use crate::core::config::defaults::ChatSettings;
use crate::core::constants::{SYSTEM_PROMPT_FILE, WEB_SEARCH_SOURCES_INCLUDE, WEB_SEARCH_TOOL};
use crate::core::error::ChatError;
use crate::core::message::Message;
use crate::core::request::Request;
use crate::core::sse::StreamEvent;
use crate::core::transcript::{Transcript, TranscriptUpdate};

/// Reads `prompt.md` from `dir`, if present and non-empty.
pub fn load_prompt_override(dir: &Path) -> Option<String> {
    let path = dir.join(SYSTEM_PROMPT_FILE);
    match std::fs::read_to_string(&path) {
        Ok(contents) if !contents.trim().is_empty() => {
            debug!(path = %path.display(), "Using system prompt override");
            Some(contents)
        }
        Ok(_) => None,
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %err, "Failed to read prompt file");
            }
            None
        }
    }
}

/// Builds a request for `prompt` from the session settings, including the
/// web search tool when enabled.
pub fn build_request(settings: &ChatSettings, prompt: &str, history: Vec<Message>) -> Request {
    let mut request = Request::new(prompt)
        .with_system(settings.system_prompt.clone())
        .with_history(history)
        .with_model(settings.model.clone())
        .with_max_output_tokens(settings.max_output_tokens)
        .with_temperature(settings.temperature)
        .with_reasoning(
            settings.reasoning_effort.clone(),
            settings.reasoning_summary.clone(),
        );

    if settings.web_search {
        request = request
            .with_tools(
                vec![json!({ "type": WEB_SEARCH_TOOL })],
                Some("auto".to_string()),
            )
            .with_include(vec![WEB_SEARCH_SOURCES_INCLUDE.to_string()]);
    }
    request
}

/// What one poll of the conversation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationUpdate {
    /// The transcript changed.
    Transcript(TranscriptUpdate),
    /// No turn is active.
    Idle,
}

#[derive(Debug)]
pub struct Conversation {
    service: ChatStreamService,
    settings: ChatSettings,
    transcript: Transcript,
    active: Option<TurnHandle>,
}

impl Conversation {
    pub fn new(settings: ChatSettings) -> Result<Self, ChatError> {
        let client = ResponsesClient::new(&settings.transport_config(), settings.model.clone())?;
        Ok(Self {
            service: ChatStreamService::new(client),
            settings,
            transcript: Transcript::new(),
            active: None,
        })
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_streaming(&self) -> bool {
        self.active.is_some()
    }

    /// Starts a new turn. Any turn still in flight is cancelled first and
    /// its remaining events are discarded.
    pub fn submit(&mut self, prompt: &str) -> usize {
        if let Some(previous) = self.active.take() {
            debug!(turn_id = previous.turn_id(), "Cancelling previous turn");
            previous.cancel();
        }

        let history = self.transcript.history();
        let index = self.transcript.begin_turn(prompt.trim());
        let request = build_request(&self.settings, prompt, history);
        self.active = Some(self.service.spawn_turn(request));
        index
    }

    /// Cancels the active turn, if any. The transcript is left as is.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.cancel();
        }
    }

    /// Waits for one queued item of the active turn and applies it to the
    /// transcript. A terminal error is applied as an error marker.
    pub async fn next_update(&mut self) -> ConversationUpdate {
        let Some(handle) = self.active.as_mut() else {
            return ConversationUpdate::Idle;
        };

        match handle.next().await {
            TurnUpdate::Event(event) => {
                let terminal = event.is_terminal();
                let update = self.transcript.apply(event);
                if terminal {
                    self.active = None;
                }
                ConversationUpdate::Transcript(update)
            }
            TurnUpdate::Failed(err) => {
                self.active = None;
                ConversationUpdate::Transcript(
                    self.transcript.apply(StreamEvent::Error(err.to_string())),
                )
            }
            TurnUpdate::Finished => {
                self.active = None;
                if self.transcript.in_turn() {
                    ConversationUpdate::Transcript(self.transcript.apply(StreamEvent::Completed))
                } else {
                    ConversationUpdate::Idle
                }
            }
        }
    }

    /// Drives the active turn to its end, handing every update to `on_update`.
    pub async fn run_turn<F>(&mut self, mut on_update: F)
    where
        F: FnMut(&Transcript, &TranscriptUpdate),
    {
        while let ConversationUpdate::Transcript(update) = self.next_update().await {
            on_update(&self.transcript, &update);
        }
    }
}
