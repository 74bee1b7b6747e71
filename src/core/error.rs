use std::error::Error as StdError;
use std::fmt;

/// Failures surfaced by the Responses client.
///
/// Every variant renders as a single, display-safe line.
#[derive(Debug)]
pub enum ChatError {
    /// No credential was configured; raised before any network call.
    MissingApiKey,

    /// Connection, timeout, or body-read failure from the HTTP layer.
    Transport(reqwest::Error),

    /// Non-2xx response that did not qualify for the streaming fallback.
    Http {
        status: u16,
        /// Bounded prefix of the response body.
        body: String,
    },

    /// A non-streaming response body was not valid JSON.
    Decode(serde_json::Error),

    /// Streaming was refused and the one non-streaming retry failed too.
    StreamFallback {
        /// What made the streaming attempt fail (error payload or body).
        stream_error: String,
        retry: Box<ChatError>,
    },
}

impl ChatError {
    pub fn http(status: u16, body: impl AsRef<str>) -> Self {
        ChatError::Http {
            status,
            body: collapse_whitespace(body.as_ref()),
        }
    }

    pub fn stream_fallback(stream_error: impl AsRef<str>, retry: ChatError) -> Self {
        ChatError::StreamFallback {
            stream_error: collapse_whitespace(stream_error.as_ref()),
            retry: Box::new(retry),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ChatError::Http { status, .. } => Some(*status),
            ChatError::StreamFallback { retry, .. } => retry.status(),
            _ => None,
        }
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::MissingApiKey => {
                write!(f, "openai: missing API key (set OPENAI_API_KEY)")
            }
            ChatError::Transport(err) => {
                write!(f, "openai: request failed: {}", collapse_whitespace(&err.to_string()))
            }
            ChatError::Http { status, body } => write!(f, "openai: http {status}: {body}"),
            ChatError::Decode(err) => write!(f, "openai: invalid response body: {err}"),
            ChatError::StreamFallback {
                stream_error,
                retry,
            } => write!(
                f,
                "openai stream error then retry failed: {retry} | payload={stream_error}"
            ),
        }
    }
}

impl StdError for ChatError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ChatError::Transport(err) => Some(err),
            ChatError::Decode(err) => Some(err),
            ChatError::StreamFallback { retry, .. } => Some(retry.as_ref()),
            ChatError::MissingApiKey | ChatError::Http { .. } => None,
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Transport(err)
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Decode(err)
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
