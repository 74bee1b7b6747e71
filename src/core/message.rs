use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TranscriptRole {
    User,
    Assistant,
    Tool,
    Reasoning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: TranscriptRole,
    pub content: String,
}

impl TranscriptRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TranscriptRole::User => "user",
            TranscriptRole::Assistant => "assistant",
            TranscriptRole::Tool => "tool",
            TranscriptRole::Reasoning => "reasoning",
        }
    }

    /// Label used when folding prior turns into a single textual input.
    /// Tool and reasoning turns are never sent back to the provider.
    pub fn history_label(self) -> Option<&'static str> {
        match self {
            TranscriptRole::User => Some("User"),
            TranscriptRole::Assistant => Some("Assistant"),
            _ => None,
        }
    }
}

impl AsRef<str> for TranscriptRole {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for TranscriptRole {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(TranscriptRole::User),
            "assistant" => Ok(TranscriptRole::Assistant),
            "tool" => Ok(TranscriptRole::Tool),
            "reasoning" => Ok(TranscriptRole::Reasoning),
            _ => Err(format!("invalid transcript role: {value}")),
        }
    }
}

impl TryFrom<String> for TranscriptRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<TranscriptRole> for String {
    fn from(value: TranscriptRole) -> Self {
        value.as_str().to_string()
    }
}

impl Message {
    pub fn new(role: TranscriptRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::Assistant, content)
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::Tool, content)
    }

    pub fn reasoning(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::Reasoning, content)
    }
}
