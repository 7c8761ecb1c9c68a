use serde::{Deserialize, Serialize};

/// Canonical unit of message content sent upstream.
/// Only text blocks exist today; new variants slot in beside `Text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
}

impl ContentBlock {
    /// Create a text block
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text { text: s.into() }
    }

    /// Empty text block, used when a message carries no usable content
    pub fn empty() -> Self {
        Self::text(String::new())
    }

    pub fn as_text(&self) -> &str {
        match self {
            Self::Text { text } => text,
        }
    }
}

impl From<String> for ContentBlock {
    fn from(s: String) -> Self {
        Self::text(s)
    }
}

impl From<&str> for ContentBlock {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}
