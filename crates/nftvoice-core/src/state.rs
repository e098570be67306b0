//! UI-agnostic conversation state types
//!
//! Shared between front-ends (the terminal UI today) and free of any UI
//! framework dependency.

use serde::{Deserialize, Serialize};

/// One line of the in-memory chat log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn nft(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Nft, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }
}

/// Who a chat line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Nft,
    System,
}
