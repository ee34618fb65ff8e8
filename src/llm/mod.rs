//! Reply generation for the `/chat` backend.
//!
//! The [`ReplyGenerator`] trait turns a conversation history into the next
//! assistant reply.
//!
//! # Generators
//!
//! - [`ChatCompletionsGenerator`]: OpenAI-compatible `/v1/chat/completions`
//! - [`EchoGenerator`]: offline fallback that repeats the last user turn
//!
//! # Example
//!
//! ```rust
//! use axum_chat_widget::llm::{EchoGenerator, ReplyGenerator, Turn};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let reply = EchoGenerator.generate(&[Turn::user("Hello!")]).await?;
//! assert_eq!(reply, "You said: Hello!");
//! # Ok(())
//! # }
//! ```

pub mod chat_completions;
pub mod provider;

pub use chat_completions::ChatCompletionsGenerator;
pub use provider::Provider;

use serde::{Deserialize, Serialize};

/// LLM connection and sampling settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Base URL for the LLM API (e.g., `https://api.openai.com`).
    pub base_url: String,
    /// Optional API key for authentication.
    pub api_key: Option<String>,
    /// Model identifier (e.g., `gpt-4o-mini`).
    pub model: String,
    /// Provider type (auto-detected from `base_url`).
    pub provider: Provider,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// System prompt.
    System,
    /// User message.
    User,
    /// Assistant reply.
    Assistant,
}

/// A single turn of the server-side conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced the turn.
    pub role: TurnRole,
    /// Text of the turn.
    pub content: String,
}

impl Turn {
    /// System turn.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::System,
            content: content.into(),
        }
    }

    /// User turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Assistant turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Produces the next assistant reply for a conversation.
#[async_trait::async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Generate a reply to `history`, whose last turn is the user's message.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing model cannot be reached or answers
    /// with something that is not a reply.
    async fn generate(&self, history: &[Turn]) -> anyhow::Result<String>;
}

/// Offline generator that repeats the most recent user turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoGenerator;

#[async_trait::async_trait]
impl ReplyGenerator for EchoGenerator {
    async fn generate(&self, history: &[Turn]) -> anyhow::Result<String> {
        let last = history
            .iter()
            .rev()
            .find(|t| t.role == TurnRole::User)
            .ok_or_else(|| anyhow::anyhow!("conversation has no user turn"))?;
        Ok(format!("You said: {}", last.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_uses_last_user_turn() {
        let history = vec![
            Turn::system("be nice"),
            Turn::user("first"),
            Turn::assistant("You said: first"),
            Turn::user("second"),
        ];
        let reply = EchoGenerator.generate(&history).await.unwrap();
        assert_eq!(reply, "You said: second");
    }

    #[tokio::test]
    async fn test_echo_without_user_turn_fails() {
        assert!(EchoGenerator.generate(&[Turn::system("x")]).await.is_err());
    }

    #[test]
    fn test_turn_serializes_like_chat_message() {
        let json = serde_json::to_value(Turn::assistant("hi")).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "assistant", "content": "hi" }));
    }
}
