//! Shared data structures modeling normalized chat requests and responses.
//!
//! These types are the provider-agnostic currency of the crate: adapters
//! translate them to and from their own wire formats so callers never see a
//! provider-specific payload.

use serde::{Deserialize, Serialize};

/// Chat role accepted by every supported provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Normalized chat message shared across providers.
///
/// An ordered, oldest-first sequence of messages forms a conversation. The
/// message list handed to a provider is immutable once the request is built.
///
/// # Examples
///
/// ```
/// # use hashi_llm::types::{ChatMessage, Role};
/// let msg = ChatMessage::user("What is Rust?");
/// assert_eq!(msg.role, Role::User);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role associated with this message.
    pub role: Role,
    /// Plain UTF-8 text content.
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Complete chat response with the reasoning trace separated from the answer.
///
/// `think` is populated only when the provider exposes a reasoning trace or
/// the adapter can extract one from the answer text; otherwise it is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Reasoning trace, when one was exposed or extracted.
    pub think: Option<String>,
    /// User-facing answer text.
    pub answer: String,
}

impl ChatResponse {
    /// Rebuilds a response from a consumed chunk sequence.
    ///
    /// Contents tagged `is_thinking` concatenate into `think`, the rest into
    /// `answer`, yielding the streaming counterpart of a unary response.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hashi_llm::types::{ChatResponse, StreamChunk};
    /// let chunks = vec![
    ///     StreamChunk { content: "considering".into(), is_thinking: true, is_final: false },
    ///     StreamChunk { content: "42".into(), is_thinking: false, is_final: true },
    /// ];
    /// let response = ChatResponse::from_chunks(&chunks);
    /// assert_eq!(response.think.as_deref(), Some("considering"));
    /// assert_eq!(response.answer, "42");
    /// ```
    pub fn from_chunks(chunks: &[StreamChunk]) -> Self {
        let mut think = String::new();
        let mut answer = String::new();
        for chunk in chunks {
            if chunk.is_thinking {
                think.push_str(&chunk.content);
            } else {
                answer.push_str(&chunk.content);
            }
        }
        Self {
            think: (!think.is_empty()).then_some(think),
            answer,
        }
    }
}

/// One unit of a streamed response.
///
/// A stream may end without an explicit final chunk when the transport
/// closes; consumers treat end-of-stream as an implicit final.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Incremental text content.
    pub content: String,
    /// Whether this fragment belongs to the reasoning trace.
    #[serde(default)]
    pub is_thinking: bool,
    /// Marks the last chunk of the logical turn.
    #[serde(default)]
    pub is_final: bool,
}

/// Tunable sampling options recognized across providers.
///
/// Every field is independently optional. Each adapter forwards the subset
/// its upstream accepts and silently drops the rest.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatOptions {
    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,
    /// Cap on generated tokens; input plus this must fit the model context.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Encourages the model to move to new topics.
    pub presence_penalty: Option<f32>,
}
