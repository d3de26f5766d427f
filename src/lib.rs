//! 面向多家异构大模型 HTTP API 的统一聊天客户端

pub mod client;
pub mod config;
mod engine;
pub mod error;
pub mod http;
pub mod provider;
pub mod stream;
pub mod types;

pub use client::LLMClient;
pub use error::LLMError;
pub use provider::{ChatStream, LLMProvider, extract_think_answer};
pub use types::*;
