//! Simple LLM API wrapper for the providers Alfred can talk to
//!
//! One request per invocation: a prompt, optional images, a text answer.
//! Ollama (the default, via its OpenAI-compatible endpoint), OpenAI,
//! Anthropic and Gemini are supported.
//!
//! ```rust,ignore
//! let client = Client::new(config.ai.clone());
//! let answer = client
//!     .complete(&AgentInstruction::new(Persona::Summarize, "Summarize: ..."))
//!     .await?;
//! ```

mod client;
pub mod providers;
pub mod retry;
mod types;

pub use client::Client;

pub use types::{Context, Error, Message, MessageRole, Provider, Response, TokenUsage};
