//! # Domain Traits
//!
//! Abstract interfaces for the collaborators Alfred talks to: the LLM and the
//! host's tool installation. Implementations live in the Infrastructure layer;
//! tests swap in scripted ones.

use async_trait::async_trait;

use crate::domain::error::Result;
use crate::domain::types::AgentInstruction;

/// Abstract interface for an LLM Provider
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one instruction and return the raw text answer.
    async fn complete(&self, instruction: &AgentInstruction) -> Result<String>;
}

/// Answers whether an executable can be launched.
pub trait ToolLocator: Send + Sync {
    fn is_available(&self, executable: &str) -> bool;
}
