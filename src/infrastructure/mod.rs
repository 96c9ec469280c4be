//! # Infrastructure Layer
//!
//! Handles interactions with external systems: LLM HTTP APIs, child
//! processes and tool downloads. Implements the traits defined in the
//! Domain layer (`LlmProvider`, `ToolLocator`).

pub mod llm;
pub mod tools;
