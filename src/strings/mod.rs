//! # Strings Module
//!
//! Centralizes user-facing strings and persona prompts.

pub mod messages;
pub mod prompts;
