//! # Domain Layer
//!
//! Core definitions, types, and traits that describe what Alfred works with:
//! conversion requests, tool requirements, action plans and agent personas.
//! Independent of process spawning and HTTP, serving as the contract for other layers.

pub mod config;
pub mod error;
pub mod paths;
pub mod traits;
pub mod types;
