//! # Application Layer
//!
//! Contains the core logic and orchestration: tool resolution, conversion
//! dispatch, plan derivation and the plan/confirm workflow, safety checks,
//! persona answer parsing and logging setup.

pub mod convert;
pub mod logging;
pub mod organize;
pub mod parsing;
pub mod plan;
pub mod rename;
pub mod resolver;
pub mod safety;
pub mod vision;
