//! # Interface Layer
//!
//! The command line surface: argument parsing, the handlers behind each
//! subcommand and the reporter that renders their events.

pub mod cli;
pub mod commands;
pub mod report;
