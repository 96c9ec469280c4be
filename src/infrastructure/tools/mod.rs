//! # Tools Module
//!
//! Everything that touches external executables: finding them, running them
//! with a timeout, and installing the ones Alfred knows how to fetch.

pub mod executor;
pub mod installer;
pub mod locator;
