//! # Errors
//!
//! The typed failure taxonomy shared by every layer. Command handlers wrap these
//! in `anyhow` for context; `main` downcasts back to pick the sentinel and exit code.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlfredError {
    /// The (category, source, target) triple is not in the capability table.
    #[error("Don't know how to convert .{from} -> .{to}")]
    UnsupportedConversion { from: String, to: String },

    /// A supported conversion needs an external tool that is not installed.
    #[error("Missing tool: {tool}")]
    NeedsInstall { tool: String },

    /// The converter ran and failed, timed out, or produced nothing.
    #[error("{tool} failed: {message}")]
    Conversion { tool: String, message: String },

    /// The LLM provider failed after retries, or was misconfigured.
    #[error("[{provider}] {message}")]
    Provider { provider: String, message: String },

    /// The LLM answered, but not with anything usable.
    #[error("AI response could not be used: {0}")]
    InvalidResponse(String),

    /// The safety guard refused a generated command.
    #[error("Blocked: dangerous command detected (matched `{rule}`)")]
    SafetyBlocked { rule: String },

    /// A generated command ran but did not succeed.
    #[error("Command failed: {0}")]
    Execution(String),

    /// The installer could not fetch or unpack a tool.
    #[error("Install of {tool} failed: {message}")]
    Install { tool: String, message: String },

    /// The plan re-derived at confirm time differs from the previewed one.
    #[error("Plan changed since preview (expected {expected}, now {actual}). Preview again.")]
    StalePlan { expected: String, actual: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, AlfredError>;

impl AlfredError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn conversion(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Stable snake_case name used in structured output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedConversion { .. } => "unsupported_conversion",
            Self::NeedsInstall { .. } => "needs_install",
            Self::Conversion { .. } => "conversion",
            Self::Provider { .. } => "provider",
            Self::InvalidResponse(_) => "invalid_response",
            Self::SafetyBlocked { .. } => "safety_blocked",
            Self::Execution(_) => "execution",
            Self::Install { .. } => "install",
            Self::StalePlan { .. } => "stale_plan",
            Self::InvalidInput(_) => "invalid_input",
            Self::Io { .. } => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_both_formats() {
        let err = AlfredError::UnsupportedConversion {
            from: "xyz".into(),
            to: "abc".into(),
        };
        assert_eq!(err.to_string(), "Don't know how to convert .xyz -> .abc");
        assert_eq!(err.kind(), "unsupported_conversion");
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = AlfredError::io(
            "/tmp/missing",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().starts_with("/tmp/missing"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
