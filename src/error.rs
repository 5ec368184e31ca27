//! Error taxonomy for the editor core.
//!
//! Mirrors the four categories from the error handling design: user-recoverable,
//! operational, script-evaluation-failure, and programming-invariant violations
//! (which are represented as panics, not `Result`s, at their precondition boundary).

use std::fmt;
use thiserror::Error;

/// How serious an error is, used to pick a status line presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A structured, machine-identifiable error produced by the core.
#[derive(Debug, Error)]
pub enum EdgeError {
    /// Bad input, unknown variable, unparseable number, unknown command,
    /// unresolvable path. No state change has occurred.
    #[error("[{severity}] unrecoverable input ({code}): {message}")]
    UserRecoverable {
        severity: Severity,
        code: &'static str,
        message: String,
    },

    /// File I/O failure, mkdir/stat/unlink failure, write/shutdown/waitpid
    /// failure. The operation aborts; no undo entry is recorded.
    #[error("[{severity}] operation failed ({code}): {message}")]
    Operational {
        severity: Severity,
        code: &'static str,
        message: String,
    },

    /// Compile or runtime error while evaluating a configured script or
    /// extension callback. Logged and surfaced as a warning; never fatal.
    #[error("[{severity}] script evaluation failed ({code}): {message}")]
    ScriptEvaluation {
        severity: Severity,
        code: &'static str,
        message: String,
    },

    /// Wraps an underlying `std::io::Error` encountered during an
    /// operational-category action.
    #[error("[{0}] io error: {1}")]
    Io(Severity, #[source] std::io::Error),
}

impl EdgeError {
    pub fn user(code: &'static str, message: impl Into<String>) -> Self {
        Self::UserRecoverable {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn operational(code: &'static str, message: impl Into<String>) -> Self {
        Self::Operational {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn script(code: &'static str, message: impl Into<String>) -> Self {
        Self::ScriptEvaluation {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::UserRecoverable { severity, .. }
            | Self::Operational { severity, .. }
            | Self::ScriptEvaluation { severity, .. } => *severity,
            Self::Io(severity, _) => *severity,
        }
    }
}

impl From<std::io::Error> for EdgeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Severity::Error, err)
    }
}

pub type Result<T> = std::result::Result<T, EdgeError>;

pub mod codes {
    pub const UNKNOWN_VARIABLE: &str = "UNKNOWN_VARIABLE";
    pub const UNKNOWN_COMMAND: &str = "UNKNOWN_COMMAND";
    pub const BAD_NUMBER: &str = "BAD_NUMBER";
    pub const UNRESOLVABLE_PATH: &str = "UNRESOLVABLE_PATH";
    pub const IO_FAILURE: &str = "IO_FAILURE";
    pub const WAITPID_FAILURE: &str = "WAITPID_FAILURE";
    pub const SCRIPT_COMPILE: &str = "SCRIPT_COMPILE";
    pub const SCRIPT_RUNTIME: &str = "SCRIPT_RUNTIME";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_recoverable_carries_warning_severity() {
        let err = EdgeError::user(codes::UNKNOWN_VARIABLE, "no such variable 'foo'");
        assert_eq!(err.severity(), Severity::Warning);
        assert!(err.to_string().contains("UNKNOWN_VARIABLE"));
    }

    #[test]
    fn io_error_converts_with_error_severity() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: EdgeError = io_err.into();
        assert_eq!(err.severity(), Severity::Error);
    }
}
