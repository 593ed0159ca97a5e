// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Two layers:
//! - [`SessionError`] is what an execution session reports (execution fault,
//!   security rejection, or communication breakdown).
//! - [`ScriptlinkError`] is what callers of the manager see. Session errors
//!   are re-classified into it by [`classify`], one kind per kind.

use thiserror::Error;

/// Failure reported by an execution session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The command ran but the target reported a fault.
    #[error("{message} (exit code {exit_code})")]
    Execution {
        exit_code: i32,
        stdout: String,
        stderr: String,
        message: String,
    },

    /// Authentication or authorization was rejected.
    #[error("{0}")]
    Security(String),

    /// The channel could not be established or broke mid-operation.
    #[error("{0}")]
    Communication(String),
}

impl SessionError {
    pub fn execution(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        let stderr = stderr.into();
        let message = match stderr.lines().find(|l| !l.trim().is_empty()) {
            Some(line) => line.trim().to_string(),
            None => "command failed".to_string(),
        };
        SessionError::Execution {
            exit_code,
            stdout: stdout.into(),
            stderr,
            message,
        }
    }
}

#[derive(Error, Debug)]
pub enum ScriptlinkError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Security error: {0}")]
    SecurityError(String),

    #[error("Communication error: {0}")]
    CommunicationError(String),

    #[error("Script execution failed (status code {exit_code}): {message}")]
    ExecutionError {
        exit_code: i32,
        stdout: String,
        stderr: String,
        message: String,
    },

    #[error("Connectivity test failed: {0}")]
    SelfTestFailed(Box<ScriptlinkError>),

    #[error("execution manager has been disposed")]
    Disposed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScriptlinkError {
    /// Exit code carried by an execution failure, looking through a failed
    /// self-test.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ScriptlinkError::ExecutionError { exit_code, .. } => Some(*exit_code),
            ScriptlinkError::SelfTestFailed(inner) => inner.exit_code(),
            _ => None,
        }
    }
}

/// Map a session-layer failure onto the caller-facing taxonomy, prefixing
/// the message with `context`.
pub fn classify(context: &str, err: SessionError) -> ScriptlinkError {
    match err {
        SessionError::Execution {
            exit_code,
            stdout,
            stderr,
            message,
        } => ScriptlinkError::ExecutionError {
            exit_code,
            stdout,
            stderr,
            message: format!("{context}: {message}"),
        },
        SessionError::Security(msg) => ScriptlinkError::SecurityError(format!("{context}: {msg}")),
        SessionError::Communication(msg) => {
            ScriptlinkError::CommunicationError(format!("{context}: {msg}"))
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ScriptlinkError>;
