//! Error types for replug
//!
//! All modules use `ReplugResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

use crate::driver::Direction;

/// Result type alias for replug operations
pub type ReplugResult<T> = Result<T, ReplugError>;

/// All errors that can occur in replug
#[derive(Error, Debug)]
pub enum ReplugError {
    // Environment errors
    #[error("Control-plane CLI not found: {name}. {hint}")]
    CliNotFound { name: String, hint: String },

    // Query errors
    #[error("Volume listing failed: {reason}")]
    QueryFailure { reason: String },

    // Parse errors
    #[error("Unparseable volume listing row: {line}: {reason}")]
    ParseFailure { line: String, reason: String },

    // Call errors
    #[error("{direction} volume failed for instance {instance_id}, volume {volume_id}: {stderr}")]
    CallFailure {
        direction: Direction,
        instance_id: String,
        volume_id: String,
        stderr: String,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed to start: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl ReplugError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a query failure
    pub fn query(reason: impl Into<String>) -> Self {
        Self::QueryFailure {
            reason: reason.into(),
        }
    }

    /// Create a parse failure for a specific listing line
    pub fn parse(line: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParseFailure {
            line: line.into(),
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CliNotFound { .. } => {
                Some("Install the OpenStack client: pip install python-openstackclient")
            }
            Self::QueryFailure { .. } => {
                Some("Check that your session is authenticated (source your openrc, or set --os-cloud)")
            }
            Self::ParseFailure { .. } => {
                Some("The volume listing format may have drifted; inspect: openstack volume list -f csv")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ReplugError::query("exit status 1");
        assert!(err.to_string().contains("Volume listing failed"));
    }

    #[test]
    fn error_hint() {
        let err = ReplugError::CliNotFound {
            name: "openstack".to_string(),
            hint: "not on PATH".to_string(),
        };
        assert!(err.hint().unwrap().contains("python-openstackclient"));
    }

    #[test]
    fn call_failure_names_the_call() {
        let err = ReplugError::CallFailure {
            direction: Direction::Remove,
            instance_id: "inst-1".to_string(),
            volume_id: "vol-1".to_string(),
            stderr: "conflict".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("remove"));
        assert!(msg.contains("inst-1"));
        assert!(msg.contains("vol-1"));
    }
}
