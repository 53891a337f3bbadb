use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeErrorKind {
    CommandNotFound,
    InvalidArgument,
    BackendExecution,
    BridgeUnavailable,
}

impl BridgeErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CommandNotFound => "command_not_found",
            Self::InvalidArgument => "invalid_argument",
            Self::BackendExecution => "backend_execution",
            Self::BridgeUnavailable => "bridge_unavailable",
        }
    }
}

impl fmt::Display for BridgeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure handed back to the caller of a bridge invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct BridgeError {
    pub kind: BridgeErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl BridgeError {
    pub fn new(kind: BridgeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
        }
    }

    pub fn command_not_found(command: &str) -> Self {
        Self::new(
            BridgeErrorKind::CommandNotFound,
            format!("command '{command}' is not registered"),
        )
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(BridgeErrorKind::InvalidArgument, message)
    }

    pub fn backend_execution(message: impl Into<String>) -> Self {
        Self::new(BridgeErrorKind::BackendExecution, message)
    }

    pub fn bridge_unavailable(message: impl Into<String>) -> Self {
        Self::new(BridgeErrorKind::BridgeUnavailable, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn kind(&self) -> BridgeErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}
