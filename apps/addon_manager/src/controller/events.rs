//! UI events and error modeling for the page controller.

use serde_json::Value;
use shared::{
    domain::{AddonCount, InvocationId},
    error::{BridgeError, BridgeErrorKind},
};

pub enum UiEvent {
    InstalledCountLoaded(AddonCount),
    UpdateFinished {
        invocation_id: InvocationId,
        outcome: Value,
    },
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Backend,
    Validation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    InstalledCount,
    Update,
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Connection",
        UiErrorCategory::Backend => "Backend",
        UiErrorCategory::Validation => "Request",
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
    code: Option<String>,
}

impl UiError {
    pub fn from_bridge(context: UiErrorContext, err: &BridgeError) -> Self {
        let category = match err.kind() {
            BridgeErrorKind::BridgeUnavailable => UiErrorCategory::Transport,
            BridgeErrorKind::BackendExecution => UiErrorCategory::Backend,
            BridgeErrorKind::CommandNotFound | BridgeErrorKind::InvalidArgument => {
                UiErrorCategory::Validation
            }
        };

        Self {
            category,
            context,
            message: err.message().to_string(),
            code: err.code().map(str::to_string),
        }
    }

    /// Transport and backend failures may succeed on a later activation.
    pub fn retryable(&self) -> bool {
        matches!(
            self.category,
            UiErrorCategory::Transport | UiErrorCategory::Backend
        )
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub level: StatusLevel,
    pub message: String,
}
