//! Backend-facing handler seam.

use std::future::Future;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{message}")]
    Execution {
        message: String,
        code: Option<String>,
    },
}

impl HandlerError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
            code: None,
        }
    }

    pub fn execution_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
            code: Some(code.into()),
        }
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn call(&self, args: Option<Value>) -> Result<Value, HandlerError>;
}

/// Adapts an async closure into a [`CommandHandler`].
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F, Fut> CommandHandler for FnHandler<F>
where
    F: Fn(Option<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    async fn call(&self, args: Option<Value>) -> Result<Value, HandlerError> {
        (self.0)(args).await
    }
}

/// Rejects any payload other than absent, `null` or an empty object.
pub fn expect_no_args(args: &Option<Value>) -> Result<(), HandlerError> {
    match args {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Object(map)) if map.is_empty() => Ok(()),
        Some(other) => Err(HandlerError::invalid_argument(format!(
            "command takes no arguments, got {other}"
        ))),
    }
}

pub fn decode_args<T: DeserializeOwned>(args: Option<Value>) -> Result<T, HandlerError> {
    let value = args.unwrap_or(Value::Null);
    serde_json::from_value(value)
        .map_err(|err| HandlerError::invalid_argument(format!("malformed arguments: {err}")))
}

pub fn respond<T: Serialize>(value: T) -> Result<Value, HandlerError> {
    serde_json::to_value(value).map_err(|err| {
        HandlerError::execution_with_code(
            format!("failed to encode command result: {err}"),
            "encode",
        )
    })
}
