//! Invocation records and the pending handle the caller holds until resolution.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{domain::InvocationId, error::BridgeError, protocol::Command};
use thiserror::Error;
use tokio::sync::oneshot::{self, error::TryRecvError};

pub(crate) type Outcome = Result<Value, BridgeError>;

#[derive(Debug, Clone, PartialEq)]
pub enum InvocationState {
    Pending,
    Resolved(Value),
    Failed(BridgeError),
}

impl InvocationState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved(_) => "resolved",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvocationError {
    #[error("invocation {id} already {state}")]
    AlreadyTerminal {
        id: InvocationId,
        state: &'static str,
    },
}

/// One dispatch-to-resolution lifecycle of a [`Command`].
#[derive(Debug, Clone)]
pub struct Invocation {
    id: InvocationId,
    command: Command,
    dispatched_at: DateTime<Utc>,
    state: InvocationState,
}

impl Invocation {
    pub(crate) fn pending(id: InvocationId, command: Command) -> Self {
        Self {
            id,
            command,
            dispatched_at: Utc::now(),
            state: InvocationState::Pending,
        }
    }

    /// Moves a pending invocation into its terminal state. Terminal states are final.
    pub(crate) fn complete(&mut self, outcome: Outcome) -> Result<(), InvocationError> {
        if self.state.is_terminal() {
            return Err(InvocationError::AlreadyTerminal {
                id: self.id,
                state: self.state.label(),
            });
        }
        self.state = match outcome {
            Ok(value) => InvocationState::Resolved(value),
            Err(err) => InvocationState::Failed(err),
        };
        Ok(())
    }

    pub fn id(&self) -> InvocationId {
        self.id
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn dispatched_at(&self) -> DateTime<Utc> {
        self.dispatched_at
    }

    pub fn state(&self) -> &InvocationState {
        &self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.state {
            InvocationState::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&BridgeError> {
        match &self.state {
            InvocationState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn into_outcome(self) -> Result<Value, BridgeError> {
        match self.state {
            InvocationState::Resolved(value) => Ok(value),
            InvocationState::Failed(err) => Err(err),
            InvocationState::Pending => Err(BridgeError::bridge_unavailable(format!(
                "invocation {} has not resolved",
                self.id
            ))),
        }
    }

    /// Decodes the resolved payload; a payload of the wrong shape is a backend failure.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, BridgeError> {
        let command = self.command.name().to_string();
        let value = self.into_outcome()?;
        serde_json::from_value(value).map_err(|err| {
            BridgeError::backend_execution(format!(
                "unexpected response shape from '{command}': {err}"
            ))
            .with_code("malformed_response")
        })
    }
}

/// Caller-side handle for an outstanding invocation.
///
/// Dropping the handle does not cancel the backend execution.
#[derive(Debug)]
pub struct PendingInvocation {
    invocation: Invocation,
    reply: oneshot::Receiver<Outcome>,
}

impl PendingInvocation {
    pub(crate) fn new(invocation: Invocation, reply: oneshot::Receiver<Outcome>) -> Self {
        Self { invocation, reply }
    }

    pub fn id(&self) -> InvocationId {
        self.invocation.id()
    }

    pub fn command(&self) -> &Command {
        self.invocation.command()
    }

    pub fn dispatched_at(&self) -> DateTime<Utc> {
        self.invocation.dispatched_at()
    }

    /// Non-blocking poll: the terminal invocation, or the handle back if still pending.
    pub fn try_finish(mut self) -> Result<Invocation, Self> {
        let outcome = match self.reply.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return Err(self),
            Err(TryRecvError::Closed) => Err(dropped_reply(self.invocation.command())),
        };
        Ok(finish(self.invocation, outcome))
    }

    pub async fn wait(self) -> Invocation {
        let Self { invocation, reply } = self;
        let outcome = match reply.await {
            Ok(outcome) => outcome,
            Err(_) => Err(dropped_reply(invocation.command())),
        };
        finish(invocation, outcome)
    }

    pub async fn outcome(self) -> Result<Value, BridgeError> {
        self.wait().await.into_outcome()
    }
}

fn finish(mut invocation: Invocation, outcome: Outcome) -> Invocation {
    if let Err(err) = invocation.complete(outcome) {
        tracing::error!(invocation_id = %invocation.id(), "{err}");
    }
    invocation
}

fn dropped_reply(command: &Command) -> BridgeError {
    BridgeError::bridge_unavailable(format!(
        "command bridge dropped '{}' before it resolved",
        command.name()
    ))
}
