//! Asynchronous command bridge between a UI thread and a backend executor.
//!
//! The UI side calls [`BridgeClient::invoke`], which never blocks and returns a
//! [`PendingInvocation`]. The backend side registers [`CommandHandler`]s in a
//! [`CommandRegistry`] that runs on the bridge's own tokio runtime. Every
//! invocation reaches exactly one terminal state, delivered through its
//! pending handle.

mod handler;
mod invocation;
mod registry;
mod runtime;

pub use handler::{decode_args, expect_no_args, respond, CommandHandler, FnHandler, HandlerError};
pub use invocation::{Invocation, InvocationError, InvocationState, PendingInvocation};
pub use registry::CommandRegistry;
pub use runtime::{BridgeClient, BridgeOptions, BridgeRuntime, DEFAULT_QUEUE_CAPACITY};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
