use std::{collections::HashMap, future::Future, sync::Arc};

use serde_json::Value;
use shared::{error::BridgeError, protocol::Command};

use crate::handler::{CommandHandler, FnHandler, HandlerError};

/// Name-to-handler table owned by the backend side of the bridge.
#[derive(Default, Clone)]
pub struct CommandRegistry {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`, replacing any earlier registration.
    pub fn register(&mut self, name: impl Into<String>, handler: impl CommandHandler + 'static) {
        let name = name.into();
        if self.handlers.insert(name.clone(), Arc::new(handler)).is_some() {
            tracing::warn!(command = %name, "replaced existing command handler");
        }
    }

    pub fn register_fn<F, Fut>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        self.register(name, FnHandler(f));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub async fn execute(&self, command: &Command) -> Result<Value, BridgeError> {
        let Some(handler) = self.handlers.get(command.name()) else {
            return Err(BridgeError::command_not_found(command.name()));
        };

        match handler.call(command.args().cloned()).await {
            Ok(value) => Ok(value),
            Err(HandlerError::InvalidArgument(message)) => {
                Err(BridgeError::invalid_argument(message))
            }
            Err(HandlerError::Execution { message, code }) => {
                let err = BridgeError::backend_execution(message);
                Err(match code {
                    Some(code) => err.with_code(code),
                    None => err,
                })
            }
        }
    }
}
