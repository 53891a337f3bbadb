//! Worker thread that owns the backend runtime and drains the UI command queue.

use std::{
    io,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    thread,
};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::de::DeserializeOwned;
use shared::{domain::InvocationId, error::BridgeError, protocol::Command};
use tokio::{sync::oneshot, task::JoinHandle};

use crate::{
    invocation::{Invocation, Outcome, PendingInvocation},
    registry::CommandRegistry,
};

pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
const WORKER_THREAD_NAME: &str = "command-bridge";

#[derive(Debug, Clone)]
pub struct BridgeOptions {
    pub queue_capacity: usize,
    pub worker_threads: Option<usize>,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            worker_threads: None,
        }
    }
}

pub(crate) struct BridgeRequest {
    id: InvocationId,
    command: Command,
    reply: oneshot::Sender<Outcome>,
}

/// Handle on the bridge worker thread.
pub struct BridgeRuntime {
    worker: thread::JoinHandle<()>,
}

impl BridgeRuntime {
    pub fn launch(
        registry: CommandRegistry,
        options: BridgeOptions,
    ) -> io::Result<(BridgeClient, BridgeRuntime)> {
        let (requests_tx, requests_rx) = bounded::<BridgeRequest>(options.queue_capacity.max(1));
        let registry = Arc::new(registry);
        let worker_threads = options.worker_threads;
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(registry, requests_rx, worker_threads))?;

        Ok((BridgeClient::from_sender(requests_tx), BridgeRuntime { worker }))
    }

    /// Blocks until every client is dropped and in-flight invocations have finished.
    pub fn join(self) {
        if self.worker.join().is_err() {
            tracing::error!("command bridge worker panicked");
        }
    }
}

fn run_worker(
    registry: Arc<CommandRegistry>,
    requests: Receiver<BridgeRequest>,
    worker_threads: Option<usize>,
) {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all().thread_name("command-bridge-task");
    if let Some(threads) = worker_threads {
        builder.worker_threads(threads.max(1));
    }
    let runtime = match builder.build() {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!("failed to build command bridge runtime: {err}");
            refuse_requests(&requests, "command bridge runtime failed to start");
            return;
        }
    };

    tracing::info!(commands = ?registry.names(), "command bridge ready");
    runtime.block_on(async move {
        let mut in_flight: Vec<JoinHandle<()>> = Vec::new();
        while let Ok(request) = requests.recv() {
            in_flight.retain(|task| !task.is_finished());
            in_flight.push(tokio::spawn(dispatch(Arc::clone(&registry), request)));
        }
        tracing::debug!(
            in_flight = in_flight.len(),
            "command bridge queue closed; draining"
        );
        for task in in_flight {
            let _ = task.await;
        }
    });
    tracing::info!("command bridge stopped");
}

/// Answers every queued and future request with `BridgeUnavailable` until all
/// clients are dropped. Buffered requests outlive the receiver while any sender
/// exists, so they have to be drained here.
pub(crate) fn refuse_requests(requests: &Receiver<BridgeRequest>, reason: &str) {
    for request in requests.iter() {
        tracing::warn!(
            invocation_id = %request.id,
            command = request.command.name(),
            "refusing command: {reason}"
        );
        let _ = request
            .reply
            .send(Err(BridgeError::bridge_unavailable(reason)));
    }
}

async fn dispatch(registry: Arc<CommandRegistry>, request: BridgeRequest) {
    let BridgeRequest { id, command, reply } = request;
    let name = command.name().to_string();
    tracing::debug!(invocation_id = %id, command = %name, "executing command");

    let execution = tokio::spawn(async move { registry.execute(&command).await });
    let outcome = match execution.await {
        Ok(outcome) => outcome,
        Err(err) if err.is_panic() => Err(BridgeError::backend_execution(format!(
            "command '{name}' panicked"
        ))
        .with_code("panic")),
        Err(err) => Err(BridgeError::bridge_unavailable(format!(
            "command '{name}' was aborted: {err}"
        ))),
    };

    match &outcome {
        Ok(_) => tracing::debug!(invocation_id = %id, command = %name, "command resolved"),
        Err(err) => tracing::warn!(invocation_id = %id, command = %name, "command failed: {err}"),
    }

    if reply.send(outcome).is_err() {
        tracing::debug!(
            invocation_id = %id,
            command = %name,
            "caller dropped invocation before it resolved"
        );
    }
}

/// UI-side entry point. Cloning shares the same queue and id sequence.
#[derive(Clone)]
pub struct BridgeClient {
    requests: Sender<BridgeRequest>,
    next_id: Arc<AtomicU64>,
}

impl BridgeClient {
    pub(crate) fn from_sender(requests: Sender<BridgeRequest>) -> Self {
        Self {
            requests,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Queues `command` without blocking. Every failure, including a dead
    /// transport, is delivered through the returned handle.
    pub fn invoke(&self, command: Command) -> PendingInvocation {
        let id = InvocationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (reply, reply_rx) = oneshot::channel();
        let pending = PendingInvocation::new(Invocation::pending(id, command.clone()), reply_rx);
        let name = pending.command().name();

        if name.trim().is_empty() {
            let _ = reply.send(Err(BridgeError::invalid_argument(
                "command name must not be empty",
            )));
            return pending;
        }

        tracing::debug!(invocation_id = %id, command = name, "queueing ui->backend command");
        match self.requests.try_send(BridgeRequest { id, command, reply }) {
            Ok(()) => {
                tracing::debug!(invocation_id = %id, command = name, "queued ui->backend command");
            }
            Err(TrySendError::Full(request)) => {
                tracing::warn!(command = name, "ui->backend command queue is full");
                let _ = request.reply.send(Err(BridgeError::bridge_unavailable(
                    "UI command queue is full; please retry",
                )));
            }
            Err(TrySendError::Disconnected(request)) => {
                tracing::error!(command = name, "ui->backend command queue disconnected");
                let _ = request.reply.send(Err(BridgeError::bridge_unavailable(
                    "backend command processor disconnected",
                )));
            }
        }
        pending
    }

    pub async fn call<T: DeserializeOwned>(&self, command: Command) -> Result<T, BridgeError> {
        self.invoke(command).wait().await.into_result()
    }
}
