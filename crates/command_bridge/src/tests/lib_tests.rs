use super::*;
use serde_json::{json, Value};
use shared::{
    domain::AddonCount,
    error::BridgeErrorKind,
    protocol::{Command, GET_INSTALLED_ADDON_COUNT, UPDATE},
};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::sync::{Barrier, Notify};

fn launch(registry: CommandRegistry) -> BridgeClient {
    let (client, _runtime) =
        BridgeRuntime::launch(registry, BridgeOptions::default()).expect("launch bridge");
    client
}

fn count_registry(count: u64) -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register_fn(GET_INSTALLED_ADDON_COUNT, move |args| async move {
        expect_no_args(&args)?;
        respond(AddonCount(count))
    });
    registry
}

#[tokio::test]
async fn resolves_registered_command_with_its_value() {
    let client = launch(count_registry(7));

    let count: AddonCount = client
        .call(Command::get_installed_addon_count())
        .await
        .expect("count");
    assert_eq!(count, AddonCount(7));
}

#[tokio::test]
async fn zero_installed_addons_is_a_success() {
    let client = launch(count_registry(0));

    let invocation = client.invoke(Command::get_installed_addon_count()).wait().await;
    assert_eq!(invocation.state(), &InvocationState::Resolved(json!(0)));
    assert!(invocation.error().is_none());
}

#[tokio::test]
async fn unknown_command_resolves_to_command_not_found() {
    let client = launch(count_registry(3));

    let err = client
        .invoke(Command::new("install_everything"))
        .outcome()
        .await
        .expect_err("unknown command must fail");
    assert_eq!(err.kind(), BridgeErrorKind::CommandNotFound);
    assert!(err.message().contains("install_everything"));
}

#[tokio::test]
async fn empty_command_name_never_reaches_the_backend() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = CommandRegistry::new();
    let seen = Arc::clone(&calls);
    registry.register_fn("", move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, HandlerError>(Value::Null) }
    });
    let client = launch(registry);

    let err = client
        .invoke(Command::new("  "))
        .outcome()
        .await
        .expect_err("blank name");
    assert_eq!(err.kind(), BridgeErrorKind::InvalidArgument);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn handler_argument_rejection_maps_to_invalid_argument() {
    let client = launch(count_registry(1));

    let err = client
        .invoke(Command::with_args(GET_INSTALLED_ADDON_COUNT, json!([1, 2])))
        .outcome()
        .await
        .expect_err("args rejected");
    assert_eq!(err.kind(), BridgeErrorKind::InvalidArgument);
}

#[tokio::test]
async fn empty_object_args_are_accepted_for_argless_commands() {
    let client = launch(count_registry(4));

    let count: AddonCount = client
        .call(Command::with_args(GET_INSTALLED_ADDON_COUNT, json!({})))
        .await
        .expect("count");
    assert_eq!(count, AddonCount(4));
}

#[tokio::test]
async fn backend_failure_carries_message_and_code() {
    let mut registry = CommandRegistry::new();
    registry.register_fn(UPDATE, |_| async {
        Err::<Value, _>(HandlerError::execution_with_code(
            "network unreachable",
            "network",
        ))
    });
    let client = launch(registry);

    let invocation = client.invoke(Command::update()).wait().await;
    let err = invocation.error().expect("failed invocation");
    assert_eq!(err.kind(), BridgeErrorKind::BackendExecution);
    assert_eq!(err.message(), "network unreachable");
    assert_eq!(err.code(), Some("network"));
    assert!(invocation.result().is_none());
}

#[tokio::test]
async fn handler_panic_resolves_to_backend_execution() {
    let mut registry = CommandRegistry::new();
    registry.register_fn(UPDATE, |_| async {
        if true {
            panic!("handler blew up");
        }
        Ok::<_, HandlerError>(Value::Null)
    });
    let client = launch(registry);

    let err = client
        .invoke(Command::update())
        .outcome()
        .await
        .expect_err("panic surfaces as failure");
    assert_eq!(err.kind(), BridgeErrorKind::BackendExecution);
    assert_eq!(err.code(), Some("panic"));
}

#[tokio::test]
async fn mismatched_response_shape_is_a_backend_failure() {
    let mut registry = CommandRegistry::new();
    registry.register_fn(GET_INSTALLED_ADDON_COUNT, |_| async { Ok::<_, HandlerError>(json!(-3)) });
    let client = launch(registry);

    let err = client
        .call::<AddonCount>(Command::get_installed_addon_count())
        .await
        .expect_err("negative count does not decode");
    assert_eq!(err.kind(), BridgeErrorKind::BackendExecution);
    assert_eq!(err.code(), Some("malformed_response"));
}

#[tokio::test]
async fn overlapping_updates_run_concurrently_and_both_resolve() {
    let barrier = Arc::new(Barrier::new(2));
    let mut registry = CommandRegistry::new();
    let gate = Arc::clone(&barrier);
    registry.register_fn(UPDATE, move |_| {
        let gate = Arc::clone(&gate);
        async move {
            // Only passes once both invocations are executing at the same time.
            gate.wait().await;
            Ok::<_, HandlerError>(json!({ "updated": true }))
        }
    });
    let client = launch(registry);

    let first = client.invoke(Command::update());
    let second = client.invoke(Command::update());
    assert_ne!(first.id(), second.id());

    let (first, second) = tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(first.wait(), second.wait())
    })
    .await
    .expect("overlapping updates must not deadlock");

    assert!(first.result().is_some());
    assert!(second.result().is_some());
}

#[tokio::test]
async fn later_fast_invocation_can_resolve_before_earlier_slow_one() {
    #[derive(serde::Deserialize)]
    struct SleepArgs {
        delay_ms: u64,
        tag: u64,
    }

    let finished = Arc::new(Mutex::new(Vec::new()));
    let mut registry = CommandRegistry::new();
    let order = Arc::clone(&finished);
    registry.register_fn("sleep", move |args| {
        let order = Arc::clone(&order);
        async move {
            let args: SleepArgs = decode_args(args)?;
            tokio::time::sleep(Duration::from_millis(args.delay_ms)).await;
            order.lock().expect("order lock").push(args.tag);
            Ok::<_, HandlerError>(json!(args.tag))
        }
    });
    let client = launch(registry);

    let slow = client.invoke(Command::with_args("sleep", json!({ "delay_ms": 400, "tag": 1 })));
    let fast = client.invoke(Command::with_args("sleep", json!({ "delay_ms": 0, "tag": 2 })));

    let (slow, fast) = tokio::join!(slow.outcome(), fast.outcome());
    assert_eq!(slow.expect("slow"), json!(1));
    assert_eq!(fast.expect("fast"), json!(2));
    assert_eq!(*finished.lock().expect("order lock"), vec![2, 1]);
}

#[tokio::test]
async fn try_finish_hands_back_pending_until_backend_responds() {
    let release = Arc::new(Notify::new());
    let mut registry = CommandRegistry::new();
    let gate = Arc::clone(&release);
    registry.register_fn(UPDATE, move |_| {
        let gate = Arc::clone(&gate);
        async move {
            gate.notified().await;
            Ok::<_, HandlerError>(json!("done"))
        }
    });
    let client = launch(registry);

    let pending = client.invoke(Command::update());
    let mut pending = match pending.try_finish() {
        Ok(invocation) => panic!("resolved early: {:?}", invocation.state()),
        Err(pending) => pending,
    };

    release.notify_one();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let invocation = loop {
        match pending.try_finish() {
            Ok(invocation) => break invocation,
            Err(still_pending) => {
                assert!(tokio::time::Instant::now() < deadline, "never resolved");
                pending = still_pending;
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }
    };
    assert_eq!(invocation.result(), Some(&json!("done")));
}

#[tokio::test]
async fn dropping_the_handle_does_not_cancel_backend_work() {
    let ran = Arc::new(AtomicBool::new(false));
    let mut registry = CommandRegistry::new();
    let flag = Arc::clone(&ran);
    registry.register_fn(UPDATE, move |_| {
        let flag = Arc::clone(&flag);
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
            Ok::<_, HandlerError>(Value::Null)
        }
    });
    let client = launch(registry);

    drop(client.invoke(Command::update()));

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !ran.load(Ordering::SeqCst) {
        assert!(tokio::time::Instant::now() < deadline, "backend work was cancelled");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[test]
fn disconnected_transport_resolves_to_bridge_unavailable() {
    let (requests, receiver) = crossbeam_channel::bounded(1);
    drop(receiver);
    let client = BridgeClient::from_sender(requests);

    let invocation = client
        .invoke(Command::update())
        .try_finish()
        .expect("failure is delivered immediately");
    let err = invocation.error().expect("failed");
    assert_eq!(err.kind(), BridgeErrorKind::BridgeUnavailable);
}

#[test]
fn full_queue_resolves_to_bridge_unavailable() {
    let (requests, _receiver) = crossbeam_channel::bounded(1);
    let client = BridgeClient::from_sender(requests);

    let first = client.invoke(Command::get_installed_addon_count());
    let second = client
        .invoke(Command::update())
        .try_finish()
        .expect("full queue fails immediately");

    assert!(first.try_finish().is_err(), "first request stays queued");
    let err = second.error().expect("failed");
    assert_eq!(err.kind(), BridgeErrorKind::BridgeUnavailable);
    assert_eq!(err.message(), "UI command queue is full; please retry");
}

#[tokio::test]
async fn queued_request_refused_by_a_dead_worker_is_reported() {
    let (requests, receiver) = crossbeam_channel::bounded(4);
    let client = BridgeClient::from_sender(requests);

    let queued = client.invoke(Command::get_installed_addon_count());
    let worker = std::thread::spawn(move || {
        crate::runtime::refuse_requests(&receiver, "command bridge runtime failed to start");
    });
    let late = client.invoke(Command::update());

    let (queued, late) = tokio::time::timeout(
        Duration::from_secs(5),
        async { tokio::join!(queued.wait(), late.wait()) },
    )
    .await
    .expect("refused requests resolve");
    for invocation in [&queued, &late] {
        let err = invocation.error().expect("failed");
        assert_eq!(err.kind(), BridgeErrorKind::BridgeUnavailable);
        assert_eq!(err.message(), "command bridge runtime failed to start");
    }

    drop(client);
    worker.join().expect("worker stops once clients are gone");
}

#[test]
fn shutdown_waits_for_in_flight_invocations() {
    let mut registry = CommandRegistry::new();
    registry.register_fn(UPDATE, |_| async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok::<_, HandlerError>(json!("finished"))
    });
    let (client, runtime) =
        BridgeRuntime::launch(registry, BridgeOptions::default()).expect("launch bridge");

    let pending = client.invoke(Command::update());
    drop(client);
    runtime.join();

    let invocation = pending.try_finish().expect("resolved before worker exit");
    assert_eq!(invocation.result(), Some(&json!("finished")));
}

#[test]
fn terminal_state_is_reached_only_once() {
    let mut invocation = Invocation::pending(
        shared::domain::InvocationId(9),
        Command::get_installed_addon_count(),
    );
    assert_eq!(invocation.state().label(), "pending");

    invocation.complete(Ok(json!(7))).expect("first transition");
    let err = invocation
        .complete(Err(shared::error::BridgeError::backend_execution("late")))
        .expect_err("second transition rejected");

    assert_eq!(
        err,
        InvocationError::AlreadyTerminal {
            id: shared::domain::InvocationId(9),
            state: "resolved",
        }
    );
    assert_eq!(invocation.result(), Some(&json!(7)));
}

#[test]
fn invocation_ids_are_unique_per_client() {
    let (requests, _receiver) = crossbeam_channel::bounded(8);
    let client = BridgeClient::from_sender(requests);
    let other = client.clone();

    let a = client.invoke(Command::update());
    let b = other.invoke(Command::update());
    let c = client.invoke(Command::get_installed_addon_count());

    assert!(a.id() < b.id() && b.id() < c.id());
}

#[test]
fn registry_lists_names_sorted() {
    let mut registry = count_registry(0);
    registry.register_fn(UPDATE, |_| async { Ok::<_, HandlerError>(Value::Null) });

    assert!(registry.contains(UPDATE));
    assert!(!registry.contains("search"));
    assert_eq!(registry.names(), vec![GET_INSTALLED_ADDON_COUNT, UPDATE]);
}
