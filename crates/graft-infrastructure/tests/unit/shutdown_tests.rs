//! Tests for ordered, deadline-bounded shutdown

use std::time::Duration;

use graft_domain::error::{Error, ShutdownReason};
use graft_domain::value_objects::{ContainerState, Tier};
use serde_json::{Value, json};

use crate::test_utils::Harness;

fn layered_graph() -> Value {
    json!({
        "components": {
            "db": { "constructor": "resource", "eager": true }
        },
        "composites": {
            "repo": { "constructor": "resource", "params": { "db_ref": "db" } }
        },
        "workflows": {
            "sync": { "constructor": "resource", "params": { "repo_ref": "repo" } }
        }
    })
}

/// Shutdown disconnects in strict reverse build order, lazy objects included
#[tokio::test]
async fn test_shutdown_reverses_build_order() {
    let harness = Harness::new();
    let container = harness.container(layered_graph()).await.unwrap();
    container.get(Tier::Workflow, "sync").await.unwrap();

    container
        .shutdown_with_timeout(Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(container.state(), ContainerState::Closed);
    assert_eq!(
        harness.events.snapshot(),
        vec!["connect:db", "disconnect:sync", "disconnect:repo", "disconnect:db"]
    );
}

/// A second shutdown is a successful no-op
#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let harness = Harness::new();
    let container = harness.container(layered_graph()).await.unwrap();

    container
        .shutdown_with_timeout(Duration::from_secs(5))
        .await
        .unwrap();
    container
        .shutdown_with_timeout(Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(harness.events.count("disconnect:"), 1);
    assert_eq!(container.state(), ContainerState::Closed);
}

/// The container refuses requests once shut down
#[tokio::test]
async fn test_get_after_shutdown_is_not_ready() {
    let harness = Harness::new();
    let container = harness.container(layered_graph()).await.unwrap();
    container
        .shutdown_with_timeout(Duration::from_secs(5))
        .await
        .unwrap();

    let err = container.get(Tier::Component, "db").await.unwrap_err();
    assert!(matches!(
        err,
        Error::NotReady {
            state: ContainerState::Closed
        }
    ));
    assert!(err.is_unavailable());
}

/// Disconnect failures are aggregated and never stop the sweep
#[tokio::test]
async fn test_shutdown_aggregates_failures() {
    let harness = Harness::new();
    let container = harness
        .container(json!({
            "components": {
                "a": { "constructor": "resource", "eager": true },
                "b": { "constructor": "resource", "eager": true, "params": { "fail_disconnect": true } },
                "c": { "constructor": "resource", "eager": true, "params": { "fail_disconnect": true } }
            }
        }))
        .await
        .unwrap();

    let err = container
        .shutdown_with_timeout(Duration::from_secs(5))
        .await
        .unwrap_err();

    let Error::Shutdown { failures } = err else {
        panic!("expected a shutdown error");
    };
    let names: Vec<&str> = failures.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["c", "b"]);
    assert!(matches!(failures[0].reason, ShutdownReason::Failed(_)));
    assert_eq!(harness.events.count("disconnect:a"), 1);
    assert_eq!(container.state(), ContainerState::Closed);
}

/// A disconnect still running at the deadline times out; later ones are abandoned
#[tokio::test(start_paused = true)]
async fn test_shutdown_deadline_abandons_remaining() {
    let harness = Harness::new();
    let container = harness
        .container(json!({
            "components": {
                "a": { "constructor": "resource", "eager": true },
                "b": { "constructor": "resource", "eager": true, "params": { "disconnect_delay_ms": 10000 } }
            }
        }))
        .await
        .unwrap();

    let err = container
        .shutdown_with_timeout(Duration::from_millis(100))
        .await
        .unwrap_err();

    let Error::Shutdown { failures } = err else {
        panic!("expected a shutdown error");
    };
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].name, "b");
    assert_eq!(failures[0].reason, ShutdownReason::TimedOut);
    assert_eq!(failures[1].name, "a");
    assert_eq!(failures[1].reason, ShutdownReason::Abandoned);
    assert_eq!(harness.events.count("disconnect:"), 0);
}

/// Objects without lifecycle hooks are skipped silently
#[tokio::test]
async fn test_shutdown_skips_unmanaged_objects() {
    let harness = Harness::new();
    let container = harness
        .container(json!({ "components": { "store": { "constructor": "kv_factory", "eager": true } } }))
        .await
        .unwrap();

    assert_eq!(container.build_log().len(), 1);
    container
        .shutdown_with_timeout(Duration::from_secs(1))
        .await
        .unwrap();
}
