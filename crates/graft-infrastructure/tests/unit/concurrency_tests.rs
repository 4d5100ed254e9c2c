//! Tests for exactly-once construction under concurrent callers

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use graft_domain::value_objects::{BuildState, Instance, Tier};
use serde_json::json;

use crate::test_utils::{ChatAgent, Harness, KvStore};

const CALLERS: usize = 16;

/// K concurrent callers of an unbuilt name trigger exactly one factory call
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_build_once() {
    let harness = Harness::new();
    let container = Arc::new(
        harness
            .container(json!({
                "components": {
                    "store": { "constructor": "kv_factory", "params": { "size": 10, "delay_ms": 50 } }
                }
            }))
            .await
            .unwrap(),
    );

    let handles = (0..CALLERS).map(|_| {
        let container = Arc::clone(&container);
        tokio::spawn(async move { container.get(Tier::Component, "store").await })
    });
    let instances: Vec<Instance> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert_eq!(harness.calls.get("store"), 1);
    assert!(instances.iter().all(|i| i.same_object(&instances[0])));
    assert_eq!(container.build_log().len(), 1);
}

/// A dependency requested directly and through a dependent at the same time is built once
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dependency_and_dependent() {
    let harness = Harness::new();
    let container = Arc::new(
        harness
            .container(json!({
                "components": {
                    "store": {
                        "constructor": "kv_factory",
                        "instances": { "primary": { "params": { "size": 10, "delay_ms": 30 } } }
                    }
                },
                "composites": {
                    "agent": { "chat": { "constructor": "chat_agent", "params": { "store_ref": "store.primary" } } }
                }
            }))
            .await
            .unwrap(),
    );

    let direct = {
        let container = Arc::clone(&container);
        tokio::spawn(async move {
            container
                .resolve::<KvStore>(Tier::Component, "store.primary")
                .await
        })
    };
    let via_agent = {
        let container = Arc::clone(&container);
        tokio::spawn(async move {
            container
                .resolve::<ChatAgent>(Tier::Composite, "agent.chat")
                .await
        })
    };

    let store = direct.await.unwrap().unwrap();
    let agent = via_agent.await.unwrap().unwrap();

    assert!(std::ptr::eq(store.as_ref(), agent.store.as_ref()));
    assert_eq!(harness.calls.get("store.primary"), 1);
    assert_eq!(harness.calls.get("agent.chat"), 1);
}

/// Concurrent callers of a failing name all see the one cached failure
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_failure() {
    let harness = Harness::new();
    let container = Arc::new(
        harness
            .container(json!({ "components": { "flaky": { "constructor": "failing" } } }))
            .await
            .unwrap(),
    );

    let handles = (0..CALLERS).map(|_| {
        let container = Arc::clone(&container);
        tokio::spawn(async move { container.get(Tier::Component, "flaky").await })
    });
    let results = join_all(handles).await;

    assert!(results.into_iter().all(|joined| joined.unwrap().is_err()));
    assert_eq!(harness.calls.get("flaky"), 1);
}

fn slow_store() -> serde_json::Value {
    json!({
        "components": {
            "store": { "constructor": "kv_factory", "params": { "size": 10, "delay_ms": 100 } }
        }
    })
}

/// A caller that gives up mid-build does not make the next caller run the factory again
#[tokio::test(start_paused = true)]
async fn test_cancelled_caller_does_not_restart_build() {
    let harness = Harness::new();
    let container = harness.container(slow_store()).await.unwrap();

    let first = tokio::time::timeout(
        Duration::from_millis(20),
        container.get(Tier::Component, "store"),
    )
    .await;
    assert!(first.is_err());
    assert_eq!(
        container.describe().entry("store").map(|e| e.state),
        Some(BuildState::Building)
    );

    tokio::time::sleep(Duration::from_millis(5)).await;
    let store = container
        .resolve::<KvStore>(Tier::Component, "store")
        .await
        .unwrap();

    assert_eq!(store.size, 10);
    assert_eq!(harness.calls.get("store"), 1);
    assert_eq!(container.build_log().len(), 1);
}

/// A build keeps running after every caller has been dropped
#[tokio::test(start_paused = true)]
async fn test_build_outlives_dropped_callers() {
    let harness = Harness::new();
    let container = harness.container(slow_store()).await.unwrap();

    let dropped = tokio::time::timeout(
        Duration::from_millis(20),
        container.get(Tier::Component, "store"),
    )
    .await;
    assert!(dropped.is_err());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(
        container.describe().entry("store").map(|e| e.state),
        Some(BuildState::Built)
    );
    assert_eq!(container.build_log().len(), 1);

    container.get(Tier::Component, "store").await.unwrap();
    assert_eq!(harness.calls.get("store"), 1);
}
