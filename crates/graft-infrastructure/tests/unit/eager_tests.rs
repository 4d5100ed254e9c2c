//! Tests for the eager startup pass and its rollback

use graft_domain::error::Error;
use graft_domain::value_objects::{BuildState, ContainerState};
use serde_json::json;

use crate::test_utils::Harness;

/// Eager entries are built and connected in dependency order; lazy ones wait
#[tokio::test]
async fn test_eager_entries_connect_in_dependency_order() {
    let harness = Harness::new();
    let container = harness
        .container(json!({
            "components": {
                "db": { "constructor": "resource", "eager": true },
                "cache": { "constructor": "resource" }
            },
            "composites": {
                "repo": { "constructor": "resource", "eager": true, "params": { "db_ref": "db" } }
            }
        }))
        .await
        .unwrap();

    assert_eq!(container.state(), ContainerState::Ready);
    assert_eq!(harness.events.snapshot(), vec!["connect:db", "connect:repo"]);

    let description = container.describe();
    assert_eq!(description.entry("cache").unwrap().state, BuildState::Unbuilt);
    assert_eq!(description.entry("repo").unwrap().state, BuildState::Built);
    assert_eq!(harness.calls.get("cache"), 0);
}

/// An instance can be eager while its family default is lazy
#[tokio::test]
async fn test_instance_eager_override() {
    let harness = Harness::new();
    harness
        .container(json!({
            "components": {
                "pool": {
                    "constructor": "resource",
                    "instances": { "read": {}, "write": { "eager": true } }
                }
            }
        }))
        .await
        .unwrap();

    assert_eq!(harness.events.snapshot(), vec!["connect:pool.write"]);
}

/// A failed eager connect disconnects everything connected so far, newest first
#[tokio::test]
async fn test_connect_failure_rolls_back_in_reverse() {
    let harness = Harness::new();
    let err = harness
        .container(json!({
            "components": {
                "a": { "constructor": "resource", "eager": true },
                "b": { "constructor": "resource", "eager": true, "params": { "prev_ref": "a" } },
                "c": {
                    "constructor": "resource",
                    "eager": true,
                    "params": { "prev_ref": "b", "fail_connect": true }
                }
            }
        }))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Connect { ref name, .. } if name == "c"));
    assert_eq!(
        harness.events.snapshot(),
        vec!["connect:a", "connect:b", "disconnect:b", "disconnect:a"]
    );
}

/// A failed eager build aborts startup with the construction error
#[tokio::test]
async fn test_build_failure_rolls_back() {
    let harness = Harness::new();
    let err = harness
        .container(json!({
            "components": {
                "a": { "constructor": "resource", "eager": true },
                "z": { "constructor": "failing", "eager": true }
            }
        }))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Construction { ref name, .. } if name == "z"));
    assert_eq!(harness.events.snapshot(), vec!["connect:a", "disconnect:a"]);
}

/// Rollback keeps going when a disconnect fails and still returns the first failure
#[tokio::test]
async fn test_rollback_survives_disconnect_failure() {
    let harness = Harness::new();
    let err = harness
        .container(json!({
            "components": {
                "a": { "constructor": "resource", "eager": true },
                "b": { "constructor": "resource", "eager": true, "params": { "fail_disconnect": true } },
                "c": { "constructor": "resource", "eager": true, "params": { "fail_connect": true } }
            }
        }))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Connect { .. }));
    assert_eq!(
        harness.events.snapshot(),
        vec!["connect:a", "connect:b", "disconnect:a"]
    );
}
