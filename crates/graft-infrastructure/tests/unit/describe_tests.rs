//! Tests for container introspection

use std::time::Duration;

use graft_domain::value_objects::{BuildState, ContainerState, Tier};
use serde_json::json;

use crate::test_utils::Harness;

/// Every configured name is listed per tier with its build state
#[tokio::test]
async fn test_describe_tracks_build_states() {
    let harness = Harness::new();
    let container = harness
        .container(json!({
            "components": {
                "store": {
                    "constructor": "kv_factory",
                    "instances": { "primary": {}, "replica": { "eager": true } }
                },
                "flaky": { "constructor": "failing" }
            },
            "composites": {
                "agent": { "constructor": "chat_agent", "params": { "store_ref": "store.primary" } }
            }
        }))
        .await
        .unwrap();

    let before = container.describe();
    assert_eq!(before.state, ContainerState::Ready);
    assert_eq!(before.tiers.len(), 3);
    assert_eq!(before.entry("store.replica").unwrap().state, BuildState::Built);
    assert_eq!(before.entry("store.primary").unwrap().state, BuildState::Unbuilt);
    assert_eq!(
        before.entry("store.primary").unwrap().family.as_deref(),
        Some("store")
    );
    assert_eq!(
        before.entry("agent").unwrap().dependencies,
        vec!["store.primary".to_string()]
    );

    container.get(Tier::Composite, "agent").await.unwrap();
    container.get(Tier::Component, "flaky").await.unwrap_err();

    let after = container.describe();
    assert_eq!(after.count(BuildState::Built), 3);
    assert_eq!(after.count(BuildState::Failed), 1);
    assert_eq!(after.count(BuildState::Unbuilt), 0);
}

/// Entries within a tier are sorted by name
#[tokio::test]
async fn test_describe_sorted_per_tier() {
    let harness = Harness::new();
    let container = harness
        .container(json!({
            "components": {
                "zeta": { "constructor": "kv_factory" },
                "alpha": { "constructor": "kv_factory" },
                "mid": { "nested": { "constructor": "kv_factory" } }
            }
        }))
        .await
        .unwrap();

    let description = container.describe();
    let components = &description.tiers[0];
    assert_eq!(components.tier, Tier::Component);
    let names: Vec<&str> = components.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "mid.nested", "zeta"]);
}

/// The description serializes for external introspection
#[tokio::test]
async fn test_describe_serializes() {
    let harness = Harness::new();
    let container = harness
        .container(json!({ "components": { "store": { "constructor": "kv_factory" } } }))
        .await
        .unwrap();
    container
        .shutdown_with_timeout(Duration::from_secs(1))
        .await
        .unwrap();

    let value = serde_json::to_value(container.describe()).unwrap();
    assert_eq!(value["state"], "Closed");
    assert_eq!(value["tiers"][0]["tier"], "component");
    assert_eq!(value["tiers"][0]["entries"][0]["name"], "store");
    assert_eq!(value["tiers"][0]["entries"][0]["state"], "Unbuilt");
}
