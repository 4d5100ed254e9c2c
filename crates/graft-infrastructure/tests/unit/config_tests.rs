//! Tests for figment-based configuration loading

use std::fs;
use std::time::Duration;

use graft_domain::error::Error;
use graft_domain::value_objects::Tier;
use graft_infrastructure::config::ConfigLoader;
use graft_infrastructure::di::Container;
use tempfile::TempDir;

use crate::test_utils::{ChatAgent, Harness};

const GRAFT_TOML: &str = r#"
[logging]
level = "debug"

[container]
shutdown_timeout_secs = 5

[components.store]
constructor = "kv_factory"
params = { namespace = "app" }

[components.store.instances.primary]
params = { size = 10 }

[components.store.instances.replica]
params = { size = 20 }
eager = true

[composites.agent.chat]
constructor = "chat_agent"
params = { store_ref = "store.primary" }
"#;

/// A TOML file feeds both runtime settings and the graph sections
#[test]
fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graft.toml");
    fs::write(&path, GRAFT_TOML).unwrap();

    let config = ConfigLoader::new().with_config_path(&path).load().unwrap();

    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.container.shutdown_timeout(), Duration::from_secs(5));
    assert!(config.components.contains_key("store"));
    assert!(config.composites.contains_key("agent"));
    assert!(config.workflows.is_empty());

    let graph = config.graph_value();
    assert_eq!(
        graph["components"]["store"]["instances"]["primary"]["params"]["size"],
        10
    );
    assert!(graph.get("workflows").is_none());
}

/// Defaults apply when a section is omitted
#[test]
fn test_defaults() {
    let config = ConfigLoader::new().load_from_str("").unwrap();
    assert_eq!(config.logging.level, "info");
    assert!(!config.logging.json_format);
    assert_eq!(config.container.shutdown_timeout_secs, 30);
    assert!(config.components.is_empty());
}

/// An explicit path that does not exist is rejected
#[test]
fn test_missing_explicit_file() {
    let dir = TempDir::new().unwrap();
    let err = ConfigLoader::new()
        .with_config_path(dir.path().join("absent.toml"))
        .load()
        .unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

/// Invalid runtime settings fail validation
#[test]
fn test_validation() {
    let loader = ConfigLoader::new();
    assert!(loader.load_from_str("[logging]\nlevel = \"loud\"\n").is_err());
    assert!(
        loader
            .load_from_str("[container]\nshutdown_timeout_secs = 0\n")
            .is_err()
    );
}

/// A loaded configuration builds a working container
#[tokio::test]
async fn test_container_from_app_config() {
    let config = ConfigLoader::new().load_from_str(GRAFT_TOML).unwrap();
    let harness = Harness::new();

    let container = Container::builder(harness.factories.clone())
        .with_app_config(&config)
        .unwrap()
        .build()
        .await
        .unwrap();

    assert_eq!(container.shutdown_timeout(), Duration::from_secs(5));
    assert_eq!(harness.calls.get("store.replica"), 1);

    let agent = container
        .resolve::<ChatAgent>(Tier::Composite, "agent.chat")
        .await
        .unwrap();
    assert_eq!(agent.store.size, 10);
}
