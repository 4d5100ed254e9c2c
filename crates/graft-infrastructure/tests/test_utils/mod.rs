//! Test doubles for graft-infrastructure tests
//!
//! A factory table wired to counting fakes, plus managed resources that
//! record their lifecycle calls in a shared event log.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use graft_domain::error::{BoxError, Result};
use graft_domain::ports::{Lifecycle, Provided};
use graft_infrastructure::di::{Container, FactoryTable};
use graft_infrastructure::graph::EnvTable;
use serde_json::Value;

/// Key-value store fake reporting its configured size
#[derive(Debug)]
pub struct KvStore {
    pub size: usize,
    pub namespace: String,
}

/// Composite fake holding the store it was built from
#[derive(Debug)]
pub struct ChatAgent {
    pub store: Arc<KvStore>,
}

/// Workflow fake holding every agent it orchestrates
#[derive(Debug)]
pub struct Pipeline {
    pub agents: Vec<Arc<ChatAgent>>,
}

/// Ordered record of lifecycle calls, shared by every resource
#[derive(Debug, Default)]
pub struct EventLog(Mutex<Vec<String>>);

impl EventLog {
    pub fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.snapshot().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

/// Factory invocations per qualified name
#[derive(Debug, Default)]
pub struct CallCounter(Mutex<HashMap<String, usize>>);

impl CallCounter {
    pub fn hit(&self, name: &str) {
        *self.0.lock().unwrap().entry(name.to_string()).or_default() += 1;
    }

    pub fn get(&self, name: &str) -> usize {
        self.0.lock().unwrap().get(name).copied().unwrap_or(0)
    }
}

/// Managed resource recording `connect:<name>` / `disconnect:<name>`
pub struct Resource {
    pub name: String,
    events: Arc<EventLog>,
    fail_connect: bool,
    fail_disconnect: bool,
    disconnect_delay: Duration,
}

#[async_trait]
impl Lifecycle for Resource {
    async fn connect(&self) -> std::result::Result<(), BoxError> {
        if self.fail_connect {
            return Err(format!("{} refused connection", self.name).into());
        }
        self.events.push(format!("connect:{}", self.name));
        Ok(())
    }

    async fn disconnect(&self) -> std::result::Result<(), BoxError> {
        if !self.disconnect_delay.is_zero() {
            tokio::time::sleep(self.disconnect_delay).await;
        }
        if self.fail_disconnect {
            return Err(format!("{} failed to close", self.name).into());
        }
        self.events.push(format!("disconnect:{}", self.name));
        Ok(())
    }
}

/// Factory table wired to the fakes above
///
/// | constructor | builds |
/// |-------------|--------|
/// | `kv_factory` | [`KvStore`] from `size`, `namespace`, optional `delay_ms` |
/// | `chat_agent` | [`ChatAgent`] from `store_ref` |
/// | `pipeline` | [`Pipeline`] from `agents_ref` |
/// | `resource` | managed [`Resource`]; `fail_connect`, `fail_disconnect`, `disconnect_delay_ms` |
/// | `failing` | always fails |
pub struct Harness {
    pub factories: FactoryTable,
    pub calls: Arc<CallCounter>,
    pub events: Arc<EventLog>,
}

impl Harness {
    pub fn new() -> Self {
        let calls = Arc::new(CallCounter::default());
        let events = Arc::new(EventLog::default());
        let mut factories = FactoryTable::new();

        let counter = Arc::clone(&calls);
        factories.register_fn("kv_factory", move |ctx| {
            let counter = Arc::clone(&counter);
            async move {
                counter.hit(ctx.name().as_str());
                let delay: u64 = ctx.param_or("delay_ms", 0)?;
                if delay > 0 {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Ok::<_, BoxError>(Provided::new(KvStore {
                    size: ctx.param_or("size", 0)?,
                    namespace: ctx.param_or("namespace", String::new())?,
                }))
            }
        });

        let counter = Arc::clone(&calls);
        factories.register_fn("chat_agent", move |ctx| {
            let counter = Arc::clone(&counter);
            async move {
                counter.hit(ctx.name().as_str());
                Ok::<_, BoxError>(Provided::new(ChatAgent {
                    store: ctx.reference::<KvStore>("store")?,
                }))
            }
        });

        let counter = Arc::clone(&calls);
        factories.register_fn("pipeline", move |ctx| {
            let counter = Arc::clone(&counter);
            async move {
                counter.hit(ctx.name().as_str());
                Ok::<_, BoxError>(Provided::new(Pipeline {
                    agents: ctx.references::<ChatAgent>("agents")?,
                }))
            }
        });

        let counter = Arc::clone(&calls);
        let log = Arc::clone(&events);
        factories.register_fn("resource", move |ctx| {
            let counter = Arc::clone(&counter);
            let log = Arc::clone(&log);
            async move {
                counter.hit(ctx.name().as_str());
                Ok::<_, BoxError>(Provided::managed(Resource {
                    name: ctx.name().to_string(),
                    events: log,
                    fail_connect: ctx.param_or("fail_connect", false)?,
                    fail_disconnect: ctx.param_or("fail_disconnect", false)?,
                    disconnect_delay: Duration::from_millis(ctx.param_or("disconnect_delay_ms", 0)?),
                }))
            }
        });

        let counter = Arc::clone(&calls);
        factories.register_fn("failing", move |ctx| {
            let counter = Arc::clone(&counter);
            async move {
                counter.hit(ctx.name().as_str());
                Err::<Provided, BoxError>("boom".into())
            }
        });

        Self {
            factories,
            calls,
            events,
        }
    }

    /// Build a container over `config` with an empty environment
    pub async fn container(&self, config: Value) -> Result<Container> {
        self.container_with_env(config, EnvTable::empty()).await
    }

    /// Build a container over `config` with the given environment
    pub async fn container_with_env(&self, config: Value, env: EnvTable) -> Result<Container> {
        Container::builder(self.factories.clone())
            .with_env(env)
            .with_config(config)
            .build()
            .await
    }
}
