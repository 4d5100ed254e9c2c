//! Container
//!
//! Host-owned composition root. A container is built once from
//! configuration plus a [`FactoryTable`], serves `get` requests while
//! [`ContainerState::Ready`], and releases managed resources on shutdown.
//!
//! ## Build sequence
//!
//! ```text
//! raw config ─▶ ConfigTree::load ─▶ constructor check ─▶ DependencyGraph::build
//!                                                               │
//!             components ◀─lower── composites ◀─lower── workflows
//!                                                               │
//!                         eager pass (dependency order, connect) ◀┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let container = Container::builder(factories)
//!     .with_app_config(&config)?
//!     .build()
//!     .await?;
//!
//! let store: Arc<KvStore> = container.resolve(Tier::Component, "store.primary").await?;
//!
//! container.shutdown_with_timeout(Duration::from_secs(5)).await?;
//! ```

use std::any::{Any, type_name};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use graft_domain::error::{Error, Result};
use graft_domain::value_objects::{ContainerState, Instance, QualifiedName, Tier};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{info, warn};

use super::build_log::{BuildLog, BuildRecord};
use super::describe::{ContainerDescription, TierDescription};
use super::factory_table::FactoryTable;
use super::registry::{Entry, Registry};
use super::shutdown::disconnect_all;
use crate::config::AppConfig;
use crate::constants::DEFAULT_SHUTDOWN_TIMEOUT_SECS;
use crate::graph::{ConfigTree, DependencyGraph, EnvTable};

// ============================================================================
// Builder
// ============================================================================

enum GraphSource {
    Raw(Value),
    Tree(ConfigTree),
}

/// Assembles a [`Container`] from configuration and registered factories
pub struct ContainerBuilder {
    factories: FactoryTable,
    env: Option<EnvTable>,
    source: Option<GraphSource>,
    shutdown_timeout: Duration,
}

impl ContainerBuilder {
    fn new(factories: FactoryTable) -> Self {
        Self {
            factories,
            env: None,
            source: None,
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }

    /// Variables for `${VAR}` placeholders; defaults to the process environment
    #[must_use]
    pub fn with_env(mut self, env: EnvTable) -> Self {
        self.env = Some(env);
        self
    }

    /// Raw `components` / `composites` / `workflows` mapping
    #[must_use]
    pub fn with_config(mut self, raw: Value) -> Self {
        self.source = Some(GraphSource::Raw(raw));
        self
    }

    /// An already loaded configuration tree
    #[must_use]
    pub fn with_tree(mut self, tree: ConfigTree) -> Self {
        self.source = Some(GraphSource::Tree(tree));
        self
    }

    /// Graph sections, environment sources and shutdown timeout from `config`
    pub fn with_app_config(mut self, config: &AppConfig) -> Result<Self> {
        self.env = Some(config.env_table()?);
        self.shutdown_timeout = config.container.shutdown_timeout();
        Ok(self.with_config(config.graph_value()))
    }

    /// Budget for rollback disconnects, also reported by [`Container::shutdown_timeout`]
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Validate the graph, construct the registries and run the eager pass
    ///
    /// # Errors
    ///
    /// Configuration errors ([`Error::Config`], [`Error::MissingEnvironmentVariable`],
    /// [`Error::UnknownConstructor`], [`Error::UnresolvedReference`],
    /// [`Error::CircularReference`]) before anything is built. If an eager
    /// object fails to build or connect, every object connected so far is
    /// disconnected in reverse order and the first failure is returned.
    pub async fn build(self) -> Result<Container> {
        let env = self.env.unwrap_or_else(EnvTable::from_process);
        let tree = match self.source {
            Some(GraphSource::Tree(tree)) => tree,
            Some(GraphSource::Raw(raw)) => ConfigTree::load(&raw, &env)?,
            None => ConfigTree::default(),
        };

        for node in tree.nodes() {
            if !self.factories.contains(node.constructor()) {
                return Err(Error::unknown_constructor(
                    node.constructor(),
                    node.name().as_str(),
                ));
            }
        }

        let graph = Arc::new(DependencyGraph::build(&tree)?);
        let build_log = Arc::new(BuildLog::new());

        let mut lower: Option<Arc<Registry>> = None;
        for tier in Tier::ALL {
            let entries = tree
                .tier_nodes(tier)
                .filter_map(|node| {
                    let factory = self.factories.get(node.constructor())?;
                    let params = graph.params(node.name()).to_vec();
                    Some(Entry::new(node.clone(), params, factory))
                })
                .collect();
            lower = Some(Registry::new(
                tier,
                entries,
                lower.take(),
                Arc::clone(&graph),
                Arc::clone(&build_log),
            ));
        }
        let top = lower.ok_or_else(|| Error::config("No registries were constructed"))?;

        let container = Container {
            state: AtomicU8::new(ContainerState::Unbuilt.as_u8()),
            top,
            graph,
            build_log,
            env,
            shutdown_timeout: self.shutdown_timeout,
        };

        info!(
            nodes = tree.len(),
            factories = self.factories.len(),
            "Container graph validated"
        );
        container.start().await?;
        Ok(container)
    }
}

// ============================================================================
// Container
// ============================================================================

/// Lazily built, three-tier object graph
///
/// `Send + Sync`; share it behind an `Arc` between request handlers.
pub struct Container {
    state: AtomicU8,
    top: Arc<Registry>,
    graph: Arc<DependencyGraph>,
    build_log: Arc<BuildLog>,
    env: EnvTable,
    shutdown_timeout: Duration,
}

impl Container {
    /// Start building a container from registered factories
    pub fn builder(factories: FactoryTable) -> ContainerBuilder {
        ContainerBuilder::new(factories)
    }

    /// Current lifecycle state
    pub fn state(&self) -> ContainerState {
        ContainerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Variables used for placeholder interpolation
    pub fn env(&self) -> &EnvTable {
        &self.env
    }

    /// Configured shutdown budget
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Registry serving `tier`
    pub fn registry(&self, tier: Tier) -> Option<&Registry> {
        self.top.registry_for(tier)
    }

    /// Object named `name` in `tier`, built on first use
    ///
    /// `name` may use `/` separators (`store/primary`).
    ///
    /// # Errors
    ///
    /// [`Error::NotReady`] unless the container is ready, [`Error::NotFound`]
    /// if `tier` declares no such name, or the cached construction failure.
    pub async fn get(&self, tier: Tier, name: &str) -> Result<Instance> {
        self.ensure_ready()?;
        let registry = self
            .registry(tier)
            .ok_or_else(|| Error::not_found(tier, name))?;
        let qualified = QualifiedName::from_path(name).map_err(|_| Error::not_found(tier, name))?;
        registry.get(&qualified).await
    }

    /// Object named `name` in `tier`, downcast to `T`
    pub async fn resolve<T: Any + Send + Sync>(&self, tier: Tier, name: &str) -> Result<Arc<T>> {
        let instance = self.get(tier, name).await?;
        instance.downcast::<T>().ok_or_else(|| Error::TypeMismatch {
            name: name.to_string(),
            expected: type_name::<T>(),
        })
    }

    /// Tier declaring `name`, if any
    pub fn lookup(&self, name: &str) -> Option<Tier> {
        let qualified = QualifiedName::from_path(name).ok()?;
        Tier::ALL.into_iter().find(|tier| {
            self.registry(*tier)
                .is_some_and(|registry| registry.contains(&qualified))
        })
    }

    /// Every configured name per tier with its current build state
    pub fn describe(&self) -> ContainerDescription {
        ContainerDescription {
            state: self.state(),
            tiers: Tier::ALL
                .into_iter()
                .filter_map(|tier| self.registry(tier))
                .map(|registry| TierDescription {
                    tier: registry.tier(),
                    entries: registry.describe(),
                })
                .collect(),
        }
    }

    /// Completed constructions, in build order
    pub fn build_log(&self) -> Vec<BuildRecord> {
        self.build_log.snapshot()
    }

    /// Dependency-first order of every configured name
    pub fn build_order(&self) -> &[QualifiedName] {
        self.graph.build_order()
    }

    /// Release managed resources in strict reverse build order
    ///
    /// Keeps going past failures. Resources not closed by `deadline` are
    /// reported as timed out (disconnect in flight) or abandoned (never
    /// attempted). Calling it again, or on a closed container, is a no-op.
    ///
    /// # Errors
    ///
    /// [`Error::Shutdown`] listing every resource that did not close cleanly.
    pub async fn shutdown(&self, deadline: Instant) -> Result<()> {
        if self
            .state
            .compare_exchange(
                ContainerState::Ready.as_u8(),
                ContainerState::ShuttingDown.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            info!(state = %self.state(), "Shutdown requested again, nothing to do");
            return Ok(());
        }

        let records = self.build_log.snapshot();
        info!(built = records.len(), "Shutting down container");
        let failures = disconnect_all(records.iter().rev().map(|r| &r.instance), deadline).await;
        self.set_state(ContainerState::Closed);

        if failures.is_empty() {
            info!("Container closed");
            Ok(())
        } else {
            warn!(failures = failures.len(), "Container closed with failures");
            Err(Error::Shutdown { failures })
        }
    }

    /// [`Container::shutdown`] with a deadline `timeout` from now
    ///
    /// # Errors
    ///
    /// Same as [`Container::shutdown`].
    pub async fn shutdown_with_timeout(&self, timeout: Duration) -> Result<()> {
        self.shutdown(Instant::now() + timeout).await
    }

    async fn start(&self) -> Result<()> {
        let mut connected: Vec<Instance> = Vec::new();
        match self.eager_pass(&mut connected).await {
            Ok(()) => {
                self.set_state(ContainerState::Ready);
                info!(
                    eager = connected.len(),
                    built = self.build_log.len(),
                    "Container ready"
                );
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, connected = connected.len(), "Eager build failed, rolling back");
                let deadline = Instant::now() + self.shutdown_timeout;
                let failures = disconnect_all(connected.iter().rev(), deadline).await;
                for failure in &failures {
                    warn!(failure = %failure, "Rollback disconnect did not complete");
                }
                self.set_state(ContainerState::Closed);
                Err(e)
            }
        }
    }

    async fn eager_pass(&self, connected: &mut Vec<Instance>) -> Result<()> {
        for name in self.graph.build_order() {
            let Some(registry) = Tier::ALL
                .into_iter()
                .filter_map(|tier| self.registry(tier))
                .find(|registry| registry.contains(name))
            else {
                continue;
            };
            if !registry.is_eager(name) {
                continue;
            }

            let instance = registry.get(name).await?;
            if let Some(lifecycle) = instance.lifecycle() {
                lifecycle
                    .connect()
                    .await
                    .map_err(|e| Error::connect(name.as_str(), e))?;
                info!(name = %name, tier = %registry.tier(), "Connected");
                connected.push(instance);
            }
        }
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state() {
            ContainerState::Ready => Ok(()),
            state => Err(Error::NotReady { state }),
        }
    }

    fn set_state(&self, state: ContainerState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("state", &self.state())
            .field("built", &self.build_log.len())
            .field("registry", &self.top)
            .finish()
    }
}
