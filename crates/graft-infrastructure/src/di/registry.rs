//! Tier Registry
//!
//! One registry per tier owns the build-and-cache algorithm for the names
//! declared in that tier. Composite and workflow registries hold the
//! registry below them so references can cascade downward.
//!
//! ```text
//! workflows ──lower──▶ composites ──lower──▶ components
//!     │                    │                     │
//!     └──── get(name) ─────┴── resolve refs ─────┘
//! ```
//!
//! The first `get` of a name spawns its construction as a tokio task and
//! stores a shared handle to it in the entry. Every caller, including the
//! one that started it, awaits that handle: dropping a caller never cancels
//! or restarts the build, so each factory runs at most once. The outcome,
//! failure included, stays cached for the life of the container.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use futures::FutureExt;
use futures::future::{self, BoxFuture, Shared};
use graft_domain::BoxError;
use graft_domain::error::{Error, Result};
use graft_domain::ports::{BuildContext, Factory, ResolvedReference};
use graft_domain::value_objects::{BuildState, Instance, QualifiedName, Tier};
use tracing::{debug, info, warn};

use super::build_log::BuildLog;
use super::describe::EntryDescription;
use crate::graph::{ConfigNode, DependencyGraph, ReferenceShape, ResolvedParam};

/// Configured names currently being resolved by one caller
type ResolutionChain = Vec<QualifiedName>;

/// Handle to a spawned construction, awaited by every caller
type PendingBuild = Shared<BoxFuture<'static, Result<Instance>>>;

/// A configured name with its factory and cached outcome
pub(crate) struct Entry {
    node: ConfigNode,
    params: Vec<ResolvedParam>,
    factory: Arc<dyn Factory>,
    state: AtomicU8,
    build: OnceLock<PendingBuild>,
}

impl Entry {
    pub(crate) fn new(node: ConfigNode, params: Vec<ResolvedParam>, factory: Arc<dyn Factory>) -> Self {
        Self {
            node,
            params,
            factory,
            state: AtomicU8::new(BuildState::Unbuilt.as_u8()),
            build: OnceLock::new(),
        }
    }

    fn state(&self) -> BuildState {
        BuildState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: BuildState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }
}

/// Build-and-cache registry for one tier
pub struct Registry {
    tier: Tier,
    entries: HashMap<QualifiedName, Arc<Entry>>,
    lower: Option<Arc<Registry>>,
    graph: Arc<DependencyGraph>,
    build_log: Arc<BuildLog>,
    this: Weak<Registry>,
}

impl Registry {
    pub(crate) fn new(
        tier: Tier,
        entries: Vec<Entry>,
        lower: Option<Arc<Registry>>,
        graph: Arc<DependencyGraph>,
        build_log: Arc<BuildLog>,
    ) -> Arc<Self> {
        let entries = entries
            .into_iter()
            .map(|entry| (entry.node.name().clone(), Arc::new(entry)))
            .collect();
        Arc::new_cyclic(|this| Self {
            tier,
            entries,
            lower,
            graph,
            build_log,
            this: this.clone(),
        })
    }

    /// Tier served by this registry
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Whether `name` is declared in this tier
    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of names declared in this tier
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this tier declares nothing
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `name` is declared eager in this tier
    pub fn is_eager(&self, name: &QualifiedName) -> bool {
        self.entries.get(name).is_some_and(|entry| entry.node.is_eager())
    }

    /// Current build state of `name`
    pub fn state(&self, name: &QualifiedName) -> Option<BuildState> {
        self.entries.get(name).map(|entry| entry.state())
    }

    /// This registry or the lower one serving `tier`; never a higher one
    pub fn registry_for(&self, tier: Tier) -> Option<&Registry> {
        if tier == self.tier {
            Some(self)
        } else if tier < self.tier {
            self.lower.as_deref().and_then(|lower| lower.registry_for(tier))
        } else {
            None
        }
    }

    /// Object for `name`, building it and its references on first use
    pub async fn get(&self, name: &QualifiedName) -> Result<Instance> {
        self.resolve(name, ResolutionChain::new()).await
    }

    /// Build several names of this tier, dependencies first
    pub async fn get_all(&self, names: &[QualifiedName]) -> Result<Vec<Instance>> {
        if let Some(missing) = names.iter().find(|name| !self.contains(name)) {
            return Err(Error::not_found(self.tier, missing.as_str()));
        }

        let mut built = HashMap::with_capacity(names.len());
        for name in self.graph.build_order_for(names) {
            let Some(registry) = self.registry_for(self.tier_of(&name)) else {
                continue;
            };
            let instance = registry.get(&name).await?;
            built.insert(name, instance);
        }

        Ok(names
            .iter()
            .filter_map(|name| built.get(name).cloned())
            .collect())
    }

    /// Name, constructor, eager flag and build state of every entry, sorted by name
    pub fn describe(&self) -> Vec<EntryDescription> {
        let mut entries: Vec<EntryDescription> = self
            .entries
            .values()
            .map(|entry| EntryDescription {
                name: entry.node.name().to_string(),
                tier: self.tier,
                constructor: entry.node.constructor().to_string(),
                eager: entry.node.is_eager(),
                family: entry.node.family().map(ToString::to_string),
                state: entry.state(),
                dependencies: entry
                    .params
                    .iter()
                    .flat_map(|param| param.targets().iter().map(|(_, t)| t.to_string()))
                    .collect(),
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    fn tier_of(&self, name: &QualifiedName) -> Tier {
        Tier::ALL
            .into_iter()
            .find(|tier| {
                self.registry_for(*tier)
                    .is_some_and(|registry| registry.contains(name))
            })
            .unwrap_or(self.tier)
    }

    fn resolve<'a>(
        &'a self,
        name: &'a QualifiedName,
        chain: ResolutionChain,
    ) -> BoxFuture<'a, Result<Instance>> {
        Box::pin(async move {
            let entry = self
                .entries
                .get(name)
                .ok_or_else(|| Error::not_found(self.tier, name.as_str()))?;

            if chain.contains(name) {
                let chain = chain.iter().chain(std::iter::once(name)).map(ToString::to_string);
                return Err(Error::circular(chain));
            }

            let build = entry
                .build
                .get_or_init(|| self.spawn_build(entry, chain))
                .clone();
            if let Some(outcome) = build.peek() {
                debug!(name = %name, tier = %self.tier, "Cache hit");
                return outcome.clone();
            }
            build.await
        })
    }

    /// Start constructing `entry` on its own task
    fn spawn_build(&self, entry: &Arc<Entry>, chain: ResolutionChain) -> PendingBuild {
        let Some(registry) = self.this.upgrade() else {
            let err = Error::construction(
                entry.node.name().as_str(),
                BoxError::from("registry dropped before the build started"),
            );
            return future::ready(Err(err)).boxed().shared();
        };

        entry.set_state(BuildState::Building);
        let task = tokio::spawn({
            let entry = Arc::clone(entry);
            async move { registry.construct(&entry, chain).await }
        });

        let entry = Arc::clone(entry);
        async move {
            task.await.unwrap_or_else(|e| {
                entry.set_state(BuildState::Failed);
                warn!(name = %entry.node.name(), error = %e, "Build task aborted");
                Err(Error::construction(entry.node.name().as_str(), Box::new(e)))
            })
        }
        .boxed()
        .shared()
    }

    async fn construct(&self, entry: &Entry, mut chain: ResolutionChain) -> Result<Instance> {
        let name = entry.node.name();
        chain.push(name.clone());

        match self.assemble(entry, &chain).await {
            Ok(instance) => {
                entry.set_state(BuildState::Built);
                let sequence = self.build_log.record(instance.clone());
                info!(
                    name = %name,
                    tier = %self.tier,
                    constructor = entry.node.constructor(),
                    sequence,
                    "Built"
                );
                Ok(instance)
            }
            Err(e) => {
                entry.set_state(BuildState::Failed);
                warn!(name = %name, tier = %self.tier, error = %e, "Build failed");
                Err(e)
            }
        }
    }

    async fn assemble(&self, entry: &Entry, chain: &ResolutionChain) -> Result<Instance> {
        let name = entry.node.name();
        let mut references = HashMap::with_capacity(entry.params.len());

        for param in &entry.params {
            let mut resolved = Vec::with_capacity(param.targets().len());
            for (tier, target) in param.targets() {
                let registry = self
                    .registry_for(*tier)
                    .ok_or_else(|| Error::unresolved(target.as_str(), name.as_str()))?;
                let instance = registry
                    .resolve(target, chain.clone())
                    .await
                    .map_err(|e| Error::dependency(name.as_str(), e))?;
                resolved.push(instance);
            }
            let reference = match param.shape() {
                ReferenceShape::Many => ResolvedReference::Many(resolved),
                ReferenceShape::One => match resolved.pop() {
                    Some(instance) => ResolvedReference::One(instance),
                    None => continue,
                },
            };
            references.insert(param.param().to_string(), reference);
        }

        debug!(
            name = %name,
            tier = %self.tier,
            constructor = entry.node.constructor(),
            "Invoking factory"
        );
        let ctx = BuildContext::new(
            name.clone(),
            self.tier,
            entry.node.params().clone(),
            references,
        );
        let provided = entry
            .factory
            .build(ctx)
            .await
            .map_err(|e| Error::construction(name.as_str(), e))?;
        Ok(Instance::new(name.clone(), self.tier, provided))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("tier", &self.tier)
            .field("entries", &self.entries.len())
            .field("lower", &self.lower.as_ref().map(|lower| lower.tier))
            .finish()
    }
}
