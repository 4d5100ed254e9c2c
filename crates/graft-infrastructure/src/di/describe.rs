//! Read-only container introspection

use graft_domain::value_objects::{BuildState, ContainerState, Tier};
use serde::Serialize;

/// One configured name and its current build state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryDescription {
    /// Qualified name
    pub name: String,
    /// Declaring tier
    pub tier: Tier,
    /// Constructor identifier
    pub constructor: String,
    /// Built at startup
    pub eager: bool,
    /// Family the entry was declared in, for named instances
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    /// Current build state
    pub state: BuildState,
    /// Qualified names this entry references
    pub dependencies: Vec<String>,
}

/// Every entry of one tier, sorted by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierDescription {
    /// The tier
    pub tier: Tier,
    /// Its entries
    pub entries: Vec<EntryDescription>,
}

/// Snapshot of a whole container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerDescription {
    /// Container state when the snapshot was taken
    pub state: ContainerState,
    /// Tiers, lowest first
    pub tiers: Vec<TierDescription>,
}

impl ContainerDescription {
    /// Entry by qualified name, in any tier
    pub fn entry(&self, name: &str) -> Option<&EntryDescription> {
        self.entries().find(|entry| entry.name == name)
    }

    /// Every entry, tier by tier
    pub fn entries(&self) -> impl Iterator<Item = &EntryDescription> {
        self.tiers.iter().flat_map(|tier| tier.entries.iter())
    }

    /// Number of entries currently in `state`
    pub fn count(&self, state: BuildState) -> usize {
        self.entries().filter(|entry| entry.state == state).count()
    }
}
