//! Configuration tree
//!
//! Turns the raw `components` / `composites` / `workflows` mapping into a
//! flat, immutable set of [`ConfigNode`]s keyed by qualified name.
//!
//! ```toml
//! [components.store]
//! constructor = "kv_factory"
//! params = { namespace = "app" }
//!
//! [components.store.instances.primary]
//! params = { size = 10 }
//!
//! [components.store.instances.replica]
//! params = { size = 20 }
//! eager = true
//!
//! [composites.agent.chat]
//! constructor = "chat_agent"
//! params = { store_ref = "store.primary", api_key = "${GROQ_API_KEY}" }
//! ```
//!
//! Any table holding a `constructor` key is an entry; the tables above it
//! are namespaces forming the dot path. An entry with `instances` is a
//! family: each instance becomes its own node (`store.primary`,
//! `store.replica`) with the family params overridden by its own.

use std::collections::HashMap;
use std::sync::LazyLock;

use graft_domain::constants::{CONSTRUCTOR_KEY, EAGER_KEY, INSTANCES_KEY, PARAMS_KEY};
use graft_domain::error::{Error, Result};
use graft_domain::value_objects::{QualifiedName, Tier};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::env::EnvTable;
use super::reference::{ReferenceParam, ReferenceToken, is_reference};

static CONSTRUCTOR_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.:-]+$").expect("constructor pattern is valid"));

const ENTRY_KEYS: [&str; 4] = [CONSTRUCTOR_KEY, PARAMS_KEY, EAGER_KEY, INSTANCES_KEY];
const INSTANCE_KEYS: [&str; 2] = [PARAMS_KEY, EAGER_KEY];

/// One configured object
#[derive(Debug, Clone)]
pub struct ConfigNode {
    name: QualifiedName,
    tier: Tier,
    constructor: String,
    params: Map<String, Value>,
    references: Vec<ReferenceParam>,
    eager: bool,
    family: Option<QualifiedName>,
}

impl ConfigNode {
    /// Qualified name, unique across all tiers
    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    /// Tier the node was declared in
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Registered constructor identifier
    pub fn constructor(&self) -> &str {
        &self.constructor
    }

    /// Interpolated literal parameters
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Reference-typed parameters
    pub fn references(&self) -> &[ReferenceParam] {
        &self.references
    }

    /// Whether the node is built at container startup
    pub fn is_eager(&self) -> bool {
        self.eager
    }

    /// Family the node was declared in, for named instance overrides
    pub fn family(&self) -> Option<&QualifiedName> {
        self.family.as_ref()
    }

    /// Serializable overview of the node
    pub fn summary(&self) -> NodeSummary {
        NodeSummary {
            name: self.name.to_string(),
            tier: self.tier,
            constructor: self.constructor.clone(),
            eager: self.eager,
            family: self.family.as_ref().map(ToString::to_string),
            references: self
                .references
                .iter()
                .flat_map(|param| param.tokens().iter().map(|t| t.raw().to_string()))
                .collect(),
        }
    }
}

/// Read-only overview of a configured node
#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    /// Qualified name
    pub name: String,
    /// Declaring tier
    pub tier: Tier,
    /// Constructor identifier
    pub constructor: String,
    /// Built at startup
    pub eager: bool,
    /// Family of named instances, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    /// Reference tokens as written
    pub references: Vec<String>,
}

/// Every configured node, immutable once loaded
#[derive(Debug, Clone, Default)]
pub struct ConfigTree {
    nodes: Vec<ConfigNode>,
    index: HashMap<QualifiedName, usize>,
}

impl ConfigTree {
    /// Parse the raw graph sections, interpolating placeholders from `env`
    pub fn load(raw: &Value, env: &EnvTable) -> Result<Self> {
        let sections = match raw {
            Value::Object(map) => map,
            Value::Null => return Ok(Self::default()),
            other => {
                return Err(Error::config(format!(
                    "Configuration root must be a table, found {other}"
                )));
            }
        };

        if let Some(unknown) = sections.keys().find(|key| Tier::from_section(key).is_none()) {
            return Err(Error::config(format!(
                "Unknown section '{unknown}'; expected components, composites or workflows"
            )));
        }

        let mut loader = TreeLoader {
            env,
            tree: Self::default(),
        };
        for tier in Tier::ALL {
            match sections.get(tier.section()) {
                None | Some(Value::Null) => {}
                Some(Value::Object(body)) => loader.walk(tier, None, body, tier.section())?,
                Some(other) => {
                    return Err(Error::config(format!(
                        "Section '{}' must be a table, found {other}",
                        tier.section()
                    )));
                }
            }
        }

        debug!(nodes = loader.tree.len(), "Configuration tree loaded");
        Ok(loader.tree)
    }

    /// Node by qualified name
    pub fn get(&self, name: &QualifiedName) -> Option<&ConfigNode> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    /// All nodes, tier by tier, sorted by name within a tier
    pub fn nodes(&self) -> impl Iterator<Item = &ConfigNode> {
        self.nodes.iter()
    }

    /// Nodes declared in one tier
    pub fn tier_nodes(&self, tier: Tier) -> impl Iterator<Item = &ConfigNode> {
        self.nodes.iter().filter(move |node| node.tier == tier)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing is configured
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolve a reference token held by `referrer`
    ///
    /// Searches the referrer's own tier, then each lower tier; never a
    /// higher one. A section prefix on the token restricts the search to
    /// that tier.
    pub fn resolve_reference(
        &self,
        token: &ReferenceToken,
        referrer: &ConfigNode,
    ) -> Result<(Tier, QualifiedName)> {
        let candidate = self.get(token.target());
        for tier in referrer.tier.search_order() {
            if token.tier().is_some_and(|pinned| pinned != tier) {
                continue;
            }
            if let Some(node) = candidate.filter(|node| node.tier == tier) {
                return Ok((tier, node.name.clone()));
            }
        }
        Err(Error::unresolved(token.raw(), referrer.name.as_str()))
    }

    /// Per-tier overview of every node
    pub fn describe(&self) -> Vec<NodeSummary> {
        self.nodes.iter().map(ConfigNode::summary).collect()
    }

    fn insert(&mut self, node: ConfigNode) -> Result<()> {
        if let Some(&existing) = self.index.get(&node.name) {
            return Err(Error::config(format!(
                "Duplicate qualified name '{}' (declared in {} and {})",
                node.name, self.nodes[existing].tier, node.tier
            )));
        }
        self.index.insert(node.name.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }
}

struct TreeLoader<'a> {
    env: &'a EnvTable,
    tree: ConfigTree,
}

impl TreeLoader<'_> {
    fn walk(
        &mut self,
        tier: Tier,
        prefix: Option<&QualifiedName>,
        body: &Map<String, Value>,
        location: &str,
    ) -> Result<()> {
        if body.contains_key(CONSTRUCTOR_KEY) {
            let name = prefix.ok_or_else(|| {
                Error::config(format!("'{location}' declares a constructor without a name"))
            })?;
            return self.entry(tier, name, body, location);
        }

        for (key, child) in body {
            let child_location = format!("{location}.{key}");
            let Value::Object(child_body) = child else {
                return Err(Error::config(format!(
                    "'{child_location}' must be a table (namespace or entry with a constructor)"
                )));
            };
            if prefix.is_none() && Tier::from_section(key).is_some() {
                return Err(Error::config(format!(
                    "'{child_location}' uses the section name '{key}' as a namespace; \
                     references to it would be read as tier-pinned"
                )));
            }
            let name = match prefix {
                Some(prefix) => prefix.child(key),
                None => QualifiedName::parse(key),
            }
            .map_err(|e| nested(&child_location, e))?;
            self.walk(tier, Some(&name), child_body, &child_location)?;
        }
        Ok(())
    }

    fn entry(
        &mut self,
        tier: Tier,
        name: &QualifiedName,
        body: &Map<String, Value>,
        location: &str,
    ) -> Result<()> {
        reject_unknown_keys(body, &ENTRY_KEYS, location)?;

        let constructor = match body.get(CONSTRUCTOR_KEY) {
            Some(Value::String(id)) if CONSTRUCTOR_ID.is_match(id) => id.clone(),
            other => {
                return Err(Error::config(format!(
                    "'{location}' has a malformed constructor descriptor: {}",
                    other.map_or_else(|| "missing".to_string(), ToString::to_string)
                )));
            }
        };
        let eager = read_eager(body, location)?.unwrap_or(false);
        let params = read_params(body, location)?;

        let Some(instances) = body.get(INSTANCES_KEY) else {
            let node = self.node(tier, name.clone(), &constructor, params, eager, None, location)?;
            return self.tree.insert(node);
        };

        let instances = match instances {
            Value::Object(map) if !map.is_empty() => map,
            _ => {
                return Err(Error::config(format!(
                    "'{location}.{INSTANCES_KEY}' must be a non-empty table"
                )));
            }
        };

        for (instance, overrides) in instances {
            let instance_location = format!("{location}.{INSTANCES_KEY}.{instance}");
            let Value::Object(overrides) = overrides else {
                return Err(Error::config(format!("'{instance_location}' must be a table")));
            };
            reject_unknown_keys(overrides, &INSTANCE_KEYS, &instance_location)?;

            let mut merged = params.clone();
            merged.extend(read_params(overrides, &instance_location)?);
            let instance_eager = read_eager(overrides, &instance_location)?.unwrap_or(eager);
            let instance_name = name
                .child(instance)
                .map_err(|e| nested(&instance_location, e))?;

            let node = self.node(
                tier,
                instance_name,
                &constructor,
                merged,
                instance_eager,
                Some(name.clone()),
                &instance_location,
            )?;
            self.tree.insert(node)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn node(
        &self,
        tier: Tier,
        name: QualifiedName,
        constructor: &str,
        params: Map<String, Value>,
        eager: bool,
        family: Option<QualifiedName>,
        location: &str,
    ) -> Result<ConfigNode> {
        let params_location = format!("{location}.{PARAMS_KEY}");
        let mut literals = Map::new();
        let mut references = Vec::new();

        for (key, value) in params {
            let key_location = format!("{params_location}.{key}");
            let value = self.env.interpolate_value(value, &key_location)?;
            if is_reference(&key) {
                references.push(ReferenceParam::parse(&key, &value, &key_location)?);
            } else {
                literals.insert(key, value);
            }
        }

        if let Some(clash) = references.iter().find(|r| literals.contains_key(r.param())) {
            return Err(Error::config(format!(
                "'{params_location}' sets both '{0}' and '{0}_ref'",
                clash.param()
            )));
        }

        Ok(ConfigNode {
            name,
            tier,
            constructor: constructor.to_string(),
            params: literals,
            references,
            eager,
            family,
        })
    }
}

fn reject_unknown_keys(body: &Map<String, Value>, allowed: &[&str], location: &str) -> Result<()> {
    match body.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(unknown) => Err(Error::config(format!(
            "'{location}' has unknown key '{unknown}' (allowed: {})",
            allowed.join(", ")
        ))),
        None => Ok(()),
    }
}

fn read_eager(body: &Map<String, Value>, location: &str) -> Result<Option<bool>> {
    match body.get(EAGER_KEY) {
        None => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(other) => Err(Error::config(format!(
            "'{location}.{EAGER_KEY}' must be a boolean, found {other}"
        ))),
    }
}

fn read_params(body: &Map<String, Value>, location: &str) -> Result<Map<String, Value>> {
    match body.get(PARAMS_KEY) {
        None => Ok(Map::new()),
        Some(Value::Object(params)) => Ok(params.clone()),
        Some(other) => Err(Error::config(format!(
            "'{location}.{PARAMS_KEY}' must be a table, found {other}"
        ))),
    }
}

fn nested(location: &str, err: Error) -> Error {
    Error::Config {
        message: format!("Invalid name at '{location}'"),
        source: Some(std::sync::Arc::new(err)),
    }
}
