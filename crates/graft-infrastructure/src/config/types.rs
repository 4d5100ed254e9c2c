//! Configuration types

use std::path::PathBuf;
use std::time::Duration;

use graft_domain::error::Result;
use graft_domain::value_objects::Tier;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{DEFAULT_LOG_LEVEL, DEFAULT_SHUTDOWN_TIMEOUT_SECS};
use crate::graph::EnvTable;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON output format
    pub json_format: bool,

    /// Log to a daily rolling file in addition to stdout
    pub file_output: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json_format: false,
            file_output: None,
        }
    }
}

/// Container runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Budget for shutdown and startup rollback, in seconds
    pub shutdown_timeout_secs: u64,

    /// Dotenv file consulted for `${VAR}` placeholders after the process environment
    pub dotenv_path: Option<PathBuf>,

    /// Directory of `<VAR>` files consulted last for `${VAR}` placeholders
    pub secrets_dir: Option<PathBuf>,
}

impl ContainerConfig {
    /// Shutdown budget as a duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            dotenv_path: None,
            secrets_dir: None,
        }
    }
}

/// Complete application configuration
///
/// The three graph sections are kept raw; the container parses them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Container runtime configuration
    pub container: ContainerConfig,

    /// Leaf infrastructure objects
    pub components: Map<String, Value>,

    /// Services built from components
    pub composites: Map<String, Value>,

    /// Orchestrations built from composites and components
    pub workflows: Map<String, Value>,
}

impl AppConfig {
    /// Raw graph sections of one tier
    pub fn section(&self, tier: Tier) -> &Map<String, Value> {
        match tier {
            Tier::Component => &self.components,
            Tier::Composite => &self.composites,
            Tier::Workflow => &self.workflows,
        }
    }

    /// The graph sections as one mapping, as accepted by `ConfigTree::load`
    pub fn graph_value(&self) -> Value {
        let sections = Tier::ALL
            .into_iter()
            .filter(|tier| !self.section(*tier).is_empty())
            .map(|tier| (tier.section().to_string(), Value::Object(self.section(tier).clone())))
            .collect();
        Value::Object(sections)
    }

    /// Placeholder sources: process environment, then the dotenv file,
    /// then the secrets directory
    pub fn env_table(&self) -> Result<EnvTable> {
        let mut env = EnvTable::from_process();
        if let Some(path) = &self.container.dotenv_path {
            env = env.with_dotenv_file(path)?;
        }
        if let Some(dir) = &self.container.secrets_dir {
            env = env.with_secrets_dir(dir);
        }
        Ok(env)
    }
}
