//! Configuration management
//!
//! Figment-based loading of `graft.toml`: runtime settings (`[logging]`,
//! `[container]`) next to the raw `[components]`, `[composites]` and
//! `[workflows]` graph sections.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{AppConfig, ContainerConfig, LoggingConfig};
