//! # Graft Infrastructure
//!
//! Runtime for declarative, three-tier object graphs: configuration
//! loading, reference resolution, the lazy singleton container and the
//! cross-cutting services around it.
//!
//! ### Graph & DI
//! | Module | Description |
//! |--------|-------------|
//! | [`graph`] | Placeholder interpolation, reference parsing, dependency graph |
//! | [`di`] | Factory table, tier registries, container |
//!
//! ### Configuration & Observability
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Figment-based `graft.toml` loading |
//! | [`constants`] | Centralized configuration constants |
//! | [`logging`] | Structured logging with tracing |
//! | [`error_ext`] | Context helpers for foreign errors |

pub mod config;
pub mod constants;
pub mod di;
pub mod error_ext;
pub mod graph;
pub mod logging;

pub use config::{AppConfig, ConfigLoader};
pub use di::{Container, ContainerBuilder, ContainerDescription, FactoryTable};
pub use graph::{ConfigTree, DependencyGraph, EnvTable};
