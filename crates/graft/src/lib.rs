//! # Graft
//!
//! Declarative, config-driven registry for three tiers of objects:
//! components, composites built from components, and workflows built from
//! both. The host registers factories by identifier, hands the container
//! its configuration, and asks for objects by name; every name is built
//! lazily, exactly once.
//!
//! ## Example
//!
//! ```ignore
//! use graft::{Container, FactoryTable, Provided, Tier};
//!
//! let mut factories = FactoryTable::new();
//! factories.register_fn("kv_factory", |ctx| async move {
//!     Ok(Provided::new(KvStore::with_capacity(ctx.param("size")?)))
//! });
//!
//! let container = Container::builder(factories)
//!     .with_config(serde_json::json!({
//!         "components": {
//!             "store": { "constructor": "kv_factory", "params": { "size": 10 } }
//!         }
//!     }))
//!     .build()
//!     .await?;
//!
//! let store = container.resolve::<KvStore>(Tier::Component, "store").await?;
//! ```
//!
//! ## Architecture
//!
//! - `domain` - error taxonomy, value objects, factory and lifecycle ports
//! - `infrastructure` - configuration, reference graph, registries, container

/// Domain layer - error taxonomy, value objects and ports
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use graft_domain::*;
}

/// Infrastructure layer - configuration, graph validation and container
///
/// Re-exports from the infrastructure crate for convenience
pub mod infrastructure {
    pub use graft_infrastructure::*;
}

// Re-export commonly used domain types at the crate root
pub use domain::*;

// Re-export the container API at the crate root
pub use infrastructure::{AppConfig, ConfigLoader, Container, ContainerBuilder, FactoryTable};
