//! Dependency injection runtime
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`factory_table`] | Constructor identifier to factory mapping |
//! | [`registry`] | Per-tier build-and-cache algorithm |
//! | [`container`] | Composition root: build, eager pass, shutdown |
//! | [`build_log`] | Completion order used for reverse shutdown |
//! | [`describe`] | Read-only introspection types |

pub mod build_log;
pub mod container;
pub mod describe;
pub mod factory_table;
pub mod registry;
mod shutdown;

pub use build_log::{BuildLog, BuildRecord};
pub use container::{Container, ContainerBuilder};
pub use describe::{ContainerDescription, EntryDescription, TierDescription};
pub use factory_table::FactoryTable;
pub use registry::Registry;
