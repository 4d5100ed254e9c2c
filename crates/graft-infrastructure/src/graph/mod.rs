//! Configuration graph
//!
//! Loading and validation of the declarative object graph: placeholder
//! interpolation, reference parsing, the flattened configuration tree and
//! the static dependency graph derived from it.

pub mod dependency;
pub mod env;
pub mod reference;
pub mod tree;

pub use dependency::{DependencyGraph, ResolvedParam};
pub use env::EnvTable;
pub use reference::{ReferenceParam, ReferenceShape, ReferenceToken};
pub use tree::{ConfigNode, ConfigTree, NodeSummary};
