//! # Graft Domain
//!
//! Core types shared by every layer of Graft: the error taxonomy, the value
//! objects that describe a configured object graph, and the ports that
//! host-provided objects implement.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error taxonomy and `Result` alias |
//! | [`value_objects`] | Qualified names, tiers, build states, instances |
//! | [`ports`] | Factory and lifecycle capability traits |
//! | [`constants`] | Reserved configuration keywords |

pub mod constants;
pub mod error;
pub mod ports;
pub mod value_objects;

pub use error::{BoxError, Error, Result, ShutdownFailure, ShutdownReason};
pub use ports::{BuildContext, Factory, Lifecycle, Provided};
pub use value_objects::{BuildState, ContainerState, Instance, QualifiedName, Tier};
