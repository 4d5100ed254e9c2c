//! Value objects describing a configured object graph

mod instance;
mod name;
mod state;

pub use instance::Instance;
pub use name::{QualifiedName, Tier};
pub use state::{BuildState, ContainerState};
