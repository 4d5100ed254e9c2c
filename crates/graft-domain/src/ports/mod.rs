//! Ports implemented by host code
//!
//! The host registers a [`Factory`] per constructor identifier; objects that
//! hold external resources expose the [`Lifecycle`] capability through
//! [`Provided::managed`].

mod factory;
mod lifecycle;

pub use factory::{BuildContext, Factory, Provided, ResolvedReference};
pub use lifecycle::Lifecycle;
