//! Materialized objects

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::{QualifiedName, Tier};
use crate::ports::{Lifecycle, Provided};

/// A built object together with its identity and optional lifecycle handle
///
/// Cloning an `Instance` is cheap and never copies the object: every clone
/// points at the same singleton.
#[derive(Clone)]
pub struct Instance {
    name: QualifiedName,
    tier: Tier,
    type_name: &'static str,
    object: Arc<dyn Any + Send + Sync>,
    lifecycle: Option<Arc<dyn Lifecycle>>,
}

impl Instance {
    /// Wrap what a factory provided for `name`
    pub fn new(name: QualifiedName, tier: Tier, provided: Provided) -> Self {
        let (object, type_name, lifecycle) = provided.into_parts();
        Self {
            name,
            tier,
            type_name,
            object,
            lifecycle,
        }
    }

    /// Qualified name of this object
    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    /// Tier this object was built in
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Rust type name of the underlying object
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The underlying object, untyped
    pub fn object(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.object
    }

    /// The underlying object as `T`, if it is one
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.object).downcast::<T>().ok()
    }

    /// Lifecycle capability, when the factory exposed one
    pub fn lifecycle(&self) -> Option<&Arc<dyn Lifecycle>> {
        self.lifecycle.as_ref()
    }

    /// Whether both instances wrap the very same object
    pub fn same_object(&self, other: &Instance) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.object).cast::<()>(),
            Arc::as_ptr(&other.object).cast::<()>(),
        )
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("name", &self.name)
            .field("tier", &self.tier)
            .field("type_name", &self.type_name)
            .field("managed", &self.lifecycle.is_some())
            .finish()
    }
}
