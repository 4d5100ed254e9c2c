//! Factory port and the values flowing through it

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::Lifecycle;
use crate::error::{BoxError, Error};
use crate::value_objects::{Instance, QualifiedName, Tier};

/// Builds one object from its static parameters and resolved references
///
/// Registered by the host under a constructor identifier. Each configured
/// name invokes its factory at most once per container.
#[async_trait]
pub trait Factory: Send + Sync {
    /// Construct the object described by `ctx`
    async fn build(&self, ctx: BuildContext) -> Result<Provided, BoxError>;
}

/// A resolved reference parameter
#[derive(Debug, Clone)]
pub enum ResolvedReference {
    /// `key_ref = "name"`
    One(Instance),
    /// `key_ref = ["a", "b"]`
    Many(Vec<Instance>),
}

/// Everything a factory receives for one build
#[derive(Debug, Clone)]
pub struct BuildContext {
    name: QualifiedName,
    tier: Tier,
    params: Map<String, Value>,
    references: HashMap<String, ResolvedReference>,
}

impl BuildContext {
    /// Create a context; `references` are keyed by parameter name with the
    /// reference marker already stripped
    pub fn new(
        name: QualifiedName,
        tier: Tier,
        params: Map<String, Value>,
        references: HashMap<String, ResolvedReference>,
    ) -> Self {
        Self {
            name,
            tier,
            params,
            references,
        }
    }

    /// Qualified name being built
    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    /// Tier being built
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Literal parameters after interpolation
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Whether a literal parameter is present
    pub fn has_param(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Deserialize a required literal parameter
    pub fn param<T: DeserializeOwned>(&self, key: &str) -> Result<T, BoxError> {
        let value = self.params.get(key).ok_or_else(|| {
            Error::config(format!("'{}' is missing parameter '{key}'", self.name))
        })?;
        T::deserialize(value).map_err(|e| {
            Error::config_with_source(format!("'{}' has an invalid '{key}'", self.name), e).into()
        })
    }

    /// Deserialize an optional literal parameter, falling back to `default`
    pub fn param_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, BoxError> {
        if self.has_param(key) {
            self.param(key)
        } else {
            Ok(default)
        }
    }

    /// Untyped resolved reference
    pub fn instance(&self, key: &str) -> Option<&Instance> {
        match self.references.get(key) {
            Some(ResolvedReference::One(instance)) => Some(instance),
            _ => None,
        }
    }

    /// Resolved single reference downcast to `T`
    pub fn reference<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>, BoxError> {
        let instance = self.instance(key).ok_or_else(|| {
            Error::config(format!("'{}' has no single reference '{key}'", self.name))
        })?;
        downcast(instance)
    }

    /// Resolved reference list downcast to `T`
    ///
    /// A single reference is accepted as a one-element list.
    pub fn references<T: Any + Send + Sync>(&self, key: &str) -> Result<Vec<Arc<T>>, BoxError> {
        match self.references.get(key) {
            Some(ResolvedReference::Many(instances)) => instances.iter().map(downcast::<T>).collect(),
            Some(ResolvedReference::One(instance)) => Ok(vec![downcast(instance)?]),
            None => Err(Error::config(format!("'{}' has no reference '{key}'", self.name)).into()),
        }
    }
}

fn downcast<T: Any + Send + Sync>(instance: &Instance) -> Result<Arc<T>, BoxError> {
    instance.downcast::<T>().ok_or_else(|| {
        Error::TypeMismatch {
            name: instance.name().to_string(),
            expected: type_name::<T>(),
        }
        .into()
    })
}

/// What a factory hands back: the object plus its optional lifecycle handle
pub struct Provided {
    object: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    lifecycle: Option<Arc<dyn Lifecycle>>,
}

impl Provided {
    /// A plain object without lifecycle hooks
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// A plain, already shared object
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            object: value,
            type_name: type_name::<T>(),
            lifecycle: None,
        }
    }

    /// An object whose `connect`/`disconnect` hooks the container drives
    pub fn managed<T: Lifecycle + Any>(value: T) -> Self {
        Self::managed_arc(Arc::new(value))
    }

    /// An already shared object whose lifecycle hooks the container drives
    pub fn managed_arc<T: Lifecycle + Any>(value: Arc<T>) -> Self {
        let lifecycle: Arc<dyn Lifecycle> = value.clone();
        Self {
            object: value,
            type_name: type_name::<T>(),
            lifecycle: Some(lifecycle),
        }
    }

    /// Whether the object exposes lifecycle hooks
    pub fn is_managed(&self) -> bool {
        self.lifecycle.is_some()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Arc<dyn Any + Send + Sync>,
        &'static str,
        Option<Arc<dyn Lifecycle>>,
    ) {
        (self.object, self.type_name, self.lifecycle)
    }
}
