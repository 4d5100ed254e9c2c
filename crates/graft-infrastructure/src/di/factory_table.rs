//! Factory Table
//!
//! Explicit mapping from constructor identifiers to host factories. The
//! host fills the table before building a container; nothing is
//! discovered implicitly.
//!
//! ```ignore
//! let mut factories = FactoryTable::new();
//! factories.register_fn("kv_factory", |ctx| async move {
//!     let size: usize = ctx.param("size")?;
//!     Ok(Provided::new(KvStore::with_capacity(size)))
//! });
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use graft_domain::error::BoxError;
use graft_domain::ports::{BuildContext, Factory, Provided};
use tracing::warn;

/// Adapter turning an async closure into a [`Factory`]
struct FnFactory<F>(F);

#[async_trait]
impl<F, Fut> Factory for FnFactory<F>
where
    F: Fn(BuildContext) -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<Provided, BoxError>> + Send,
{
    async fn build(&self, ctx: BuildContext) -> std::result::Result<Provided, BoxError> {
        (self.0)(ctx).await
    }
}

/// Constructor identifier to factory mapping
#[derive(Clone, Default)]
pub struct FactoryTable {
    factories: BTreeMap<String, Arc<dyn Factory>>,
}

impl FactoryTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `id`
    ///
    /// A later registration for the same identifier replaces the earlier one.
    pub fn register<S: Into<String>>(&mut self, id: S, factory: Arc<dyn Factory>) -> &mut Self {
        let id = id.into();
        if self.factories.insert(id.clone(), factory).is_some() {
            warn!(constructor = %id, "Replaced previously registered factory");
        }
        self
    }

    /// Register an async closure under `id`
    pub fn register_fn<S, F, Fut>(&mut self, id: S, f: F) -> &mut Self
    where
        S: Into<String>,
        F: Fn(BuildContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Provided, BoxError>> + Send + 'static,
    {
        self.register(id, Arc::new(FnFactory(f)))
    }

    /// Factory registered under `id`
    pub fn get(&self, id: &str) -> Option<Arc<dyn Factory>> {
        self.factories.get(id).cloned()
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered identifiers, sorted
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Number of registered factories
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no factory is registered
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for FactoryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryTable")
            .field("ids", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
