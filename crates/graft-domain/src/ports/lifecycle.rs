//! Connect/disconnect capability

use async_trait::async_trait;

use crate::error::BoxError;

/// Lifecycle capability for objects holding external resources
///
/// Both hooks are best-effort and optional: the defaults do nothing. Retry
/// policies, if any, belong inside the implementation.
///
/// # Example
///
/// ```no_run
/// use async_trait::async_trait;
/// use graft_domain::{BoxError, Lifecycle};
///
/// struct Database;
///
/// #[async_trait]
/// impl Lifecycle for Database {
///     async fn connect(&self) -> Result<(), BoxError> {
///         // open the pool
///         Ok(())
///     }
///
///     async fn disconnect(&self) -> Result<(), BoxError> {
///         // drain and close the pool
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Open the resource; invoked for eager entries while the container starts
    async fn connect(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Release the resource; invoked during shutdown and startup rollback
    async fn disconnect(&self) -> Result<(), BoxError> {
        Ok(())
    }
}
