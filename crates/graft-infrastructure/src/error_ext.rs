//! Error extension utilities
//!
//! Context extension methods that convert foreign errors into the domain
//! [`Error`] type.

use graft_domain::error::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// Extension trait for adding context to errors
///
/// # Example
///
/// ```ignore
/// use graft_infrastructure::error_ext::ErrorContext;
///
/// let raw = std::fs::read_to_string(&path)
///     .io_context(format!("Failed to read config file: {}", path.display()))?;
///
/// let config: AppConfig = figment
///     .extract()
///     .config_context("Failed to extract configuration")?;
/// ```
pub trait ErrorContext<T> {
    /// Add context with lazy evaluation for expensive context creation
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;

    /// Add context for I/O operations
    fn io_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
        Self: Sized;

    /// Add context for configuration operations
    fn config_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
        Self: Sized;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|err| Error::Config {
            message: format!("{}: {}", f(), err),
            source: Some(Arc::new(err)),
        })
    }

    fn io_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
        Self: Sized,
    {
        self.map_err(|err| Error::Io {
            message: format!("{}: {}", context, err),
            source: Some(Arc::new(err)),
        })
    }

    fn config_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
        Self: Sized,
    {
        self.map_err(|err| Error::Config {
            message: format!("{}: {}", context, err),
            source: Some(Arc::new(err)),
        })
    }
}
