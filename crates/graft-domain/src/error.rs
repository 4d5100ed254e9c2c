//! Error handling types

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::value_objects::{ContainerState, Tier};

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by host factories and lifecycle hooks
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared error source, cloneable so failed builds can be replayed
pub type SharedSource = Arc<dyn std::error::Error + Send + Sync>;

/// Main error type for Graft
///
/// Every variant is `Clone`: a failed build is cached per name and the same
/// error is handed to every later caller.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Malformed or duplicate configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<SharedSource>,
    },

    /// A `${VAR}` placeholder without default named an unset variable
    #[error("Missing environment variable '{variable}' (referenced at {location})")]
    MissingEnvironmentVariable {
        /// Variable name inside the placeholder
        variable: String,
        /// Configuration path of the value holding the placeholder
        location: String,
    },

    /// A reference token named an object that is not reachable from the referrer
    #[error("Unresolved reference '{target}' from '{referrer}'")]
    UnresolvedReference {
        /// Name the token pointed at
        target: String,
        /// Qualified name of the object holding the token
        referrer: String,
    },

    /// An entry named a constructor the host never registered
    #[error("Unknown constructor '{constructor}' for '{name}'")]
    UnknownConstructor {
        /// Constructor identifier from configuration
        constructor: String,
        /// Qualified name of the entry
        name: String,
    },

    /// The reference graph contains a cycle
    #[error("Circular reference: {}", chain.join(" -> "))]
    CircularReference {
        /// Resolution chain, first and last element name the same object
        chain: Vec<String>,
    },

    /// A factory (or one of the dependencies it needed) failed
    #[error("Failed to construct '{name}': {source}")]
    Construction {
        /// Qualified name of the object being built
        name: String,
        /// The underlying factory or dependency failure
        #[source]
        source: SharedSource,
    },

    /// An eager object failed to connect during startup
    #[error("Failed to connect '{name}': {source}")]
    Connect {
        /// Qualified name of the object being connected
        name: String,
        /// The underlying failure
        #[source]
        source: SharedSource,
    },

    /// One or more disconnects failed, timed out or were abandoned
    #[error("Shutdown finished with {} failure(s): {}", failures.len(), join_failures(failures))]
    Shutdown {
        /// Every resource that did not close cleanly
        failures: Vec<ShutdownFailure>,
    },

    /// No entry with that name exists in the requested tier
    #[error("Not found: {tier} '{name}'")]
    NotFound {
        /// Tier that was searched
        tier: Tier,
        /// Requested name
        name: String,
    },

    /// The built object is not of the requested type
    #[error("'{name}' is not a {expected}")]
    TypeMismatch {
        /// Qualified name of the object
        name: String,
        /// Requested type name
        expected: &'static str,
    },

    /// The container cannot serve requests in its current state
    #[error("Container is not ready (state: {state})")]
    NotReady {
        /// Current container state
        state: ContainerState,
    },

    /// I/O operation error
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
        /// Optional source error
        #[source]
        source: Option<SharedSource>,
    },
}

// Configuration error creation methods
impl Error {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    /// Create a missing environment variable error
    pub fn missing_env<V: Into<String>, L: Into<String>>(variable: V, location: L) -> Self {
        Self::MissingEnvironmentVariable {
            variable: variable.into(),
            location: location.into(),
        }
    }
}

// Graph error creation methods
impl Error {
    /// Create an unresolved reference error
    pub fn unresolved<T: Into<String>, R: Into<String>>(target: T, referrer: R) -> Self {
        Self::UnresolvedReference {
            target: target.into(),
            referrer: referrer.into(),
        }
    }

    /// Create an unknown constructor error
    pub fn unknown_constructor<C: Into<String>, N: Into<String>>(constructor: C, name: N) -> Self {
        Self::UnknownConstructor {
            constructor: constructor.into(),
            name: name.into(),
        }
    }

    /// Create a circular reference error from a resolution chain
    pub fn circular<I, S>(chain: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::CircularReference {
            chain: chain.into_iter().map(Into::into).collect(),
        }
    }
}

// Build and lifecycle error creation methods
impl Error {
    /// Wrap a factory failure
    pub fn construction<S: Into<String>>(name: S, source: BoxError) -> Self {
        Self::Construction {
            name: name.into(),
            source: Arc::from(source),
        }
    }

    /// Wrap the failure of a dependency needed to build `name`
    ///
    /// Graph errors stay as they are so the offending chain reaches the caller.
    pub fn dependency<S: Into<String>>(name: S, cause: Error) -> Self {
        if cause.is_graph_error() {
            return cause;
        }
        Self::Construction {
            name: name.into(),
            source: Arc::new(cause),
        }
    }

    /// Wrap a connect failure
    pub fn connect<S: Into<String>>(name: S, source: BoxError) -> Self {
        Self::Connect {
            name: name.into(),
            source: Arc::from(source),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(tier: Tier, name: S) -> Self {
        Self::NotFound {
            tier,
            name: name.into(),
        }
    }

    /// Create an I/O error with source
    pub fn io_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }
}

// Classification
impl Error {
    /// Whether this error describes the shape of the reference graph
    pub fn is_graph_error(&self) -> bool {
        matches!(
            self,
            Self::CircularReference { .. } | Self::UnresolvedReference { .. }
        )
    }

    /// Whether a request handler should report this as a service-unavailable condition
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Construction { .. } | Self::Connect { .. } | Self::NotReady { .. }
        )
    }

    /// Whether this error means the configuration itself is unusable
    pub fn is_fatal_startup(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::MissingEnvironmentVariable { .. }
                | Self::UnresolvedReference { .. }
                | Self::UnknownConstructor { .. }
                | Self::CircularReference { .. }
        )
    }
}

/// Why a resource did not close during shutdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// `disconnect` returned an error
    Failed(String),
    /// `disconnect` was still running when the deadline passed
    TimedOut,
    /// The deadline had passed before `disconnect` could be attempted
    Abandoned,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(message) => write!(f, "failed: {message}"),
            Self::TimedOut => f.write_str("timed out"),
            Self::Abandoned => f.write_str("abandoned after deadline"),
        }
    }
}

/// A single resource that did not close cleanly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownFailure {
    /// Tier of the resource
    pub tier: Tier,
    /// Qualified name of the resource
    pub name: String,
    /// What went wrong
    pub reason: ShutdownReason,
}

impl fmt::Display for ShutdownFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' {}", self.tier, self.name, self.reason)
    }
}

fn join_failures(failures: &[ShutdownFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
