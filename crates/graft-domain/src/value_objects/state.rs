//! Build and container states

use std::fmt;

use serde::{Deserialize, Serialize};

/// Build state of one configured entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BuildState {
    /// Not requested yet
    #[default]
    Unbuilt,
    /// Construction in progress
    Building,
    /// Constructed and cached
    Built,
    /// Construction failed; the error is cached for the container's lifetime
    Failed,
}

impl BuildState {
    /// Encode for atomic storage
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Unbuilt => 0,
            Self::Building => 1,
            Self::Built => 2,
            Self::Failed => 3,
        }
    }

    /// Decode from atomic storage
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Building,
            2 => Self::Built,
            3 => Self::Failed,
            _ => Self::Unbuilt,
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unbuilt => "unbuilt",
            Self::Building => "building",
            Self::Built => "built",
            Self::Failed => "failed",
        })
    }
}

/// Lifecycle state of a container
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ContainerState {
    /// Registries exist, eager pass not finished
    #[default]
    Unbuilt,
    /// Serving `get` requests
    Ready,
    /// Shutdown sweep in progress
    ShuttingDown,
    /// Shut down, or startup aborted
    Closed,
}

impl ContainerState {
    /// Encode for atomic storage
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Unbuilt => 0,
            Self::Ready => 1,
            Self::ShuttingDown => 2,
            Self::Closed => 3,
        }
    }

    /// Decode from atomic storage
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Ready,
            2 => Self::ShuttingDown,
            3 => Self::Closed,
            _ => Self::Unbuilt,
        }
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unbuilt => "unbuilt",
            Self::Ready => "ready",
            Self::ShuttingDown => "shutting down",
            Self::Closed => "closed",
        })
    }
}
