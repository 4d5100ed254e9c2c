//! Qualified names and tiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    COMPONENTS_SECTION, COMPOSITES_SECTION, NAME_SEPARATOR, PATH_SEPARATOR, WORKFLOWS_SECTION,
};
use crate::error::{Error, Result};

/// Layer of the object graph an entry belongs to
///
/// Tiers are ordered: an entry may reference its own tier or any lower one,
/// never a higher one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Leaf infrastructure objects
    Component,
    /// Services built from components
    Composite,
    /// Orchestrations built from composites and components
    Workflow,
}

impl Tier {
    /// All tiers, lowest first
    pub const ALL: [Tier; 3] = [Tier::Component, Tier::Composite, Tier::Workflow];

    /// Configuration section holding this tier
    pub fn section(self) -> &'static str {
        match self {
            Self::Component => COMPONENTS_SECTION,
            Self::Composite => COMPOSITES_SECTION,
            Self::Workflow => WORKFLOWS_SECTION,
        }
    }

    /// Tier for a configuration section name
    pub fn from_section(section: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.section() == section)
    }

    /// Tiers searched when resolving a reference from this tier: own tier
    /// first, then each lower tier from nearest to farthest
    pub fn search_order(self) -> impl Iterator<Item = Tier> {
        Self::ALL.into_iter().rev().filter(move |tier| *tier <= self)
    }

    /// Whether an entry in this tier may reference an entry in `other`
    pub fn can_reference(self, other: Tier) -> bool {
        other <= self
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Component => "component",
            Self::Composite => "composite",
            Self::Workflow => "workflow",
        })
    }
}

impl FromStr for Tier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "component" | "components" => Ok(Self::Component),
            "composite" | "composites" => Ok(Self::Composite),
            "workflow" | "workflows" => Ok(Self::Workflow),
            other => Err(Error::config(format!("Unknown tier '{other}'"))),
        }
    }
}

/// Dot-separated path naming one object, unique across the whole graph
///
/// Segments are non-empty and made of ASCII letters, digits, `_` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QualifiedName(String);

impl QualifiedName {
    /// Parse and validate a qualified name
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::config("Qualified name cannot be empty"));
        }
        for segment in raw.split(NAME_SEPARATOR) {
            if !is_valid_segment(segment) {
                return Err(Error::config(format!(
                    "Invalid qualified name '{raw}': segment '{segment}' must be non-empty \
                     and contain only letters, digits, '_' or '-'"
                )));
            }
        }
        Ok(Self(raw.to_string()))
    }

    /// Rewrite `/` separators to `.`; surrounding whitespace is dropped
    ///
    /// `-` stays a name character: `llms.high-temp` and `llms.high.temp`
    /// are different names.
    pub fn normalize(raw: &str) -> String {
        raw.trim().replace(PATH_SEPARATOR, &NAME_SEPARATOR.to_string())
    }

    /// Parse a name that may use `/` separators
    pub fn from_path(raw: &str) -> Result<Self> {
        Self::parse(&Self::normalize(raw))
    }

    /// Append one segment
    pub fn child(&self, segment: &str) -> Result<Self> {
        Self::parse(&format!("{}{NAME_SEPARATOR}{segment}", self.0))
    }

    /// The name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Whether a single path segment is well formed
pub(crate) fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for QualifiedName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for QualifiedName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<QualifiedName> for String {
    fn from(name: QualifiedName) -> Self {
        name.0
    }
}

impl AsRef<str> for QualifiedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
