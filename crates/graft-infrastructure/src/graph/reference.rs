//! Reference tokens
//!
//! A parameter whose key ends in `_ref` names another configured object
//! instead of supplying a literal:
//!
//! ```toml
//! [composites.agent.chat]
//! constructor = "chat_agent"
//! params = { store_ref = "store.primary", tools_ref = ["tools.search", "tools.calc"] }
//! ```
//!
//! The factory receives the resolved objects under the key without the
//! suffix (`store`, `tools`). A token may start with a tier section
//! (`components.store.primary`) to pin the lookup to that tier; `/` is
//! accepted as a separator and normalized to `.`. `-` is not a separator:
//! `llms.high-temp` never matches `llms.high.temp`.

use std::fmt;

use graft_domain::constants::{NAME_SEPARATOR, REFERENCE_SUFFIX};
use graft_domain::error::{Error, Result};
use graft_domain::value_objects::{QualifiedName, Tier};
use serde_json::Value;

/// Whether a parameter key carries the reference marker
pub fn is_reference(key: &str) -> bool {
    key.len() > REFERENCE_SUFFIX.len() && key.ends_with(REFERENCE_SUFFIX)
}

/// Parameter name with the reference marker stripped
pub fn parameter_name(key: &str) -> Option<&str> {
    if is_reference(key) {
        key.strip_suffix(REFERENCE_SUFFIX)
    } else {
        None
    }
}

/// One parsed reference value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceToken {
    raw: String,
    tier: Option<Tier>,
    target: QualifiedName,
}

impl ReferenceToken {
    /// Parse a token, validating its syntax
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = QualifiedName::normalize(raw);
        let (tier, path) = match normalized.split_once(NAME_SEPARATOR) {
            Some((head, rest)) => match Tier::from_section(head) {
                Some(tier) => (Some(tier), rest),
                None => (None, normalized.as_str()),
            },
            None => (None, normalized.as_str()),
        };
        let target = QualifiedName::parse(path).map_err(|e| Error::Config {
            message: format!("Malformed reference token '{raw}'"),
            source: Some(std::sync::Arc::new(e)),
        })?;
        Ok(Self {
            raw: raw.to_string(),
            tier,
            target,
        })
    }

    /// The token as written in configuration
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Tier pinned by an explicit section prefix
    pub fn tier(&self) -> Option<Tier> {
        self.tier
    }

    /// Qualified name the token points at
    pub fn target(&self) -> &QualifiedName {
        &self.target
    }
}

impl fmt::Display for ReferenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Whether a reference parameter holds one token or a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceShape {
    /// `key_ref = "name"`
    One,
    /// `key_ref = ["a", "b"]`
    Many,
}

/// A reference-typed parameter of one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceParam {
    param: String,
    shape: ReferenceShape,
    tokens: Vec<ReferenceToken>,
}

impl ReferenceParam {
    /// Parse the value of a `*_ref` key; `location` names it in errors
    pub fn parse(key: &str, value: &Value, location: &str) -> Result<Self> {
        let param = parameter_name(key)
            .ok_or_else(|| Error::config(format!("'{location}' is not a reference key")))?
            .to_string();
        let (shape, tokens) = match value {
            Value::String(raw) => (ReferenceShape::One, vec![ReferenceToken::parse(raw)?]),
            Value::Array(items) => {
                let tokens = items
                    .iter()
                    .map(|item| match item {
                        Value::String(raw) => ReferenceToken::parse(raw),
                        other => Err(Error::config(format!(
                            "'{location}' must list reference names, found {other}"
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                (ReferenceShape::Many, tokens)
            }
            other => {
                return Err(Error::config(format!(
                    "'{location}' must be a reference name or a list of names, found {other}"
                )));
            }
        };
        Ok(Self {
            param,
            shape,
            tokens,
        })
    }

    /// Parameter name handed to the factory
    pub fn param(&self) -> &str {
        &self.param
    }

    /// Single token or list
    pub fn shape(&self) -> ReferenceShape {
        self.shape
    }

    /// Parsed tokens in declaration order
    pub fn tokens(&self) -> &[ReferenceToken] {
        &self.tokens
    }
}
