//! Environment placeholder interpolation
//!
//! Expands `${VAR}` and `${VAR:-default}` placeholders in configuration
//! strings. Variables are looked up in this order:
//!
//! 1. the process environment snapshot (plus explicit overrides),
//! 2. variables read from a dotenv file,
//! 3. files in a secrets directory (`<dir>/<VAR>`, as mounted by Docker/Compose).
//!
//! `$${` produces a literal `${`. Text that is not a well-formed placeholder
//! passes through unchanged.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use graft_domain::error::{Error, Result};
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::debug;

use crate::error_ext::ErrorContext;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\$\{|\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
        .expect("placeholder pattern is valid")
});

/// Variables available to `${VAR}` placeholders
#[derive(Debug, Clone, Default)]
pub struct EnvTable {
    vars: HashMap<String, String>,
    dotenv: HashMap<String, String>,
    secrets_dir: Option<PathBuf>,
}

impl EnvTable {
    /// A table with no variables at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
            ..Self::default()
        }
    }

    /// Set (or override) one variable
    pub fn with_var<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Read a dotenv file; its variables rank below the process environment
    pub fn with_dotenv_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        let entries = dotenvy::from_path_iter(path)
            .config_context(format!("Failed to open dotenv file {}", path.display()))?;
        for entry in entries {
            let (key, value) =
                entry.with_context(|| format!("Malformed dotenv file {}", path.display()))?;
            self.dotenv.insert(key, value);
        }
        debug!(path = %path.display(), count = self.dotenv.len(), "Loaded dotenv variables");
        Ok(self)
    }

    /// Fall back to `<dir>/<VAR>` files for variables not set elsewhere
    pub fn with_secrets_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.secrets_dir = Some(dir.into());
        self
    }

    /// Value of a variable, if any source defines it
    pub fn lookup(&self, name: &str) -> Result<Option<String>> {
        if let Some(value) = self.vars.get(name).or_else(|| self.dotenv.get(name)) {
            return Ok(Some(value.clone()));
        }
        let Some(dir) = &self.secrets_dir else {
            return Ok(None);
        };
        let path = dir.join(name);
        if !path.is_file() {
            return Ok(None);
        }
        let secret = std::fs::read_to_string(&path)
            .io_context(format!("Failed to read secret file {}", path.display()))?;
        Ok(Some(secret.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Expand every placeholder in `text`
    ///
    /// `location` names the configuration value for error messages.
    pub fn interpolate(&self, text: &str, location: &str) -> Result<String> {
        if !text.contains('$') {
            return Ok(text.to_string());
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            out.push_str(&text[last..whole.start()]);
            out.push_str(&self.expand(&caps, location)?);
            last = whole.end();
        }
        out.push_str(&text[last..]);
        Ok(out)
    }

    fn expand(&self, caps: &Captures<'_>, location: &str) -> Result<String> {
        let Some(variable) = caps.get(1) else {
            return Ok("${".to_string());
        };
        match (self.lookup(variable.as_str())?, caps.get(2)) {
            (Some(value), _) => Ok(value),
            (None, Some(default)) => Ok(default.as_str().to_string()),
            (None, None) => Err(Error::missing_env(variable.as_str(), location)),
        }
    }

    /// Expand placeholders in every string nested inside `value`
    pub fn interpolate_value(&self, value: Value, location: &str) -> Result<Value> {
        match value {
            Value::String(text) => Ok(Value::String(self.interpolate(&text, location)?)),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| self.interpolate_value(item, &format!("{location}[{i}]")))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Value::Object(map) => map
                .into_iter()
                .map(|(key, item)| {
                    let nested = format!("{location}.{key}");
                    self.interpolate_value(item, &nested).map(|v| (key, v))
                })
                .collect::<Result<serde_json::Map<_, _>>>()
                .map(Value::Object),
            other => Ok(other),
        }
    }
}
