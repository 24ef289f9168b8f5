//! Expander configuration
//!
//! Read from a JSON file, then overridden from the environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `ACLX_USER_NAME` | `user_filter.user_name` |
//! | `ACLX_FIRST_NAME` | `user_filter.first_name` |
//! | `ACLX_LAST_NAME` | `user_filter.last_name` |
//! | `ACLX_PARALLEL` | `parallel` (`true`/`false`/`1`/`0`) |
//! | `ACLX_CHUNK_SIZE` | `chunk_size` |
//! | `ACLX_OUTPUT` | `output` (`tree`/`flat`) |

use crate::error::{ExpansionError, Result};
use crate::sources::UserFilter;
use aclx_core::ClassId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// How results are emitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Grouped user → role → class → leaf
    #[default]
    Tree,
    /// Deduplicated, sorted entry list
    Flat,
}

impl FromStr for OutputFormat {
    type Err = ExpansionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tree" => Ok(OutputFormat::Tree),
            "flat" => Ok(OutputFormat::Flat),
            other => Err(ExpansionError::Config(format!("unknown output format '{}'", other))),
        }
    }
}

/// Expander configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpanderConfig {
    /// Which users to expand
    pub user_filter: UserFilter,

    /// Restrict lists to these classes; empty means all lists
    pub classes: Vec<ClassId>,

    /// Expand disjoint user chunks concurrently
    pub parallel: bool,

    /// Users per chunk in parallel mode
    pub chunk_size: usize,

    pub output: OutputFormat,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            user_filter: UserFilter::default(),
            classes: Vec::new(),
            parallel: false,
            chunk_size: 64,
            output: OutputFormat::Tree,
        }
    }
}

impl ExpanderConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Defaults overridden from the process environment
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up by variable name
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = lookup("ACLX_USER_NAME") {
            self.user_filter.user_name = Some(v);
        }
        if let Some(v) = lookup("ACLX_FIRST_NAME") {
            self.user_filter.first_name = Some(v);
        }
        if let Some(v) = lookup("ACLX_LAST_NAME") {
            self.user_filter.last_name = Some(v);
        }
        if let Some(v) = lookup("ACLX_PARALLEL") {
            self.parallel = parse_bool("ACLX_PARALLEL", &v)?;
        }
        if let Some(v) = lookup("ACLX_CHUNK_SIZE") {
            self.chunk_size = v.trim().parse().map_err(|_| {
                ExpansionError::Config(format!("ACLX_CHUNK_SIZE: '{}' is not a number", v))
            })?;
        }
        if let Some(v) = lookup("ACLX_OUTPUT") {
            self.output = v.parse()?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ExpansionError::Config("chunk_size must be positive".into()));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ExpansionError::Config(format!("{}: '{}' is not a boolean", key, other))),
    }
}
