//! Compilation settings.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// What to do with an array nested inside an array filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NestedArrayPolicy {
    /// Flatten every level and log a deprecation warning
    #[default]
    Flatten,
    /// Fail with `BuildError::NestedArray`
    Reject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub nested_array_policy: NestedArrayPolicy,
}

impl BuilderConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse builder config")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json_str(&json)
    }
}
