//! # CLI Configuration
//!
//! Optional YAML file passed with the global `--config` flag:
//!
//! ```yaml
//! limits:
//!   max_iterations: 1000
//!   max_cycle_depth: 1000
//! shape_check: true
//! ```
//!
//! Every key is optional. Command-line flags override file values. Limits
//! above `MAX_CONFIGURED_LIMIT` are capped with a warning.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use sszvet_core::{ValidationLimits, MAX_CONFIGURED_LIMIT};

/// Settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Traversal ceilings handed to the validator.
    pub limits: ValidationLimits,
    /// Run the shape pre-filter before decoding.
    pub shape_check: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            limits: ValidationLimits::default(),
            shape_check: true,
        }
    }
}

impl CliConfig {
    /// Load the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        // An empty file is a valid, all-defaults config.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("invalid config file: {}", path.display()))?;
        if config.limits.exceeds_cap() {
            tracing::warn!(
                path = %path.display(),
                max_iterations = config.limits.max_iterations,
                max_cycle_depth = config.limits.max_cycle_depth,
                cap = MAX_CONFIGURED_LIMIT,
                "configured limits capped"
            );
            config.limits = config.limits.clamped();
        }
        Ok(config)
    }

    /// Load `path` when given, otherwise use the defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let config = Self::load(p)?;
                tracing::debug!(path = %p.display(), ?config, "loaded configuration");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }
}
