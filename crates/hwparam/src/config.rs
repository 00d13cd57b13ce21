// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Engine configuration.
//!
//! Supports both programmatic and file-based (TOML) configuration.
//!
//! ```toml
//! simulation = false
//! auto_sync = true
//! force_policy = "changed_only"
//! value_space = "raw"
//! output_raw_format = "hex"
//! settings_file = "/var/lib/audio/settings.bin"
//! ```

use crate::access::{ParameterAccessContext, RawFormat, ValueSpace};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which elements a forced re-apply of the same configuration synchronizes.
///
/// When the selected configuration changes, every owned element is
/// synchronized regardless of the policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcePolicy {
    /// Every owned element.
    #[default]
    AllOwned,
    /// Only elements whose stored bytes differ from the live blackboard.
    ChangedOnly,
}

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Resolve syncer locations but skip hardware access.
    #[serde(default)]
    pub simulation: bool,

    /// Synchronize affected syncers on parameter writes and restores.
    #[serde(default = "default_true")]
    pub auto_sync: bool,

    /// Forced apply behaviour.
    #[serde(default)]
    pub force_policy: ForcePolicy,

    /// Default value space for parameter access.
    #[serde(default)]
    pub value_space: ValueSpace,

    /// Raw output format (raw value space only).
    #[serde(default)]
    pub output_raw_format: RawFormat,

    /// Validate domains after a description import.
    #[serde(default = "default_true")]
    pub auto_validate: bool,

    /// Binary settings file used by save/load without an explicit path.
    #[serde(default)]
    pub settings_file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            simulation: false,
            auto_sync: true,
            force_policy: ForcePolicy::default(),
            value_space: ValueSpace::default(),
            output_raw_format: RawFormat::default(),
            auto_validate: true,
            settings_file: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.settings_file {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("settings_file is empty".into()));
            }
        }
        Ok(())
    }

    /// Parameter access context built from the configured defaults.
    pub fn access_context(&self) -> ParameterAccessContext {
        ParameterAccessContext::new(self.value_space, self.output_raw_format)
    }
}
