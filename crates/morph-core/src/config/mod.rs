//! Configuration, loadable from TOML.

pub mod engine_config;
pub mod logging_config;
pub mod mapping_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use engine_config::{EngineConfig, MemoScope};
pub use logging_config::LoggingConfig;
pub use mapping_config::MappingConfig;

use crate::errors::ConfigError;

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MorphConfig {
    pub mapping: MappingConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

impl MorphConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(format) = &self.mapping.date_format {
            if format.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "mapping.date_format".into(),
                    message: "must not be empty".into(),
                });
            }
        }
        if self.engine.converter_cache_capacity == Some(0)
            || self.engine.super_type_cache_capacity == Some(0)
        {
            return Err(ConfigError::InvalidValue {
                key: "engine".into(),
                message: "cache capacities must be positive".into(),
            });
        }
        Ok(())
    }
}
