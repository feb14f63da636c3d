//! Configuration loading errors.

use super::error_code::{self, MorphErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl MorphErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::TomlParse(_) => error_code::CONFIG_PARSE_ERROR,
            Self::Io(_) => error_code::IO_ERROR,
            Self::InvalidValue { .. } => error_code::CONFIGURATION_ERROR,
        }
    }
}
