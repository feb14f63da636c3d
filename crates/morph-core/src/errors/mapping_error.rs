//! Mapping errors.

use super::error_code::{self, MorphErrorCode};
use super::extension_error::ExtensionError;

/// Errors that can occur while mapping one object graph onto another.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Cannot access '{member}' on {type_name}: {message}")]
    ReflectionAccess {
        type_name: String,
        member: String,
        message: String,
    },

    #[error("Cannot convert {value} to {target}: {message}")]
    Conversion {
        value: String,
        target: String,
        message: String,
    },

    #[error("Cannot instantiate {type_name}: {message}")]
    Instantiation { type_name: String, message: String },

    #[error("Invalid mapping request: {message}")]
    InvalidRequest { message: String },

    #[error("Field mapping {src_field} -> {dest_field} failed in {class_map}: {source}")]
    FieldMapping {
        class_map: String,
        src_field: String,
        dest_field: String,
        #[source]
        source: Box<MappingError>,
    },

    #[error(transparent)]
    Extension(#[from] ExtensionError),
}

impl MappingError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn access(
        type_name: impl Into<String>,
        member: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ReflectionAccess {
            type_name: type_name.into(),
            member: member.into(),
            message: message.into(),
        }
    }

    pub fn conversion(
        value: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Conversion {
            value: value.into(),
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn instantiation(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Instantiation {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// The user extension error at the root of this failure, looking through
    /// any fatal field-mapping wrappers.
    pub fn extension_cause(&self) -> Option<&ExtensionError> {
        match self {
            Self::Extension(e) => Some(e),
            Self::FieldMapping { source, .. } => source.extension_cause(),
            _ => None,
        }
    }

    /// Unwrap nested field-mapping wrappers down to the original failure.
    pub fn root_cause(&self) -> &MappingError {
        match self {
            Self::FieldMapping { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Take ownership of the root user extension error, if any.
    pub fn into_extension_cause(self) -> Result<ExtensionError, MappingError> {
        match self {
            Self::Extension(e) => Ok(e),
            Self::FieldMapping { source, .. } if source.extension_cause().is_some() => {
                source.into_extension_cause()
            }
            other => Err(other),
        }
    }
}

impl MorphErrorCode for MappingError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => error_code::CONFIGURATION_ERROR,
            Self::ReflectionAccess { .. } => error_code::REFLECTION_ACCESS_ERROR,
            Self::Conversion { .. } => error_code::CONVERSION_ERROR,
            Self::Instantiation { .. } => error_code::INSTANTIATION_ERROR,
            Self::InvalidRequest { .. } => error_code::INVALID_REQUEST,
            Self::FieldMapping { .. } => error_code::FIELD_MAPPING_FAILED,
            Self::Extension(_) => error_code::EXTENSION_ERROR,
        }
    }
}

/// Convenience type alias.
pub type MappingResult<T> = Result<T, MappingError>;
