//! Error types for the Morph mapping engine.
//! One enum per concern, each carrying a stable error code.

pub mod config_error;
pub mod error_code;
pub mod extension_error;
pub mod mapping_error;

pub use config_error::ConfigError;
pub use error_code::MorphErrorCode;
pub use extension_error::ExtensionError;
pub use mapping_error::{MappingError, MappingResult};
