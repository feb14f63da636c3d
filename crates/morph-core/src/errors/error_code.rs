//! Stable error codes shared across crates.

/// Every Morph error exposes a machine-readable code.
pub trait MorphErrorCode {
    fn error_code(&self) -> &'static str;
}

pub const CONFIGURATION_ERROR: &str = "CONFIGURATION_ERROR";
pub const REFLECTION_ACCESS_ERROR: &str = "REFLECTION_ACCESS_ERROR";
pub const CONVERSION_ERROR: &str = "CONVERSION_ERROR";
pub const INSTANTIATION_ERROR: &str = "INSTANTIATION_ERROR";
pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
pub const FIELD_MAPPING_FAILED: &str = "FIELD_MAPPING_FAILED";
pub const EXTENSION_ERROR: &str = "EXTENSION_ERROR";
pub const CONFIG_PARSE_ERROR: &str = "CONFIG_PARSE_ERROR";
pub const IO_ERROR: &str = "IO_ERROR";
