//! Shared constants.

/// Format used for date and calendar conversions when nothing else is configured.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default tracing filter directive.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable that overrides the configured log filter.
pub const LOG_ENV_VAR: &str = "MORPH_LOG";
