//! Global mapping policy defaults.

use serde::{Deserialize, Serialize};

use crate::classmap::RelationshipType;
use crate::constants::DEFAULT_DATE_FORMAT;

/// Defaults applied to every class map that leaves a policy unset.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MappingConfig {
    /// chrono format string for date conversions. Default: "%Y-%m-%d %H:%M:%S".
    pub date_format: Option<String>,
    /// Abort the whole call on the first field failure. Default: true.
    pub stop_on_errors: Option<bool>,
    /// Map same-named properties implicitly. Default: true.
    pub wildcard: Option<bool>,
    /// Write null source values. Default: true.
    pub map_null: Option<bool>,
    /// Write empty source strings. Default: true.
    pub map_empty_string: Option<bool>,
    /// Trim source strings before conversion. Default: false.
    pub trim_strings: Option<bool>,
    /// Collection merge policy. Default: cumulative.
    pub relationship_type: Option<RelationshipType>,
    /// Register the reverse of every class map. Default: true.
    pub bidirectional: Option<bool>,
}

impl MappingConfig {
    pub fn effective_date_format(&self) -> &str {
        self.date_format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT)
    }

    pub fn effective_stop_on_errors(&self) -> bool {
        self.stop_on_errors.unwrap_or(true)
    }

    pub fn effective_wildcard(&self) -> bool {
        self.wildcard.unwrap_or(true)
    }

    pub fn effective_map_null(&self) -> bool {
        self.map_null.unwrap_or(true)
    }

    pub fn effective_map_empty_string(&self) -> bool {
        self.map_empty_string.unwrap_or(true)
    }

    pub fn effective_trim_strings(&self) -> bool {
        self.trim_strings.unwrap_or(false)
    }

    pub fn effective_relationship_type(&self) -> RelationshipType {
        self.relationship_type.unwrap_or_default()
    }

    pub fn effective_bidirectional(&self) -> bool {
        self.bidirectional.unwrap_or(true)
    }
}
