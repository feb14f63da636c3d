//! Per-field first-refusal hook.

use crate::classmap::{ClassMap, FieldMap};
use crate::errors::ExtensionError;
use crate::model::Value;

pub struct FieldMappingRequest<'a> {
    pub source: &'a Value,
    pub destination: &'a Value,
    pub source_field_value: &'a Value,
    pub class_map: &'a ClassMap,
    pub field_map: &'a FieldMap,
}

/// Invoked once per non-excluded field before built-in dispatch.
/// Returning `true` marks the field as handled.
pub trait CustomFieldMapper: Send + Sync {
    fn map_field(&self, req: &FieldMappingRequest<'_>) -> Result<bool, ExtensionError>;
}

impl<F> CustomFieldMapper for F
where
    F: Fn(&FieldMappingRequest<'_>) -> Result<bool, ExtensionError> + Send + Sync,
{
    fn map_field(&self, req: &FieldMappingRequest<'_>) -> Result<bool, ExtensionError> {
        self(req)
    }
}
