use serde::{Deserialize, Serialize};

use crate::classmap::{ClassMap, FieldMap};
use crate::model::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingEventType {
    MappingStarted,
    PreWritingDestinationValue,
    PostWritingDestinationValue,
    MappingFinished,
}

/// Payload of every lifecycle notification. `field_map` and `value` are set
/// only for the write events.
#[derive(Debug, Clone, Copy)]
pub struct MappingEvent<'a> {
    pub event_type: MappingEventType,
    pub class_map: &'a ClassMap,
    pub field_map: Option<&'a FieldMap>,
    pub source: &'a Value,
    pub destination: &'a Value,
    pub value: Option<&'a Value>,
}
