//! Event handler trait. Every method defaults to a no-op, so handlers only
//! override what they observe.

use super::types::MappingEvent;

pub trait MappingEventHandler: Send + Sync {
    fn on_mapping_started(&self, _event: &MappingEvent<'_>) {}

    fn on_pre_write_destination_value(&self, _event: &MappingEvent<'_>) {}

    fn on_post_write_destination_value(&self, _event: &MappingEvent<'_>) {}

    fn on_mapping_finished(&self, _event: &MappingEvent<'_>) {}
}
