//! Fan-out of lifecycle events to registered handlers.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use super::handler::MappingEventHandler;
use super::types::{MappingEvent, MappingEventType};

/// Delivers events to handlers in registration order. A panicking handler is
/// logged and skipped; it never aborts the mapping.
#[derive(Default, Clone)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn MappingEventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn MappingEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn emit(&self, event: &MappingEvent<'_>) {
        for handler in &self.handlers {
            let result = catch_unwind(AssertUnwindSafe(|| match event.event_type {
                MappingEventType::MappingStarted => handler.on_mapping_started(event),
                MappingEventType::PreWritingDestinationValue => {
                    handler.on_pre_write_destination_value(event)
                }
                MappingEventType::PostWritingDestinationValue => {
                    handler.on_post_write_destination_value(event)
                }
                MappingEventType::MappingFinished => handler.on_mapping_finished(event),
            }));
            if result.is_err() {
                tracing::warn!(
                    event = ?event.event_type,
                    class_map = %event.class_map.describe(),
                    "event handler panicked"
                );
            }
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classmap::ClassMap;
    use crate::model::Value;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<MappingEventType>>,
    }

    impl MappingEventHandler for Recorder {
        fn on_mapping_started(&self, event: &MappingEvent<'_>) {
            self.seen.lock().push(event.event_type);
        }

        fn on_mapping_finished(&self, event: &MappingEvent<'_>) {
            self.seen.lock().push(event.event_type);
        }
    }

    struct Panicky;

    impl MappingEventHandler for Panicky {
        fn on_mapping_started(&self, _event: &MappingEvent<'_>) {
            panic!("handler bug");
        }
    }

    fn event<'a>(cm: &'a ClassMap, null: &'a Value, ty: MappingEventType) -> MappingEvent<'a> {
        MappingEvent {
            event_type: ty,
            class_map: cm,
            field_map: None,
            source: null,
            destination: null,
            value: None,
        }
    }

    #[test]
    fn panics_are_isolated_and_later_handlers_still_run() {
        let cm = ClassMap::builder("A", "B").build().unwrap();
        let recorder = Arc::new(Recorder::default());
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(Arc::new(Panicky));
        dispatcher.register(recorder.clone());

        let null = Value::Null;
        dispatcher.emit(&event(&cm, &null, MappingEventType::MappingStarted));
        dispatcher.emit(&event(&cm, &null, MappingEventType::PreWritingDestinationValue));
        dispatcher.emit(&event(&cm, &null, MappingEventType::MappingFinished));

        assert_eq!(
            *recorder.seen.lock(),
            vec![MappingEventType::MappingStarted, MappingEventType::MappingFinished]
        );
    }
}
