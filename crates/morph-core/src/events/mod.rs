//! Lifecycle notifications.

pub mod dispatcher;
pub mod handler;
pub mod types;

pub use dispatcher::EventDispatcher;
pub use handler::MappingEventHandler;
pub use types::{MappingEvent, MappingEventType};
