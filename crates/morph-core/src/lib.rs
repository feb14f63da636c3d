//! # morph-core
//!
//! Foundation crate for the Morph mapping engine.
//! Defines the object model, the class-map contract, errors, config, events,
//! statistics, extension traits, tracing setup and constants.

pub mod classmap;
pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod model;
pub mod telemetry;
pub mod tracing;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use classmap::{ClassMap, ClassMapKey, FieldMap, HintContainer, RelationshipType};
pub use config::MorphConfig;
pub use errors::error_code::MorphErrorCode;
pub use errors::{ExtensionError, MappingError, MappingResult};
pub use events::{EventDispatcher, MappingEventHandler};
pub use model::{ObjectRef, TypeDef, TypeName, TypeRef, TypeRegistry, Value};
pub use telemetry::{MappingStatistics, StatisticsSink};
