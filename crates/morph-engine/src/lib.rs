//! # morph-engine
//!
//! Recursive object-graph mapping on top of `morph-core`: class-map
//! registry and defaults, accessor resolution, scalar conversion, bean
//! creation, collection merging and the [`MappingEngine`] entry points.

pub mod accessor;
mod collections;
pub mod converter;
pub mod creator;
mod dispatch;
pub mod engine;
pub mod lookup;
pub mod registry;
pub mod supertype;

pub use accessor::{AccessorResolver, Side};
pub use converter::TypeConverter;
pub use creator::DefaultBeanCreator;
pub use engine::{MappingEngine, MappingEngineBuilder};
pub use lookup::ConverterLookup;
pub use registry::ClassMapRegistry;
pub use supertype::SuperTypeResolver;
