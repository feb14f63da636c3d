//! Class-map data contract consumed by the engine.

pub mod accessor_spec;
pub mod class_map;
pub mod field_map;
pub mod hints;

pub use accessor_spec::{AccessorKind, AccessorSpec, FieldPath};
pub use class_map::{ClassMap, ClassMapBuilder, ClassMapKey, ConverterDescriptor};
pub use field_map::{
    ConverterRef, FieldMap, FieldMapBuilder, FieldMapKind, FieldSide, RelationshipType,
};
pub use hints::HintContainer;
