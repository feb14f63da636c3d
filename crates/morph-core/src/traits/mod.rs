//! Extension points implemented by users of the engine.

pub mod converter;
pub mod creator;
pub mod field_mapper;

pub use converter::{ConversionRequest, CustomConverter};
pub use creator::{BeanCreator, BeanFactory, CreateRequest};
pub use field_mapper::{CustomFieldMapper, FieldMappingRequest};
