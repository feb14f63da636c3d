//! Dynamic object model: type metadata plus the value graph the engine walks.

pub mod object;
pub mod registry;
pub mod type_name;
pub mod typedef;
pub mod types;
pub mod value;

pub use object::{ArrayData, ObjectData, ObjectRef, OrderedMap, OrderedSet, Shared};
pub use registry::TypeRegistry;
pub use type_name::TypeName;
pub use typedef::{
    CreateFn, Equality, FieldDef, GetterFn, SetterFn, StringConstructorFn, TypeDef, TypeDefBuilder,
    TypeKind, Visibility,
};
pub use types::{PrimitiveKind, TypeRef};
pub use value::{EnumValue, Value};
