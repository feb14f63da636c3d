//! Declared types of fields, hints and class-map sides.

use std::fmt;

use super::type_name::TypeName;

/// Scalar kinds that exist both as non-nullable primitives and nullable wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
}

impl PrimitiveKind {
    pub fn is_integral(&self) -> bool {
        matches!(self, Self::Byte | Self::Short | Self::Int | Self::Long)
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Char => "char",
        }
    }
}

/// A declared type.
///
/// Generic element types on `List` / `Set` / `Collection` are optional and are
/// only used as a last-resort hint; assignability erases them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// Non-nullable scalar.
    Primitive(PrimitiveKind),
    /// Nullable boxed scalar.
    Wrapper(PrimitiveKind),
    String,
    BigDecimal,
    BigInteger,
    Date,
    Calendar,
    /// The universal object type.
    Any,
    /// A registered class, interface or enumeration.
    Named(TypeName),
    Array(Box<TypeRef>),
    List(Option<Box<TypeRef>>),
    Set(Option<Box<TypeRef>>),
    /// Unspecified collection; treated as a list.
    Collection(Option<Box<TypeRef>>),
    Map,
}

impl TypeRef {
    pub fn named(name: impl Into<TypeName>) -> Self {
        Self::Named(name.into())
    }

    pub fn array_of(elem: TypeRef) -> Self {
        Self::Array(Box::new(elem))
    }

    pub fn list_of(elem: TypeRef) -> Self {
        Self::List(Some(Box::new(elem)))
    }

    pub fn set_of(elem: TypeRef) -> Self {
        Self::Set(Some(Box::new(elem)))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    /// Primitive, wrapper, string, big number or date type: handled by the
    /// scalar converter rather than by recursion.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Primitive(_)
                | Self::Wrapper(_)
                | Self::String
                | Self::BigDecimal
                | Self::BigInteger
                | Self::Date
                | Self::Calendar
        )
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    pub fn is_primitive_array(&self) -> bool {
        matches!(self, Self::Array(elem) if elem.is_primitive())
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_) | Self::Collection(_))
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    /// Array, list, set or unspecified collection.
    pub fn is_collection(&self) -> bool {
        self.is_array() || self.is_list() || self.is_set()
    }

    /// Collection or map.
    pub fn is_container(&self) -> bool {
        self.is_collection() || self.is_map()
    }

    pub fn as_named(&self) -> Option<&TypeName> {
        match self {
            Self::Named(n) => Some(n),
            _ => None,
        }
    }

    /// Declared element type of a collection, if any.
    pub fn element_type(&self) -> Option<&TypeRef> {
        match self {
            Self::Array(elem) => Some(elem),
            Self::List(elem) | Self::Set(elem) | Self::Collection(elem) => elem.as_deref(),
            _ => None,
        }
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<TypeName> for TypeRef {
    fn from(name: TypeName) -> Self {
        Self::Named(name)
    }
}

impl From<&TypeName> for TypeRef {
    fn from(name: &TypeName) -> Self {
        Self::Named(name.clone())
    }
}

impl From<&TypeRef> for TypeRef {
    fn from(t: &TypeRef) -> Self {
        t.clone()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn generic(f: &mut fmt::Formatter<'_>, base: &str, elem: &Option<Box<TypeRef>>) -> fmt::Result {
            match elem {
                Some(e) => write!(f, "{base}<{e}>"),
                None => f.write_str(base),
            }
        }
        match self {
            Self::Primitive(k) => f.write_str(k.name()),
            Self::Wrapper(k) => write!(f, "{}?", k.name()),
            Self::String => f.write_str("String"),
            Self::BigDecimal => f.write_str("BigDecimal"),
            Self::BigInteger => f.write_str("BigInteger"),
            Self::Date => f.write_str("Date"),
            Self::Calendar => f.write_str("Calendar"),
            Self::Any => f.write_str("Any"),
            Self::Named(n) => write!(f, "{n}"),
            Self::Array(e) => write!(f, "{e}[]"),
            Self::List(e) => generic(f, "List", e),
            Self::Set(e) => generic(f, "Set", e),
            Self::Collection(e) => generic(f, "Collection", e),
            Self::Map => f.write_str("Map"),
        }
    }
}
