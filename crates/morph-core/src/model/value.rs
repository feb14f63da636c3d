//! The dynamic value graph.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime};

use super::object::{ArrayData, ObjectRef, OrderedMap, OrderedSet, Shared};
use super::type_name::TypeName;
use super::typedef::Equality;
use super::types::{PrimitiveKind, TypeRef};
use crate::constants::DEFAULT_DATE_FORMAT;

/// A case of a registered enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub type_name: TypeName,
    pub variant: String,
}

/// A node of an object graph.
///
/// Scalars are plain values. `Object`, `List`, `Set`, `Map` and `Array` are
/// shared handles: cloning keeps identity, which is what cycle detection and
/// in-place merging rely on.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Str(String),
    /// Exact decimal text, e.g. "1234.5600".
    BigDecimal(String),
    BigInteger(i128),
    Date(NaiveDateTime),
    Calendar(DateTime<FixedOffset>),
    Enum(EnumValue),
    Object(ObjectRef),
    List(Shared<Vec<Value>>),
    Set(Shared<OrderedSet>),
    Map(Shared<OrderedMap>),
    Array(Shared<ArrayData>),
}

impl Value {
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::List(Shared::new(items.into_iter().collect()))
    }

    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Self::Set(Shared::new(OrderedSet::from_values(items)))
    }

    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in entries {
            map.insert(k, v);
        }
        Self::Map(Shared::new(map))
    }

    pub fn array(elem: TypeRef, items: impl IntoIterator<Item = Value>) -> Self {
        Self::Array(Shared::new(ArrayData {
            elem,
            items: items.into_iter().collect(),
        }))
    }

    pub fn enum_value(type_name: impl Into<TypeName>, variant: impl Into<String>) -> Self {
        Self::Enum(EnumValue {
            type_name: type_name.into(),
            variant: variant.into(),
        })
    }

    /// Initial value of a primitive slot.
    pub fn zero(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Bool => Self::Bool(false),
            PrimitiveKind::Byte => Self::Byte(0),
            PrimitiveKind::Short => Self::Short(0),
            PrimitiveKind::Int => Self::Int(0),
            PrimitiveKind::Long => Self::Long(0),
            PrimitiveKind::Float => Self::Float(0.0),
            PrimitiveKind::Double => Self::Double(0.0),
            PrimitiveKind::Char => Self::Char('\0'),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::Str(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral value widened to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Short(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            Self::BigInteger(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Numeric value widened to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            Self::BigDecimal(s) => s.parse().ok(),
            Self::BigInteger(v) => Some(*v as f64),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Byte(_)
                | Self::Short(_)
                | Self::Int(_)
                | Self::Long(_)
                | Self::Float(_)
                | Self::Double(_)
                | Self::BigDecimal(_)
                | Self::BigInteger(_)
        )
    }

    /// Elements of a list, set or array, snapshotted.
    pub fn elements(&self) -> Option<Vec<Value>> {
        match self {
            Self::List(l) => Some(l.read().clone()),
            Self::Set(s) => Some(s.read().as_slice().to_vec()),
            Self::Array(a) => Some(a.read().items.clone()),
            _ => None,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_) | Self::Array(_))
    }

    pub fn is_container(&self) -> bool {
        self.is_collection() || matches!(self, Self::Map(_))
    }

    /// Type of the value as observed at runtime. Boxed scalars report their
    /// wrapper type; `Null` reports `Any`.
    pub fn runtime_type(&self) -> TypeRef {
        match self {
            Self::Null => TypeRef::Any,
            Self::Bool(_) => TypeRef::Wrapper(PrimitiveKind::Bool),
            Self::Byte(_) => TypeRef::Wrapper(PrimitiveKind::Byte),
            Self::Short(_) => TypeRef::Wrapper(PrimitiveKind::Short),
            Self::Int(_) => TypeRef::Wrapper(PrimitiveKind::Int),
            Self::Long(_) => TypeRef::Wrapper(PrimitiveKind::Long),
            Self::Float(_) => TypeRef::Wrapper(PrimitiveKind::Float),
            Self::Double(_) => TypeRef::Wrapper(PrimitiveKind::Double),
            Self::Char(_) => TypeRef::Wrapper(PrimitiveKind::Char),
            Self::Str(_) => TypeRef::String,
            Self::BigDecimal(_) => TypeRef::BigDecimal,
            Self::BigInteger(_) => TypeRef::BigInteger,
            Self::Date(_) => TypeRef::Date,
            Self::Calendar(_) => TypeRef::Calendar,
            Self::Enum(e) => TypeRef::Named(e.type_name.clone()),
            Self::Object(o) => TypeRef::Named(o.type_name()),
            Self::List(_) => TypeRef::List(None),
            Self::Set(_) => TypeRef::Set(None),
            Self::Map(_) => TypeRef::Map,
            Self::Array(a) => TypeRef::Array(Box::new(a.read().elem.clone())),
        }
    }

    /// Reference identity for handle variants; scalars have none.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Self::Object(o) => Some(o.id()),
            Self::List(l) => Some(l.id()),
            Self::Set(s) => Some(s.id()),
            Self::Map(m) => Some(m.id()),
            Self::Array(a) => Some(a.id()),
            _ => None,
        }
    }

    /// Same handle for reference values, equal value for scalars.
    pub fn same_ref(&self, other: &Value) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self == other,
            _ => false,
        }
    }

    /// Textual form used by string conversion and string constructors.
    pub fn display_string(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(v) => v.to_string(),
            Self::Byte(v) => v.to_string(),
            Self::Short(v) => v.to_string(),
            Self::Int(v) => v.to_string(),
            Self::Long(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Double(v) => v.to_string(),
            Self::Char(v) => v.to_string(),
            Self::Str(s) => s.clone(),
            Self::BigDecimal(s) => s.clone(),
            Self::BigInteger(v) => v.to_string(),
            Self::Date(d) => d.format(DEFAULT_DATE_FORMAT).to_string(),
            Self::Calendar(c) => c.to_rfc3339(),
            Self::Enum(e) => e.variant.clone(),
            Self::Object(o) => format!("{o:?}"),
            other => format!("{other:?}"),
        }
    }
}

fn objects_equal(a: &ObjectRef, b: &ObjectRef) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    let def = a.type_def();
    match def.equality() {
        Equality::Identity => false,
        Equality::Fields(fields) => {
            a.type_name() == b.type_name() && fields.iter().all(|f| a.get(f) == b.get(f))
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Byte(a), Self::Byte(b)) => a == b,
            (Self::Short(a), Self::Short(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::BigDecimal(a), Self::BigDecimal(b)) => a == b,
            (Self::BigInteger(a), Self::BigInteger(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Calendar(a), Self::Calendar(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => objects_equal(a, b),
            (Self::List(a), Self::List(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let left = a.read().clone();
                let right = b.read().clone();
                left == right
            }
            (Self::Set(a), Self::Set(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let left = a.read().clone();
                let right = b.read().clone();
                left.len() == right.len() && left.iter().all(|v| right.contains(v))
            }
            (Self::Map(a), Self::Map(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let left = a.read().clone();
                let right = b.read().clone();
                left.len() == right.len() && left.iter().all(|(k, v)| right.get(k) == Some(v))
            }
            (Self::Array(a), Self::Array(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let left = a.read().items.clone();
                let right = b.read().items.clone();
                left == right
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::BigDecimal(s) => write!(f, "{s}bd"),
            Self::Enum(e) => write!(f, "{}::{}", e.type_name, e.variant),
            Self::Object(o) => write!(f, "{o:?}"),
            Self::List(l) => f.debug_list().entries(l.read().iter()).finish(),
            Self::Set(s) => f.debug_set().entries(s.read().iter()).finish(),
            Self::Map(m) => f.debug_map().entries(m.read().iter()).finish(),
            Self::Array(a) => {
                let data = a.read();
                write!(f, "{}", data.elem)?;
                f.debug_list().entries(data.items.iter()).finish()
            }
            Self::Date(d) => write!(f, "{d}"),
            Self::Calendar(c) => write!(f, "{}", c.to_rfc3339()),
            scalar => f.write_str(&scalar.display_string()),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Self::$variant(v)
            }
        })*
    };
}

value_from! {
    bool => Bool,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    char => Char,
    String => Str,
    i128 => BigInteger,
    NaiveDateTime => Date,
    DateTime<FixedOffset> => Calendar,
    EnumValue => Enum,
    ObjectRef => Object,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<&ObjectRef> for Value {
    fn from(v: &ObjectRef) -> Self {
        Self::Object(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_compare_by_value_and_kind() {
        assert_eq!(Value::from(3), Value::Int(3));
        assert_ne!(Value::Int(3), Value::Long(3));
        assert_eq!(Value::from("a"), Value::Str("a".into()));
        assert!(Value::from(None::<i32>).is_null());
    }

    #[test]
    fn containers_compare_by_content_but_keep_identity() {
        let a = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(a, b);
        assert!(!a.same_ref(&b));
        assert!(a.same_ref(&a.clone()));
    }

    #[test]
    fn sets_ignore_order_and_duplicates() {
        let a = Value::set(vec![Value::Int(1), Value::Int(2), Value::Int(1)]);
        let b = Value::set(vec![Value::Int(2), Value::Int(1)]);
        assert_eq!(a, b);
        if let Value::Set(s) = &a {
            assert_eq!(s.read().len(), 2);
        }
    }

    #[test]
    fn runtime_types() {
        assert_eq!(Value::Int(1).runtime_type(), TypeRef::Wrapper(PrimitiveKind::Int));
        assert_eq!(Value::Null.runtime_type(), TypeRef::Any);
        assert_eq!(
            Value::array(TypeRef::Primitive(PrimitiveKind::Int), vec![]).runtime_type(),
            TypeRef::array_of(TypeRef::Primitive(PrimitiveKind::Int))
        );
        assert_eq!(Value::enum_value("Color", "Red").runtime_type(), TypeRef::named("Color"));
    }

    #[test]
    fn map_insert_replaces_in_place() {
        let m = Value::map(vec![
            (Value::from("a"), Value::Int(1)),
            (Value::from("b"), Value::Int(2)),
        ]);
        if let Value::Map(m) = &m {
            let prev = m.write().insert(Value::from("a"), Value::Int(9));
            assert_eq!(prev, Some(Value::Int(1)));
            let keys: Vec<_> = m.read().keys().cloned().collect();
            assert_eq!(keys, vec![Value::from("a"), Value::from("b")]);
            assert_eq!(m.read().get_str("a"), Some(&Value::Int(9)));
        }
    }
}
