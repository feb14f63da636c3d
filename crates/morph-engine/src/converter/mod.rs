//! Scalar conversion: primitives, wrappers, big numbers, dates, strings,
//! enumerations, and the string-constructor fallback.

mod dates;
mod scalar;

use moka::sync::Cache;

use morph_core::errors::MappingResult;
use morph_core::model::{TypeRef, TypeRegistry, Value};

pub use dates::{format_calendar, format_date, parse_calendar, parse_date};

/// How values are produced for a destination type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConverterKind {
    Passthrough,
    Bool,
    Integral,
    Floating,
    Char,
    String,
    BigDecimal,
    BigInteger,
    Date,
    Calendar,
    Enum,
    StringConstructor,
}

/// Converts scalar values to a destination type. The converter chosen for
/// each destination type is resolved once and cached.
pub struct TypeConverter {
    kinds: Cache<TypeRef, ConverterKind>,
}

impl TypeConverter {
    pub fn new(capacity: Option<u64>) -> Self {
        let kinds = match capacity {
            Some(max) => Cache::new(max),
            None => Cache::builder().build(),
        };
        Self { kinds }
    }

    /// Convert `value` to `dest`. Null, and the empty string bound for a
    /// non-string type, convert to null.
    pub fn convert(
        &self,
        value: &Value,
        dest: &TypeRef,
        date_format: &str,
        types: &TypeRegistry,
    ) -> MappingResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        if value.as_str() == Some("") && *dest != TypeRef::String {
            return Ok(Value::Null);
        }
        let kind = self
            .kinds
            .get_with(dest.clone(), || classify(dest, types));
        match kind {
            ConverterKind::Passthrough => Ok(value.clone()),
            ConverterKind::Bool => scalar::to_bool(value, dest),
            ConverterKind::Integral => scalar::to_integral(value, dest),
            ConverterKind::Floating => scalar::to_floating(value, dest),
            ConverterKind::Char => scalar::to_char(value, dest),
            ConverterKind::String => Ok(Value::Str(match value {
                Value::Date(d) => format_date(d, date_format),
                Value::Calendar(c) => format_calendar(c, date_format),
                other => other.display_string(),
            })),
            ConverterKind::BigDecimal => scalar::to_big_decimal(value),
            ConverterKind::BigInteger => scalar::to_big_integer(value),
            ConverterKind::Date => dates::to_date(value, date_format),
            ConverterKind::Calendar => dates::to_calendar(value, date_format),
            ConverterKind::Enum => scalar::to_enum(value, dest, types),
            ConverterKind::StringConstructor => string_constructor(value, dest, types),
        }
    }

    pub fn cached_kinds(&self) -> u64 {
        self.kinds.run_pending_tasks();
        self.kinds.entry_count()
    }
}

impl Default for TypeConverter {
    fn default() -> Self {
        Self::new(None)
    }
}

fn classify(dest: &TypeRef, types: &TypeRegistry) -> ConverterKind {
    use morph_core::model::PrimitiveKind as P;
    match dest {
        TypeRef::Any => ConverterKind::Passthrough,
        TypeRef::Primitive(k) | TypeRef::Wrapper(k) => match k {
            P::Bool => ConverterKind::Bool,
            P::Byte | P::Short | P::Int | P::Long => ConverterKind::Integral,
            P::Float | P::Double => ConverterKind::Floating,
            P::Char => ConverterKind::Char,
        },
        TypeRef::String => ConverterKind::String,
        TypeRef::BigDecimal => ConverterKind::BigDecimal,
        TypeRef::BigInteger => ConverterKind::BigInteger,
        TypeRef::Date => ConverterKind::Date,
        TypeRef::Calendar => ConverterKind::Calendar,
        TypeRef::Named(name) if types.is_enum(name.as_str()) => ConverterKind::Enum,
        _ => ConverterKind::StringConstructor,
    }
}

/// Build the destination from the source's text through the destination
/// type's string constructor; without one, the text itself is the result.
fn string_constructor(value: &Value, dest: &TypeRef, types: &TypeRegistry) -> MappingResult<Value> {
    if types.is_value_assignable(dest, value) {
        return Ok(value.clone());
    }
    let text = value.display_string();
    let ctor = dest
        .as_named()
        .and_then(|name| types.get(name.as_str()))
        .and_then(|def| def.string_constructor().cloned());
    match ctor {
        Some(ctor) => Ok(ctor(types, &text)?),
        None => Ok(Value::Str(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morph_core::constants::DEFAULT_DATE_FORMAT;
    use morph_core::errors::{ExtensionError, MappingError};
    use morph_core::model::{PrimitiveKind, TypeDef};

    fn registry() -> TypeRegistry {
        TypeRegistry::new()
            .with(TypeDef::enumeration("Level", ["Low", "High"]).build())
            .with(
                TypeDef::class("Money")
                    .field("amount", TypeRef::String)
                    .string_constructor(|types, text| {
                        if text.is_empty() {
                            return Err(ExtensionError::new("money", "empty"));
                        }
                        let obj = types
                            .instantiate("Money")
                            .map_err(|e| ExtensionError::new("money", e.to_string()))?;
                        obj.set("amount", text);
                        Ok(Value::Object(obj))
                    })
                    .build(),
            )
            .with(TypeDef::class("Plain").build())
    }

    fn convert(v: Value, dest: TypeRef) -> MappingResult<Value> {
        TypeConverter::default().convert(&v, &dest, DEFAULT_DATE_FORMAT, &registry())
    }

    #[test]
    fn null_and_empty_string_become_null() {
        let int = TypeRef::Wrapper(PrimitiveKind::Int);
        assert_eq!(convert(Value::Null, int.clone()).unwrap(), Value::Null);
        assert_eq!(convert(Value::from(""), int).unwrap(), Value::Null);
        assert_eq!(convert(Value::from(""), TypeRef::String).unwrap(), Value::from(""));
    }

    #[test]
    fn numbers_and_strings() {
        let long = TypeRef::Primitive(PrimitiveKind::Long);
        assert_eq!(convert(Value::from(" 42 "), long.clone()).unwrap(), Value::Long(42));
        assert_eq!(convert(Value::Int(7), long).unwrap(), Value::Long(7));
        let err = convert(Value::Long(300), TypeRef::Wrapper(PrimitiveKind::Byte)).unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert_eq!(convert(Value::Double(2.5), TypeRef::String).unwrap(), Value::from("2.5"));
        assert_eq!(
            convert(Value::from("3.25"), TypeRef::Wrapper(PrimitiveKind::Double)).unwrap(),
            Value::Double(3.25)
        );
    }

    #[test]
    fn booleans_and_chars() {
        let b = TypeRef::Primitive(PrimitiveKind::Bool);
        assert_eq!(convert(Value::from("yes"), b.clone()).unwrap(), Value::Bool(true));
        assert_eq!(convert(Value::Int(0), b.clone()).unwrap(), Value::Bool(false));
        assert!(convert(Value::from("maybe"), b).is_err());
        assert_eq!(
            convert(Value::from("xyz"), TypeRef::Wrapper(PrimitiveKind::Char)).unwrap(),
            Value::Char('x')
        );
    }

    #[test]
    fn big_numbers_keep_exact_text() {
        assert_eq!(
            convert(Value::from("1234.5600"), TypeRef::BigDecimal).unwrap(),
            Value::BigDecimal("1234.5600".into())
        );
        assert!(convert(Value::from("12x"), TypeRef::BigDecimal).is_err());
        assert_eq!(
            convert(Value::Long(-9), TypeRef::BigInteger).unwrap(),
            Value::BigInteger(-9)
        );
    }

    #[test]
    fn enums_by_name() {
        let level = TypeRef::named("Level");
        assert_eq!(
            convert(Value::from("High"), level.clone()).unwrap(),
            Value::enum_value("Level", "High")
        );
        let err = convert(Value::from("Medium"), level).unwrap_err();
        assert!(matches!(err, MappingError::Conversion { .. }));
    }

    #[test]
    fn string_constructor_fallback() {
        let money = convert(Value::Int(12), TypeRef::named("Money")).unwrap();
        let obj = money.as_object().unwrap();
        assert_eq!(obj.get("amount"), Some(Value::from("12")));
        assert_eq!(
            convert(Value::Int(12), TypeRef::named("Plain")).unwrap(),
            Value::from("12")
        );
    }

    #[test]
    fn converter_kind_is_cached_per_destination_type() {
        let converter = TypeConverter::default();
        let types = registry();
        let dest = TypeRef::Wrapper(PrimitiveKind::Int);
        for v in ["1", "2", "3"] {
            converter
                .convert(&Value::from(v), &dest, DEFAULT_DATE_FORMAT, &types)
                .unwrap();
        }
        assert_eq!(converter.cached_kinds(), 1);
    }
}
