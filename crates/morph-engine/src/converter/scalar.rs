//! Numeric, boolean, character, big-number and enum conversions.

use morph_core::errors::{MappingError, MappingResult};
use morph_core::model::{PrimitiveKind, TypeRef, TypeRegistry, Value};

fn kind_of(dest: &TypeRef) -> Option<PrimitiveKind> {
    match dest {
        TypeRef::Primitive(k) | TypeRef::Wrapper(k) => Some(*k),
        _ => None,
    }
}

fn fail(value: &Value, dest: impl ToString, message: &str) -> MappingError {
    MappingError::conversion(value.display_string(), dest.to_string(), message)
}

pub(super) fn to_bool(value: &Value, dest: &TypeRef) -> MappingResult<Value> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "n" | "off" | "0" => Ok(Value::Bool(false)),
            _ => Err(fail(value, dest, "not a boolean")),
        },
        Value::Char(c) => match c.to_ascii_lowercase() {
            'y' | 't' | '1' => Ok(Value::Bool(true)),
            'n' | 'f' | '0' => Ok(Value::Bool(false)),
            _ => Err(fail(value, dest, "not a boolean")),
        },
        other => match other.as_i64() {
            Some(1) => Ok(Value::Bool(true)),
            Some(0) => Ok(Value::Bool(false)),
            _ => Err(fail(value, dest, "not a boolean")),
        },
    }
}

/// Integral view of a value: integers as is, floats truncated toward zero,
/// strings parsed, dates as epoch milliseconds.
fn integral(value: &Value) -> Option<i128> {
    match value {
        Value::Byte(_) | Value::Short(_) | Value::Int(_) | Value::Long(_) => {
            value.as_i64().map(i128::from)
        }
        Value::BigInteger(v) => Some(*v),
        Value::Float(_) | Value::Double(_) | Value::BigDecimal(_) => {
            let f = value.as_f64()?;
            f.is_finite().then(|| f.trunc() as i128)
        }
        Value::Str(s) => s.trim().parse::<i128>().ok(),
        Value::Char(c) => c.to_digit(10).map(i128::from),
        Value::Date(d) => Some(i128::from(d.and_utc().timestamp_millis())),
        Value::Calendar(c) => Some(i128::from(c.timestamp_millis())),
        _ => None,
    }
}

pub(super) fn to_integral(value: &Value, dest: &TypeRef) -> MappingResult<Value> {
    let n = integral(value).ok_or_else(|| fail(value, dest, "not an integer"))?;
    let out_of_range = || fail(value, dest, "value out of range");
    match kind_of(dest) {
        Some(PrimitiveKind::Byte) => i8::try_from(n)
            .map(Value::Byte)
            .map_err(|_| out_of_range()),
        Some(PrimitiveKind::Short) => i16::try_from(n)
            .map(Value::Short)
            .map_err(|_| out_of_range()),
        Some(PrimitiveKind::Int) => i32::try_from(n)
            .map(Value::Int)
            .map_err(|_| out_of_range()),
        Some(PrimitiveKind::Long) => i64::try_from(n)
            .map(Value::Long)
            .map_err(|_| out_of_range()),
        _ => Err(fail(value, dest, "not an integral type")),
    }
}

pub(super) fn to_floating(value: &Value, dest: &TypeRef) -> MappingResult<Value> {
    let f = match value {
        Value::Str(s) => s.trim().parse::<f64>().ok(),
        other => other.as_f64(),
    }
    .ok_or_else(|| fail(value, dest, "not a number"))?;
    match kind_of(dest) {
        Some(PrimitiveKind::Float) => Ok(Value::Float(f as f32)),
        Some(PrimitiveKind::Double) => Ok(Value::Double(f)),
        _ => Err(fail(value, dest, "not a floating type")),
    }
}

pub(super) fn to_char(value: &Value, dest: &TypeRef) -> MappingResult<Value> {
    match value {
        Value::Char(c) => Ok(Value::Char(*c)),
        Value::Str(s) => s
            .chars()
            .next()
            .map(Value::Char)
            .ok_or_else(|| fail(value, dest, "empty string")),
        other => other
            .as_i64()
            .and_then(|n| u32::try_from(n).ok())
            .and_then(char::from_u32)
            .map(Value::Char)
            .ok_or_else(|| fail(value, dest, "not a character")),
    }
}

pub(super) fn to_big_decimal(value: &Value) -> MappingResult<Value> {
    let text = match value {
        Value::BigDecimal(s) => s.clone(),
        Value::Str(s) => {
            let t = s.trim();
            if t.parse::<f64>().is_err() {
                return Err(fail(value, TypeRef::BigDecimal, "not a decimal number"));
            }
            t.to_string()
        }
        v if v.is_numeric() => v.display_string(),
        _ => return Err(fail(value, TypeRef::BigDecimal, "not a decimal number")),
    };
    Ok(Value::BigDecimal(text))
}

pub(super) fn to_big_integer(value: &Value) -> MappingResult<Value> {
    match value {
        Value::Date(_) | Value::Calendar(_) | Value::Char(_) => {
            Err(fail(value, TypeRef::BigInteger, "not an integer"))
        }
        other => integral(other)
            .map(Value::BigInteger)
            .ok_or_else(|| fail(value, TypeRef::BigInteger, "not an integer")),
    }
}

/// Enumeration case by name, from a string or another enumeration.
pub(super) fn to_enum(value: &Value, dest: &TypeRef, types: &TypeRegistry) -> MappingResult<Value> {
    let name = match value {
        Value::Enum(e) => e.variant.as_str(),
        Value::Str(s) => s.trim(),
        _ => return Err(fail(value, dest, "not an enumeration name")),
    };
    let Some(def) = dest.as_named().and_then(|n| types.get(n.as_str())) else {
        return Err(fail(value, dest, "unknown enumeration"));
    };
    if def.enum_variants().iter().any(|v| v == name) {
        Ok(Value::enum_value(def.name().clone(), name))
    } else {
        Err(fail(value, dest, "no enumeration case with that name"))
    }
}
