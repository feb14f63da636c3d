//! Resolved accessor for one path step on one owner type.

use std::sync::Arc;

use morph_core::errors::{MappingError, MappingResult};
use morph_core::model::{GetterFn, ObjectRef, SetterFn, TypeRef, TypeRegistry, Value};

#[derive(Clone)]
pub(crate) enum StepHandle {
    /// Raw slot access, any visibility.
    Field { name: String, ty: TypeRef },
    /// Getter and/or setter, falling back to a public field.
    Property {
        name: String,
        getter: Option<(TypeRef, GetterFn)>,
        setter: Option<(TypeRef, SetterFn)>,
        field: Option<TypeRef>,
    },
    /// Entry `key` of the map held by `container`, or of the owner itself.
    MapEntry {
        container: Option<Arc<StepHandle>>,
        key: String,
    },
    SelfRef,
}

impl StepHandle {
    /// Declared type seen when reading.
    pub(crate) fn read_type(&self, owner: &Value) -> TypeRef {
        match self {
            Self::Field { ty, .. } => ty.clone(),
            Self::Property {
                getter,
                setter,
                field,
                ..
            } => getter
                .as_ref()
                .map(|(t, _)| t.clone())
                .or_else(|| field.clone())
                .or_else(|| setter.as_ref().map(|(t, _)| t.clone()))
                .unwrap_or(TypeRef::Any),
            Self::MapEntry { .. } => TypeRef::Any,
            Self::SelfRef => owner.runtime_type(),
        }
    }

    /// Declared type expected when writing; a setter's parameter type wins.
    pub(crate) fn write_type(&self, owner: &Value) -> TypeRef {
        match self {
            Self::Property {
                getter,
                setter,
                field,
                ..
            } => setter
                .as_ref()
                .map(|(t, _)| t.clone())
                .or_else(|| field.clone())
                .or_else(|| getter.as_ref().map(|(t, _)| t.clone()))
                .unwrap_or(TypeRef::Any),
            other => other.read_type(owner),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Field { name, .. } | Self::Property { name, .. } => name,
            Self::MapEntry { key, .. } => key,
            Self::SelfRef => "this",
        }
    }

    pub(crate) fn read(&self, owner: &Value) -> MappingResult<Value> {
        if owner.is_null() {
            return Ok(Value::Null);
        }
        match self {
            Self::SelfRef => Ok(owner.clone()),
            Self::Field { name, .. } => {
                let obj = expect_object(owner, name)?;
                obj.get(name).ok_or_else(|| {
                    MappingError::access(obj.type_name().as_str(), name.as_str(), "no such field")
                })
            }
            Self::Property {
                name,
                getter,
                field,
                ..
            } => {
                let obj = expect_object(owner, name)?;
                match (getter, field) {
                    (Some((_, get)), _) => Ok(get(obj)?),
                    (None, Some(_)) => Ok(obj.get(name).unwrap_or_default()),
                    (None, None) => Err(MappingError::access(
                        obj.type_name().as_str(),
                        name.as_str(),
                        "property is not readable",
                    )),
                }
            }
            Self::MapEntry { container, key } => {
                let map = match container {
                    Some(c) => c.read(owner)?,
                    None => owner.clone(),
                };
                match map {
                    Value::Null => Ok(Value::Null),
                    Value::Map(m) => Ok(m.read().get_str(key).cloned().unwrap_or_default()),
                    other => Err(MappingError::access(
                        other.runtime_type().to_string(),
                        key.as_str(),
                        "not a map",
                    )),
                }
            }
        }
    }

    /// Write `value` unless it is a no-op: null into a primitive, or the
    /// value already held.
    pub(crate) fn write(
        &self,
        owner: &Value,
        value: Value,
        types: &TypeRegistry,
    ) -> MappingResult<()> {
        let declared = self.write_type(owner);
        if value.is_null() && declared.is_primitive() {
            return Ok(());
        }
        if self.is_readable() {
            if let Ok(current) = self.read(owner) {
                if current.same_ref(&value) {
                    return Ok(());
                }
            }
        }
        if !types.is_value_assignable(&declared, &value) {
            return Err(MappingError::access(
                owner.runtime_type().to_string(),
                self.name(),
                format!("cannot assign {} to {declared}", value.runtime_type()),
            ));
        }
        match self {
            Self::SelfRef => Err(MappingError::access(
                owner.runtime_type().to_string(),
                "this",
                "cannot replace the owning object",
            )),
            Self::Field { name, .. } => {
                let obj = expect_object(owner, name)?;
                obj.set(name, value);
                Ok(())
            }
            Self::Property {
                name,
                setter,
                field,
                ..
            } => {
                let obj = expect_object(owner, name)?;
                match (setter, field) {
                    (Some((_, set)), _) => Ok(set(obj, value)?),
                    (None, Some(_)) => {
                        obj.set(name, value);
                        Ok(())
                    }
                    (None, None) => Err(MappingError::access(
                        obj.type_name().as_str(),
                        name.as_str(),
                        "property is not writable",
                    )),
                }
            }
            Self::MapEntry { container, key } => {
                let mut map = match container {
                    Some(c) => c.read(owner)?,
                    None => owner.clone(),
                };
                if map.is_null() {
                    if let Some(c) = container {
                        map = Value::map(Vec::new());
                        c.write(owner, map.clone(), types)?;
                    }
                }
                match map {
                    Value::Map(m) => {
                        m.write().insert(Value::Str(key.clone()), value);
                        Ok(())
                    }
                    other => Err(MappingError::access(
                        other.runtime_type().to_string(),
                        key.as_str(),
                        "not a map",
                    )),
                }
            }
        }
    }

    fn is_readable(&self) -> bool {
        match self {
            Self::Property { getter, field, .. } => getter.is_some() || field.is_some(),
            _ => true,
        }
    }
}

fn expect_object<'v>(owner: &'v Value, member: &str) -> MappingResult<&'v ObjectRef> {
    owner.as_object().ok_or_else(|| {
        MappingError::access(
            owner.runtime_type().to_string(),
            member,
            "owner is not an object",
        )
    })
}

/// Element `index` of a list, set or array; out of range reads as null.
pub(crate) fn read_element(container: &Value, index: usize) -> Value {
    match container {
        Value::List(l) => l.read().get(index).cloned(),
        Value::Set(s) => s.read().get(index).cloned(),
        Value::Array(a) => a.read().items.get(index).cloned(),
        _ => None,
    }
    .unwrap_or_default()
}

/// Store element `index`, padding with nulls (or primitive zeros) as needed.
pub(crate) fn write_element(container: &Value, index: usize, value: Value) -> MappingResult<()> {
    match container {
        Value::List(l) => {
            let mut items = l.write();
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            items[index] = value;
            Ok(())
        }
        Value::Set(s) => {
            let mut set = s.write();
            if index < set.len() {
                set.replace(index, value);
            } else {
                set.insert(value);
            }
            Ok(())
        }
        Value::Array(a) => {
            let mut data = a.write();
            if data.items.len() <= index {
                let pad = match &data.elem {
                    TypeRef::Primitive(k) => Value::zero(*k),
                    _ => Value::Null,
                };
                data.items.resize(index + 1, pad);
            }
            data.items[index] = value;
            Ok(())
        }
        other => Err(MappingError::access(
            other.runtime_type().to_string(),
            format!("[{index}]"),
            "not an indexable collection",
        )),
    }
}

/// An empty container of the given declared collection type.
pub(crate) fn empty_container(ty: &TypeRef) -> Option<Value> {
    match ty {
        TypeRef::Array(elem) => Some(Value::array((**elem).clone(), Vec::new())),
        TypeRef::Set(_) => Some(Value::set(Vec::new())),
        TypeRef::List(_) | TypeRef::Collection(_) => Some(Value::list(Vec::new())),
        TypeRef::Map => Some(Value::map(Vec::new())),
        _ => None,
    }
}
