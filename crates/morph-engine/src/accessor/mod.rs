//! Field access: resolves each path step of a field map to a concrete
//! accessor once per owner type and caches it.

mod handle;

use std::sync::Arc;

use moka::sync::Cache;

use morph_core::classmap::accessor_spec::SELF_PATH;
use morph_core::classmap::{AccessorKind, AccessorSpec, FieldMap, FieldSide};
use morph_core::errors::{MappingError, MappingResult};
use morph_core::model::{TypeRef, TypeRegistry, Value, Visibility};

use handle::{empty_container, read_element, write_element, StepHandle};

pub(crate) use handle::empty_container as new_container;

/// Which side of a field map is being accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Src,
    Dest,
}

/// (field map id, side, step index, owner type)
type AccessorKey = (u64, Side, usize, TypeRef);

/// Resolves field-map sides to read/write handles, once per field map and
/// owner type.
pub struct AccessorResolver {
    types: Arc<TypeRegistry>,
    handles: Cache<AccessorKey, Arc<StepHandle>>,
}

impl AccessorResolver {
    pub fn new(types: Arc<TypeRegistry>) -> Self {
        Self {
            types,
            handles: Cache::builder().build(),
        }
    }

    fn side(fm: &FieldMap, side: Side) -> &FieldSide {
        match side {
            Side::Src => fm.src(),
            Side::Dest => fm.dest(),
        }
    }

    fn deep_hint(fs: &FieldSide, step: usize) -> Option<TypeRef> {
        fs.deep_hints
            .as_ref()
            .and_then(|h| h.hints().get(step).cloned())
    }

    fn handle(
        &self,
        fm: &FieldMap,
        side: Side,
        step: usize,
        owner_type: &TypeRef,
        spec: &AccessorSpec,
    ) -> MappingResult<Arc<StepHandle>> {
        let key = (fm.id(), side, step, owner_type.clone());
        if let Some(found) = self.handles.get(&key) {
            return Ok(found);
        }
        let resolved = Arc::new(self.resolve_step(owner_type, spec)?);
        Ok(self
            .handles
            .entry(key)
            .or_insert_with(|| resolved)
            .into_value())
    }

    fn resolve_step(&self, owner_type: &TypeRef, spec: &AccessorSpec) -> MappingResult<StepHandle> {
        match &spec.kind {
            AccessorKind::SelfRef => Ok(StepHandle::SelfRef),
            AccessorKind::MapEntry { .. } => {
                let container = if owner_type.is_map() || spec.name == SELF_PATH {
                    None
                } else {
                    Some(Arc::new(self.resolve_property(owner_type, &spec.name, None, None)?))
                };
                Ok(StepHandle::MapEntry {
                    container,
                    key: spec.map_key().to_string(),
                })
            }
            _ if owner_type.is_map() => Ok(StepHandle::MapEntry {
                container: None,
                key: spec.name.clone(),
            }),
            AccessorKind::Field => {
                let ty = self.owner_name(owner_type, &spec.name)?;
                self.types
                    .find_field(ty, &spec.name)
                    .map(|f| StepHandle::Field {
                        name: spec.name.clone(),
                        ty: f.ty,
                    })
                    .ok_or_else(|| MappingError::access(ty, spec.name.as_str(), "no such field"))
            }
            AccessorKind::Property { getter, setter } => {
                self.resolve_property(owner_type, &spec.name, getter.as_deref(), setter.as_deref())
            }
        }
    }

    fn owner_name<'t>(&self, owner_type: &'t TypeRef, member: &str) -> MappingResult<&'t str> {
        owner_type.as_named().map(|n| n.as_str()).ok_or_else(|| {
            MappingError::access(owner_type.to_string(), member, "owner is not an object type")
        })
    }

    fn resolve_property(
        &self,
        owner_type: &TypeRef,
        name: &str,
        getter: Option<&str>,
        setter: Option<&str>,
    ) -> MappingResult<StepHandle> {
        let ty = self.owner_name(owner_type, name)?;
        let getter = match getter {
            Some(method) => Some(
                self.types
                    .find_getter(ty, method)
                    .ok_or_else(|| MappingError::access(ty, method, "no such getter"))?,
            ),
            None => self.types.property_getter(ty, name),
        };
        let setter = match setter {
            Some(method) => Some(
                self.types
                    .find_setter(ty, method)
                    .ok_or_else(|| MappingError::access(ty, method, "no such setter"))?,
            ),
            None => self.types.property_setter(ty, name),
        };
        let field = self
            .types
            .find_field(ty, name)
            .filter(|f| f.visibility == Visibility::Public)
            .map(|f| f.ty);
        if getter.is_none() && setter.is_none() && field.is_none() {
            return Err(MappingError::access(ty, name, "no accessible property"));
        }
        Ok(StepHandle::Property {
            name: name.to_string(),
            getter,
            setter,
            field,
        })
    }

    fn read_step(&self, h: &StepHandle, spec: &AccessorSpec, owner: &Value) -> MappingResult<Value> {
        let v = h.read(owner)?;
        Ok(match spec.index {
            Some(i) => read_element(&v, i),
            None => v,
        })
    }

    fn write_step(
        &self,
        h: &StepHandle,
        spec: &AccessorSpec,
        owner: &Value,
        value: Value,
    ) -> MappingResult<()> {
        let Some(index) = spec.index else {
            return h.write(owner, value, &self.types);
        };
        let mut container = h.read(owner)?;
        if container.is_null() {
            let ty = h.write_type(owner);
            container = empty_container(&ty).ok_or_else(|| {
                MappingError::access(ty.to_string(), spec.name.as_str(), "not a collection")
            })?;
            h.write(owner, container.clone(), &self.types)?;
        }
        write_element(&container, index, value)
    }

    fn step_type(h: &StepHandle, spec: &AccessorSpec, owner: &Value, writing: bool) -> TypeRef {
        let ty = if writing {
            h.write_type(owner)
        } else {
            h.read_type(owner)
        };
        match spec.index {
            Some(_) => ty.element_type().cloned().unwrap_or(TypeRef::Any),
            None => ty,
        }
    }

    /// Read the value at the end of the path. A null intermediate reads as null.
    pub fn read(&self, fm: &FieldMap, side: Side, owner: &Value) -> MappingResult<Value> {
        let mut cur = owner.clone();
        for (i, spec) in Self::side(fm, side).path.steps().iter().enumerate() {
            if cur.is_null() {
                return Ok(Value::Null);
            }
            let h = self.handle(fm, side, i, &cur.runtime_type(), spec)?;
            cur = self.read_step(&h, spec, &cur)?;
        }
        Ok(cur)
    }

    /// Write the value at the end of the path, creating missing intermediate
    /// objects with `create` from their deep hint or declared type.
    pub fn write(
        &self,
        fm: &FieldMap,
        side: Side,
        owner: &Value,
        value: Value,
        create: &dyn Fn(&TypeRef) -> MappingResult<Value>,
    ) -> MappingResult<()> {
        let fs = Self::side(fm, side);
        let Some((last, parents)) = fs.path.steps().split_last() else {
            return Ok(());
        };
        let mut cur = owner.clone();
        for (i, spec) in parents.iter().enumerate() {
            let h = self.handle(fm, side, i, &cur.runtime_type(), spec)?;
            let mut next = self.read_step(&h, spec, &cur)?;
            if next.is_null() {
                let ty = Self::deep_hint(fs, i)
                    .unwrap_or_else(|| Self::step_type(&h, spec, &cur, false));
                next = create(&ty)?;
                self.write_step(&h, spec, &cur, next.clone())?;
            }
            cur = next;
        }
        let h = self.handle(fm, side, parents.len(), &cur.runtime_type(), last)?;
        self.write_step(&h, last, &cur, value)
    }

    /// Declared type at the end of the path. On the destination side a
    /// setter's parameter type takes precedence over the getter's.
    pub fn field_type(&self, fm: &FieldMap, side: Side, owner: &Value) -> MappingResult<TypeRef> {
        let fs = Self::side(fm, side);
        let steps = fs.path.steps();
        let mut cur = owner.clone();
        let mut cur_type = owner.runtime_type();
        for (i, spec) in steps.iter().enumerate() {
            let h = self.handle(fm, side, i, &cur_type, spec)?;
            if i + 1 == steps.len() {
                return Ok(Self::step_type(&h, spec, &cur, side == Side::Dest));
            }
            let next = if cur.is_null() {
                Value::Null
            } else {
                self.read_step(&h, spec, &cur)?
            };
            cur_type = if next.is_null() {
                Self::deep_hint(fs, i).unwrap_or_else(|| Self::step_type(&h, spec, &cur, false))
            } else {
                next.runtime_type()
            };
            cur = next;
        }
        Ok(TypeRef::Any)
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn cached_handles(&self) -> u64 {
        self.handles.run_pending_tasks();
        self.handles.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morph_core::classmap::HintContainer;
    use morph_core::errors::ExtensionError;
    use morph_core::model::{PrimitiveKind, TypeDef};

    fn types() -> Arc<TypeRegistry> {
        Arc::new(
            TypeRegistry::new()
                .with(
                    TypeDef::class("Person")
                        .field("name", TypeRef::String)
                        .field("age", TypeRef::Primitive(PrimitiveKind::Int))
                        .field("address", TypeRef::named("Address"))
                        .field("tags", TypeRef::list_of(TypeRef::String))
                        .field("attrs", TypeRef::Map)
                        .private_field("secret", TypeRef::String)
                        .setter("set_nick", TypeRef::String, |o, v| {
                            if v.as_str() == Some("bad") {
                                return Err(ExtensionError::new("nick", "rejected"));
                            }
                            o.set("name", v);
                            Ok(())
                        })
                        .build(),
                )
                .with(TypeDef::class("Address").field("city", TypeRef::String).build()),
        )
    }

    fn person(types: &TypeRegistry) -> Value {
        Value::Object(types.instantiate("Person").unwrap())
    }

    fn fm(src: &str, dest: &str) -> FieldMap {
        FieldMap::builder(src, dest).build().unwrap()
    }

    fn creator(types: Arc<TypeRegistry>) -> impl Fn(&TypeRef) -> MappingResult<Value> {
        move |ty: &TypeRef| match ty.as_named() {
            Some(n) => types.instantiate(n.as_str()).map(Value::Object),
            None => Ok(new_container(ty).unwrap_or_default()),
        }
    }

    #[test]
    fn deep_read_through_null_is_null() {
        let types = types();
        let resolver = AccessorResolver::new(types.clone());
        let p = person(&types);
        let v = resolver.read(&fm("address.city", "x"), Side::Src, &p).unwrap();
        assert!(v.is_null());
    }

    #[test]
    fn deep_write_creates_intermediates() {
        let types = types();
        let resolver = AccessorResolver::new(types.clone());
        let p = person(&types);
        let map = fm("x", "address.city");
        resolver
            .write(&map, Side::Dest, &p, Value::from("Oslo"), &creator(types.clone()))
            .unwrap();
        assert_eq!(resolver.read(&map, Side::Dest, &p).unwrap(), Value::from("Oslo"));
        assert_eq!(
            resolver.field_type(&map, Side::Dest, &p).unwrap(),
            TypeRef::String
        );
    }

    #[test]
    fn indexed_write_grows_the_list() {
        let types = types();
        let resolver = AccessorResolver::new(types.clone());
        let p = person(&types);
        let map = fm("x", "tags[2]");
        resolver
            .write(&map, Side::Dest, &p, Value::from("c"), &creator(types.clone()))
            .unwrap();
        let tags = p.as_object().unwrap().get("tags").unwrap();
        assert_eq!(tags, Value::list(vec![Value::Null, Value::Null, Value::from("c")]));
        assert!(resolver.read(&fm("tags[9]", "x"), Side::Src, &p).unwrap().is_null());
    }

    #[test]
    fn null_into_primitive_is_a_no_op() {
        let types = types();
        let resolver = AccessorResolver::new(types.clone());
        let p = person(&types);
        p.as_object().unwrap().set("age", 41);
        resolver
            .write(&fm("x", "age"), Side::Dest, &p, Value::Null, &creator(types.clone()))
            .unwrap();
        assert_eq!(p.as_object().unwrap().get("age"), Some(Value::Int(41)));
    }

    #[test]
    fn type_mismatch_is_an_access_error() {
        let types = types();
        let resolver = AccessorResolver::new(types.clone());
        let p = person(&types);
        let err = resolver
            .write(&fm("x", "name"), Side::Dest, &p, Value::Int(3), &creator(types.clone()))
            .unwrap_err();
        assert!(matches!(err, MappingError::ReflectionAccess { .. }));
    }

    #[test]
    fn private_fields_need_direct_access() {
        let types = types();
        let resolver = AccessorResolver::new(types.clone());
        let p = person(&types);
        assert!(resolver.read(&fm("secret", "x"), Side::Src, &p).is_err());
        let direct = FieldMap::builder("secret", "x").src_direct().build().unwrap();
        assert!(resolver.read(&direct, Side::Src, &p).unwrap().is_null());
    }

    #[test]
    fn setter_errors_surface_as_extension_errors() {
        let types = types();
        let resolver = AccessorResolver::new(types.clone());
        let p = person(&types);
        let map = fm("x", "nick");
        let err = resolver
            .write(&map, Side::Dest, &p, Value::from("bad"), &creator(types.clone()))
            .unwrap_err();
        assert_eq!(err.extension_cause().map(|e| e.kind()), Some("nick"));
        resolver
            .write(&map, Side::Dest, &p, Value::from("ok"), &creator(types.clone()))
            .unwrap();
        assert_eq!(p.as_object().unwrap().get("name"), Some(Value::from("ok")));
    }

    #[test]
    fn map_entries_on_properties_and_map_owners() {
        let types = types();
        let resolver = AccessorResolver::new(types.clone());
        let p = person(&types);
        let keyed = FieldMap::builder("x", "attrs")
            .dest_map_key(Some("color"))
            .build()
            .unwrap();
        resolver
            .write(&keyed, Side::Dest, &p, Value::from("red"), &creator(types.clone()))
            .unwrap();
        let attrs = p.as_object().unwrap().get("attrs").unwrap();
        let read = resolver
            .read(&fm("color", "x"), Side::Src, &attrs)
            .unwrap();
        assert_eq!(read, Value::from("red"));
    }

    #[test]
    fn deep_hints_choose_intermediate_types() {
        let types = types();
        let resolver = AccessorResolver::new(types.clone());
        let p = person(&types);
        let map = FieldMap::builder("x", "attrs.size")
            .dest_deep_hint(HintContainer::single(TypeRef::Map))
            .build()
            .unwrap();
        resolver
            .write(&map, Side::Dest, &p, Value::Int(3), &creator(types.clone()))
            .unwrap();
        assert_eq!(resolver.read(&map, Side::Dest, &p).unwrap(), Value::Int(3));
        assert!(resolver.cached_handles() >= 2);
    }
}
