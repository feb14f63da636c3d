//! Registered type metadata.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use super::object::ObjectRef;
use super::type_name::TypeName;
use super::typedef::{FieldDef, GetterFn, SetterFn, TypeDef, Visibility};
use super::types::TypeRef;
use super::value::Value;
use crate::errors::{MappingError, MappingResult};

const GETTER_PREFIX: &str = "get_";
const SETTER_PREFIX: &str = "set_";

/// All known types, by name. Built once, then shared read-only by the engine.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    types: FxHashMap<TypeName, Arc<TypeDef>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a type.
    pub fn register(&mut self, def: TypeDef) -> &mut Self {
        self.types.insert(def.name().clone(), Arc::new(def));
        self
    }

    pub fn with(mut self, def: TypeDef) -> Self {
        self.register(def);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TypeDef>> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn require(&self, name: &str) -> MappingResult<&Arc<TypeDef>> {
        self.get(name)
            .ok_or_else(|| MappingError::configuration(format!("unknown type '{name}'")))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Parent chain, nearest first, excluding the type itself.
    pub fn ancestors(&self, name: &str) -> Vec<TypeName> {
        let mut out = Vec::new();
        let mut current = self.get(name).and_then(|d| d.parent().cloned());
        while let Some(parent) = current {
            if out.contains(&parent) {
                break;
            }
            current = self.get(parent.as_str()).and_then(|d| d.parent().cloned());
            out.push(parent);
        }
        out
    }

    /// Every interface implemented by the type, its ancestors, and their
    /// super-interfaces, in discovery order.
    pub fn all_interfaces(&self, name: &str) -> Vec<TypeName> {
        let mut out: Vec<TypeName> = Vec::new();
        let mut seen: FxHashSet<TypeName> = FxHashSet::default();
        let mut pending: Vec<TypeName> = Vec::new();

        let mut chain = vec![TypeName::new(name)];
        chain.extend(self.ancestors(name));
        for ty in &chain {
            if let Some(def) = self.get(ty.as_str()) {
                pending.extend(def.interfaces().iter().cloned());
            }
        }
        let mut i = 0;
        while i < pending.len() {
            let iface = pending[i].clone();
            i += 1;
            if !seen.insert(iface.clone()) {
                continue;
            }
            if let Some(def) = self.get(iface.as_str()) {
                pending.extend(def.interfaces().iter().cloned());
            }
            out.push(iface);
        }
        out
    }

    /// `sub` is `sup`, extends it, or implements it.
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        sub == sup
            || self.ancestors(sub).iter().any(|a| a.as_str() == sup)
            || self.all_interfaces(sub).iter().any(|i| i.as_str() == sup)
    }

    /// Whether a value of type `actual` can be stored where `declared` is expected.
    pub fn is_assignable(&self, declared: &TypeRef, actual: &TypeRef) -> bool {
        match (declared, actual) {
            (TypeRef::Any, _) => true,
            (
                TypeRef::Primitive(d) | TypeRef::Wrapper(d),
                TypeRef::Primitive(a) | TypeRef::Wrapper(a),
            ) => d == a,
            (TypeRef::Named(d), TypeRef::Named(a)) => self.is_subtype(a.as_str(), d.as_str()),
            (TypeRef::Array(d), TypeRef::Array(a)) => {
                if d.is_primitive() || a.is_primitive() {
                    d == a
                } else {
                    self.is_assignable(d, a)
                }
            }
            (TypeRef::Collection(_), a) => a.is_list() || a.is_set(),
            (TypeRef::List(_), TypeRef::List(_)) => true,
            (TypeRef::Set(_), TypeRef::Set(_)) => true,
            (d, a) => d == a,
        }
    }

    /// Null is assignable to anything but a primitive.
    pub fn is_value_assignable(&self, declared: &TypeRef, value: &Value) -> bool {
        match value {
            Value::Null => !declared.is_primitive(),
            v => self.is_assignable(declared, &v.runtime_type()),
        }
    }

    pub fn is_enum(&self, name: &str) -> bool {
        self.get(name).is_some_and(|d| d.is_enum())
    }

    /// First declaring type in the parent chain wins.
    fn find_in_chain<T>(&self, name: &str, f: impl Fn(&TypeDef) -> Option<T>) -> Option<T> {
        let mut current = Some(TypeName::new(name));
        let mut guard = 0usize;
        while let Some(ty) = current {
            let def = self.get(ty.as_str())?;
            if let Some(found) = f(def) {
                return Some(found);
            }
            current = def.parent().cloned();
            guard += 1;
            if guard > self.types.len() {
                return None;
            }
        }
        None
    }

    pub fn find_field(&self, ty: &str, field: &str) -> Option<FieldDef> {
        self.find_in_chain(ty, |d| d.declared_field(field).cloned())
    }

    pub fn find_getter(&self, ty: &str, method: &str) -> Option<(TypeRef, GetterFn)> {
        self.find_in_chain(ty, |d| d.declared_getter(method).cloned())
    }

    pub fn find_setter(&self, ty: &str, method: &str) -> Option<(TypeRef, SetterFn)> {
        self.find_in_chain(ty, |d| d.declared_setter(method).cloned())
    }

    /// Declared fields including inherited ones, root ancestor first.
    pub fn all_fields(&self, ty: &str) -> Vec<FieldDef> {
        let mut chain = self.ancestors(ty);
        chain.reverse();
        chain.push(TypeName::new(ty));

        let mut out: Vec<FieldDef> = Vec::new();
        for name in chain {
            let Some(def) = self.get(name.as_str()) else {
                continue;
            };
            for field in def.declared_fields() {
                match out.iter_mut().find(|f| f.name == field.name) {
                    Some(slot) => *slot = field.clone(),
                    None => out.push(field.clone()),
                }
            }
        }
        out
    }

    /// Getter method implementing property `prop` by convention.
    pub fn property_getter(&self, ty: &str, prop: &str) -> Option<(TypeRef, GetterFn)> {
        self.find_getter(ty, &format!("{GETTER_PREFIX}{prop}"))
    }

    /// Setter method implementing property `prop` by convention.
    pub fn property_setter(&self, ty: &str, prop: &str) -> Option<(TypeRef, SetterFn)> {
        self.find_setter(ty, &format!("{SETTER_PREFIX}{prop}"))
    }

    fn public_field(&self, ty: &str, prop: &str) -> Option<FieldDef> {
        self.find_field(ty, prop)
            .filter(|f| f.visibility == Visibility::Public)
    }

    /// Declared type of a property: getter return type, else setter
    /// parameter type, else public field type.
    pub fn property_type(&self, ty: &str, prop: &str) -> Option<TypeRef> {
        self.property_getter(ty, prop)
            .map(|(t, _)| t)
            .or_else(|| self.property_setter(ty, prop).map(|(t, _)| t))
            .or_else(|| self.public_field(ty, prop).map(|f| f.ty))
    }

    fn method_properties<'a>(
        &'a self,
        ty: &str,
        prefix: &'a str,
        names: impl Fn(&'a TypeDef) -> Vec<&'a str>,
    ) -> Vec<String> {
        let mut chain = self.ancestors(ty);
        chain.reverse();
        chain.push(TypeName::new(ty));
        let mut out = Vec::new();
        for name in chain {
            if let Some(def) = self.get(name.as_str()) {
                let mut props: Vec<String> = names(def.as_ref())
                    .into_iter()
                    .filter_map(|m| m.strip_prefix(prefix))
                    .map(str::to_string)
                    .collect();
                props.sort();
                out.extend(props);
            }
        }
        out
    }

    fn properties(&self, ty: &str, prefix: &str, writable: bool) -> Vec<String> {
        let mut out: Vec<String> = self
            .all_fields(ty)
            .into_iter()
            .filter(|f| f.visibility == Visibility::Public)
            .map(|f| f.name)
            .collect();
        let methods = if writable {
            self.method_properties(ty, prefix, |d| d.setter_names().collect())
        } else {
            self.method_properties(ty, prefix, |d| d.getter_names().collect())
        };
        for prop in methods {
            if !out.contains(&prop) {
                out.push(prop);
            }
        }
        out
    }

    /// Properties readable by convention: public fields, then `get_*` methods.
    pub fn readable_properties(&self, ty: &str) -> Vec<String> {
        self.properties(ty, GETTER_PREFIX, false)
    }

    /// Properties writable by convention: public fields, then `set_*` methods.
    pub fn writable_properties(&self, ty: &str) -> Vec<String> {
        self.properties(ty, SETTER_PREFIX, true)
    }

    pub fn is_readable(&self, ty: &str, prop: &str) -> bool {
        self.property_getter(ty, prop).is_some() || self.public_field(ty, prop).is_some()
    }

    pub fn is_writable(&self, ty: &str, prop: &str) -> bool {
        self.property_setter(ty, prop).is_some() || self.public_field(ty, prop).is_some()
    }

    /// A fresh instance with every field at its initial value.
    pub fn instantiate(&self, name: &str) -> MappingResult<ObjectRef> {
        let def = self
            .get(name)
            .ok_or_else(|| MappingError::instantiation(name, "type is not registered"))?;
        if !def.is_instantiable() {
            return Err(MappingError::instantiation(
                name,
                format!("{:?} types cannot be instantiated", def.kind()),
            ));
        }
        let fields: FxHashMap<String, Value> = self
            .all_fields(name)
            .into_iter()
            .map(|f| {
                let initial = match f.ty {
                    TypeRef::Primitive(kind) => Value::zero(kind),
                    _ => Value::Null,
                };
                (f.name, initial)
            })
            .collect();
        Ok(ObjectRef::from_parts(Arc::clone(def), fields))
    }
}
