//! Shared, identity-bearing handles for objects and containers.

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxHashMap;

use super::type_name::TypeName;
use super::typedef::TypeDef;
use super::types::TypeRef;
use super::value::Value;

/// A reference-counted, lockable handle. Clones share the same target, and
/// `id()` is the identity used by the mapping memo.
pub struct Shared<T>(Arc<RwLock<T>>);

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

/// State of one object instance.
pub struct ObjectData {
    ty: Arc<TypeDef>,
    fields: FxHashMap<String, Value>,
}

/// Handle to an object instance.
#[derive(Clone)]
pub struct ObjectRef(Shared<ObjectData>);

impl ObjectRef {
    pub(crate) fn from_parts(ty: Arc<TypeDef>, fields: FxHashMap<String, Value>) -> Self {
        Self(Shared::new(ObjectData { ty, fields }))
    }

    pub fn type_name(&self) -> TypeName {
        self.0.read().ty.name().clone()
    }

    pub fn type_def(&self) -> Arc<TypeDef> {
        Arc::clone(&self.0.read().ty)
    }

    /// Raw read of a field slot, ignoring visibility.
    pub fn get(&self, field: &str) -> Option<Value> {
        self.0.read().fields.get(field).cloned()
    }

    /// Raw write of an existing field slot, ignoring visibility.
    /// Returns false if the object has no such field.
    pub fn set(&self, field: &str, value: impl Into<Value>) -> bool {
        match self.0.write().fields.get_mut(field) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// Builder-style raw write, for constructing fixtures.
    pub fn with(self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.read().fields.contains_key(field)
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        self.0.ptr_eq(&other.0)
    }

    pub fn id(&self) -> usize {
        self.0.id()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:x}", self.type_name(), self.id())
    }
}

/// Insertion-ordered set; uniqueness by native value equality.
#[derive(Default, Clone)]
pub struct OrderedSet {
    items: Vec<Value>,
}

impl OrderedSet {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        let mut set = Self::new();
        for v in values {
            set.insert(v);
        }
        set
    }

    /// Adds the value unless an equal one is present. Returns true if added.
    pub fn insert(&mut self, value: Value) -> bool {
        if self.contains(&value) {
            return false;
        }
        self.items.push(value);
        true
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.position(value).is_some()
    }

    pub fn position(&self, value: &Value) -> Option<usize> {
        self.items.iter().position(|v| v == value)
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn replace(&mut self, index: usize, value: Value) {
        if let Some(slot) = self.items.get_mut(index) {
            *slot = value;
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.items
    }
}

/// Insertion-ordered map; keys compared by native value equality.
#[derive(Default, Clone)]
pub struct OrderedMap {
    entries: Vec<(Value, Value)>,
}

impl OrderedMap {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Inserts or replaces in place. Returns the previous value.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }
}

/// Fixed element type plus items. Growing an array produces a new array.
#[derive(Clone)]
pub struct ArrayData {
    pub elem: TypeRef,
    pub items: Vec<Value>,
}
