//! Merging source collections and maps into destination containers.
//!
//! Existing lists, sets and maps are updated in place. Arrays have a fixed
//! length, so a merge always produces a new array that replaces the old one.
//! Locks on shared containers are never held across a recursive mapping call.

use morph_core::classmap::{FieldMap, HintContainer, RelationshipType};
use morph_core::errors::MappingResult;
use morph_core::model::{OrderedMap, Shared, TypeRef, Value};

use crate::engine::{FieldContext, MappingWalk};

/// Chooses the destination type for each source element.
struct ElementTypes<'a> {
    hints: Option<&'a HintContainer>,
    src_hints: Option<&'a HintContainer>,
    declared: Option<TypeRef>,
    previous: Option<TypeRef>,
}

impl<'a> ElementTypes<'a> {
    fn new(fm: &'a FieldMap, dest_type: &TypeRef) -> Self {
        Self {
            hints: fm.dest().hints.as_ref().filter(|h| !h.is_empty()),
            src_hints: fm.src().hints.as_ref(),
            declared: dest_type.element_type().filter(|t| !t.is_any()).cloned(),
            previous: None,
        }
    }

    /// Hint, then declared element type, then the element's own type. A
    /// null element keeps the type chosen for the one before it.
    fn next(&mut self, item: &Value) -> MappingResult<TypeRef> {
        if item.is_null() {
            return Ok(self
                .previous
                .clone()
                .or_else(|| self.declared.clone())
                .unwrap_or(TypeRef::Any));
        }
        let ty = match (self.hints, &self.declared) {
            (Some(hints), _) => hints.hint_for(&item.runtime_type(), self.src_hints)?,
            (None, Some(declared)) => declared.clone(),
            (None, None) => item.runtime_type(),
        };
        self.previous = Some(ty.clone());
        Ok(ty)
    }
}

impl MappingWalk<'_> {
    pub(crate) fn merge_collection(
        &self,
        ctx: &FieldContext<'_>,
        src_value: &Value,
        dest_type: &TypeRef,
    ) -> MappingResult<Value> {
        let fm = ctx.field_map;
        let items = src_value.elements().unwrap_or_default();
        let dest_type = match dest_type {
            TypeRef::Collection(elem) => TypeRef::List(elem.clone()),
            other => other.clone(),
        };
        let existing = self.existing_value(ctx, &dest_type);
        let elem_ctx = ctx.as_element();

        if let TypeRef::Array(elem) = &dest_type {
            if elem.is_primitive() {
                return self.grow_primitive_array(&elem_ctx, &items, elem, &existing);
            }
        }

        let mut types = ElementTypes::new(fm, &dest_type);
        let mut result = existing.elements().unwrap_or_default();
        let mut produced = Vec::with_capacity(items.len());

        for item in &items {
            let elem_type = types.next(item)?;
            let mapped = self.map_or_recurse(&elem_ctx, item, &elem_type)?;
            if ctx.relationship() == RelationshipType::Cumulative {
                result.push(mapped.clone());
                produced.push(mapped);
                continue;
            }
            match result.iter().position(|e| *e == mapped) {
                Some(pos) if matches!(result[pos], Value::Object(_)) => {
                    let current = result[pos].clone();
                    self.map_into(None, item, &current, false, fm.map_id())?;
                    produced.push(current);
                }
                Some(pos) => {
                    result[pos] = mapped.clone();
                    produced.push(mapped);
                }
                None => {
                    result.push(mapped.clone());
                    produced.push(mapped);
                }
            }
        }

        if fm.remove_orphans() {
            result = Vec::with_capacity(produced.len());
            for value in produced {
                if !result.iter().any(|kept| kept.same_ref(&value)) {
                    result.push(value);
                }
            }
        }
        Ok(store(&dest_type, &existing, result))
    }

    /// Primitive arrays only ever grow: mapped items follow the current ones
    /// and a null element becomes the primitive's zero value.
    fn grow_primitive_array(
        &self,
        ctx: &FieldContext<'_>,
        items: &[Value],
        elem: &TypeRef,
        existing: &Value,
    ) -> MappingResult<Value> {
        let mut out = match existing {
            Value::Array(array) => array.read().items.clone(),
            _ => Vec::new(),
        };
        for item in items {
            let mapped = self.map_or_recurse(ctx, item, elem)?;
            out.push(match (mapped, elem) {
                (Value::Null, TypeRef::Primitive(kind)) => Value::zero(*kind),
                (value, _) => value,
            });
        }
        Ok(Value::array(elem.clone(), out))
    }

    pub(crate) fn merge_map(&self, ctx: &FieldContext<'_>, src_value: &Value) -> MappingResult<Value> {
        let entries: Vec<(Value, Value)> = match src_value {
            Value::Map(map) => map
                .read()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => Vec::new(),
        };
        let target = match self.existing_value(ctx, &TypeRef::Map) {
            Value::Map(map) => map,
            _ => Shared::new(OrderedMap::new()),
        };
        let elem_ctx = ctx.as_element();
        let non_cumulative = ctx.relationship() == RelationshipType::NonCumulative;

        for (key, value) in entries {
            let mapped = self.map_or_recurse(&elem_ctx, &value, &value.runtime_type())?;
            let current = target.read().get(&key).cloned();
            match current {
                Some(current @ Value::Object(_)) if non_cumulative && current == mapped => {
                    self.map_into(None, &value, &current, false, ctx.field_map.map_id())?;
                }
                _ => {
                    target.write().insert(key, mapped);
                }
            }
        }
        Ok(Value::Map(target))
    }
}

/// Put the merged elements back into the reused container, or a new one
/// shaped like `dest_type`.
fn store(dest_type: &TypeRef, existing: &Value, items: Vec<Value>) -> Value {
    match (dest_type, existing) {
        (TypeRef::Set(_), Value::Set(set)) => {
            let mut set = set.write();
            set.clear();
            for item in items {
                set.insert(item);
            }
            existing.clone()
        }
        (TypeRef::Set(_), _) => Value::set(items),
        (TypeRef::Array(elem), _) => Value::array((**elem).clone(), items),
        (_, Value::List(list)) => {
            *list.write() = items;
            existing.clone()
        }
        _ => Value::list(items),
    }
}
