//! Per-value dispatch: decides whether a source value is converted,
//! copied, merged as a container or mapped recursively as an object.

use morph_core::classmap::{FieldMapKind, HintContainer};
use morph_core::errors::{MappingError, MappingResult};
use morph_core::model::{EnumValue, TypeRef, Value};

use crate::accessor::Side;
use crate::engine::{FieldContext, MappingWalk};

impl MappingWalk<'_> {
    /// Produce the destination value for `src_value` given the declared
    /// destination type. Order matters: converters, null, already-mapped
    /// sources and by-reference copies short-circuit everything else.
    pub(crate) fn map_or_recurse(
        &self,
        ctx: &FieldContext<'_>,
        src_value: &Value,
        dest_type: &TypeRef,
    ) -> MappingResult<Value> {
        let fm = ctx.field_map;
        let src_type = self.src_type(ctx, src_value);

        if let Some(converter) = self.class_converter(ctx.class_map, &src_type, dest_type) {
            return self.convert_field(ctx, converter.as_ref(), src_value, &src_type, dest_type);
        }
        if src_value.is_null() {
            return Ok(Value::Null);
        }
        if let Some(done) = self.memo.lookup(src_value, dest_type, self.types()) {
            return Ok(done);
        }
        if fm.copy_by_reference() {
            return Ok(src_value.clone());
        }
        if matches!(src_value, Value::Map(_)) && (dest_type.is_map() || dest_type.is_any()) {
            return self.merge_map(ctx, src_value);
        }

        let dest_type = if fm.kind() == FieldMapKind::MapBacked && dest_type.is_any() {
            match &fm.dest().hints {
                Some(hints) => hints.hint_for(&src_type, fm.src().hints.as_ref())?,
                None => src_type.clone(),
            }
        } else if dest_type.is_any() && !src_type.is_scalar() {
            src_type.clone()
        } else {
            dest_type.clone()
        };

        if src_type.is_scalar() || dest_type.is_scalar() {
            return self.convert_scalar(ctx, src_value, &src_type, &dest_type);
        }
        if src_value.is_collection() && dest_type.is_collection() {
            return self.merge_collection(ctx, src_value, &dest_type);
        }
        if let Value::Enum(variant) = src_value {
            if self.is_enum_type(&dest_type) {
                return self.map_enum(variant, &dest_type);
            }
        }
        self.map_custom_object(ctx, src_value, &dest_type)
    }

    fn is_enum_type(&self, ty: &TypeRef) -> bool {
        ty.as_named()
            .is_some_and(|name| self.types().is_enum(name.as_str()))
    }

    fn convert_scalar(
        &self,
        ctx: &FieldContext<'_>,
        src_value: &Value,
        src_type: &TypeRef,
        dest_type: &TypeRef,
    ) -> MappingResult<Value> {
        let fm = ctx.field_map;
        let mut target = fm
            .dest()
            .hints
            .as_ref()
            .and_then(HintContainer::single_hint)
            .unwrap_or(dest_type)
            .clone();
        if fm.kind() == FieldMapKind::MapBacked && !target.is_scalar() && !self.is_enum_type(&target) {
            target = src_type.clone();
        }
        let value = match src_value {
            Value::Str(s) if ctx.trim_strings() => Value::Str(s.trim().to_string()),
            other => other.clone(),
        };
        self.engine
            .converter
            .convert(&value, &target, self.date_format(ctx), self.types())
    }

    /// Enum to enum, by case name.
    fn map_enum(&self, src: &EnumValue, dest_type: &TypeRef) -> MappingResult<Value> {
        let Some(name) = dest_type.as_named() else {
            return Err(MappingError::configuration(format!(
                "cannot map enum {} to {dest_type}",
                src.type_name
            )));
        };
        let def = self.types().require(name.as_str())?;
        if !def.enum_variants().iter().any(|v| *v == src.variant) {
            return Err(MappingError::configuration(format!(
                "enum {name} has no case named '{}'",
                src.variant
            )));
        }
        Ok(Value::enum_value(name.clone(), src.variant.clone()))
    }

    /// Map a custom object, reusing the destination field's current object
    /// when it already has a compatible type.
    fn map_custom_object(
        &self,
        ctx: &FieldContext<'_>,
        src_value: &Value,
        dest_type: &TypeRef,
    ) -> MappingResult<Value> {
        let fm = ctx.field_map;
        let src_type = src_value.runtime_type();
        let existing = self.existing_value(ctx, dest_type);

        let (dest, class_map) = if matches!(existing, Value::Object(_))
            && self.types().is_value_assignable(dest_type, &existing)
        {
            (existing, None)
        } else {
            let target = match &fm.dest().hints {
                Some(hints) => hints.hint_for(&src_type, fm.src().hints.as_ref())?,
                None => dest_type.clone(),
            };
            let class_map = self.engine.class_maps.find(&src_type, &target, fm.map_id())?;
            let create_method = fm
                .dest()
                .create_method
                .as_deref()
                .or_else(|| class_map.create_method());
            let dest = self.create(
                src_value,
                class_map.src_type(),
                class_map.dest_type(),
                dest_type,
                class_map.bean_factory(),
                create_method,
            )?;
            (dest, Some(class_map))
        };

        self.map_into(class_map, src_value, &dest, false, fm.map_id())?;
        Ok(dest)
    }

    /// Map each element of a source collection and add it to the destination
    /// one at a time, through the field's container or its adder.
    pub(crate) fn map_iterate(&self, ctx: &FieldContext<'_>, src_value: &Value) -> MappingResult<()> {
        let fm = ctx.field_map;
        if src_value.is_null() {
            return Ok(());
        }
        let items = src_value.elements().ok_or_else(|| {
            MappingError::configuration(format!(
                "iterate field map {} needs a collection source",
                fm.describe()
            ))
        })?;
        let dest_type = self.engine.accessors.field_type(fm, Side::Dest, ctx.dest)?;
        let elem_ctx = ctx.as_element();

        for item in items.into_iter().filter(|item| !item.is_null()) {
            let hints = fm.dest().hints.as_ref().ok_or_else(|| {
                MappingError::configuration("iterate field maps require a destination type hint")
            })?;
            let elem_type = hints.hint_for(&item.runtime_type(), fm.src().hints.as_ref())?;
            let mapped = self.map_or_recurse(&elem_ctx, &item, &elem_type)?;
            if mapped.is_null() {
                continue;
            }
            if dest_type.is_collection() {
                self.write_with(ctx, mapped, |v| self.append_element(ctx, &dest_type, v))?;
            } else {
                self.write_dest(ctx, mapped)?;
            }
        }
        Ok(())
    }

    fn append_element(&self, ctx: &FieldContext<'_>, dest_type: &TypeRef, value: Value) -> MappingResult<()> {
        let fm = ctx.field_map;
        let current = self.engine.accessors.read(fm, Side::Dest, ctx.dest)?;
        match &current {
            Value::List(list) => {
                list.write().push(value);
                return Ok(());
            }
            Value::Set(set) => {
                set.write().insert(value);
                return Ok(());
            }
            _ => {}
        }
        let mut items = current.elements().unwrap_or_default();
        items.push(value);
        let replacement = match dest_type {
            TypeRef::Array(elem) => Value::array((**elem).clone(), items),
            TypeRef::Set(_) => Value::set(items),
            _ => Value::list(items),
        };
        self.engine.accessors.write(fm, Side::Dest, ctx.dest, replacement, &|ty| {
            self.create(ctx.src, &ctx.src.runtime_type(), ty, ty, None, None)
        })
    }
}
