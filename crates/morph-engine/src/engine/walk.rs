//! One top-level mapping call: class-map orchestration, per-field error
//! policy, destination writes, events and statistics.

use std::sync::Arc;
use std::time::Instant;

use rustc_hash::FxHashSet;
use tracing::{debug, error};

use morph_core::classmap::{ClassMap, ConverterRef, FieldMap, RelationshipType};
use morph_core::errors::{MappingError, MappingResult};
use morph_core::events::{MappingEvent, MappingEventType};
use morph_core::model::{TypeRef, TypeRegistry, Value};
use morph_core::telemetry::StatisticType;
use morph_core::traits::{
    ConversionRequest, CreateRequest, CustomConverter, FieldMappingRequest,
};

use super::{IdentityMemo, MappingEngine};
use crate::accessor::Side;

pub(crate) struct MappingWalk<'e> {
    pub(crate) engine: &'e MappingEngine,
    pub(crate) memo: &'e IdentityMemo,
}

/// The field being mapped and the objects that own it.
#[derive(Clone, Copy)]
pub(crate) struct FieldContext<'a> {
    pub(crate) class_map: &'a ClassMap,
    pub(crate) field_map: &'a FieldMap,
    pub(crate) src: &'a Value,
    pub(crate) dest: &'a Value,
    /// Set while mapping the elements of a collection or map: the
    /// destination field then holds the container, never a value to reuse.
    pub(crate) element: bool,
}

impl FieldContext<'_> {
    pub(crate) fn as_element(&self) -> Self {
        Self {
            element: true,
            ..*self
        }
    }

    pub(crate) fn map_null(&self) -> bool {
        self.field_map
            .map_null()
            .unwrap_or_else(|| self.class_map.map_null())
    }

    pub(crate) fn map_empty_string(&self) -> bool {
        self.field_map
            .map_empty_string()
            .unwrap_or_else(|| self.class_map.map_empty_string())
    }

    pub(crate) fn trim_strings(&self) -> bool {
        self.field_map
            .trim_strings()
            .unwrap_or_else(|| self.class_map.trim_strings())
    }

    pub(crate) fn relationship(&self) -> RelationshipType {
        self.field_map
            .relationship()
            .unwrap_or_else(|| self.class_map.relationship())
    }
}

impl<'e> MappingWalk<'e> {
    pub(crate) fn new(engine: &'e MappingEngine, memo: &'e IdentityMemo) -> Self {
        Self { engine, memo }
    }

    pub(crate) fn types(&self) -> &'e TypeRegistry {
        &self.engine.types
    }

    fn validate_source(src: &Value) -> MappingResult<()> {
        if src.is_null() {
            return Err(MappingError::invalid_request("source object must not be null"));
        }
        Ok(())
    }

    /// Map `src` onto a fresh destination of `dest_type`, or return the
    /// destination this source was already mapped to.
    pub(crate) fn map_new(
        &self,
        src: &Value,
        dest_type: &TypeRef,
        map_id: Option<&str>,
    ) -> MappingResult<Value> {
        Self::validate_source(src)?;
        let src_type = src.runtime_type();
        let dest_type = if dest_type.is_any() {
            src_type.clone()
        } else {
            dest_type.clone()
        };
        let class_map = self.engine.class_maps.find(&src_type, &dest_type, map_id)?;
        if let Some(done) = self.memo.lookup(src, &dest_type, self.types()) {
            debug!(src = %src_type, dest = %dest_type, "source already mapped, reusing destination");
            self.emit(MappingEventType::MappingStarted, &class_map, None, src, &done, None);
            self.emit(MappingEventType::MappingFinished, &class_map, None, src, &done, None);
            return Ok(done);
        }

        if let Some(converter) = self.class_converter(&class_map, &src_type, &dest_type) {
            self.emit(MappingEventType::MappingStarted, &class_map, None, src, &Value::Null, None);
            let result =
                self.invoke_converter(converter.as_ref(), &Value::Null, src, &src_type, &dest_type)?;
            self.emit(MappingEventType::MappingFinished, &class_map, None, src, &result, None);
            return Ok(result);
        }

        let dest = self.create(
            src,
            class_map.src_type(),
            class_map.dest_type(),
            &dest_type,
            class_map.bean_factory(),
            class_map.create_method(),
        )?;
        self.emit(MappingEventType::MappingStarted, &class_map, None, src, &dest, None);
        self.map_into(Some(Arc::clone(&class_map)), src, &dest, false, map_id)?;
        self.emit(MappingEventType::MappingFinished, &class_map, None, src, &dest, None);
        Ok(dest)
    }

    /// Map `src` into an existing destination.
    pub(crate) fn map_existing(
        &self,
        src: &Value,
        dest: &Value,
        map_id: Option<&str>,
    ) -> MappingResult<()> {
        Self::validate_source(src)?;
        if dest.is_null() {
            return Err(MappingError::invalid_request("destination object must not be null"));
        }
        let src_type = src.runtime_type();
        let dest_type = dest.runtime_type();
        let class_map = self.engine.class_maps.find(&src_type, &dest_type, map_id)?;

        self.emit(MappingEventType::MappingStarted, &class_map, None, src, dest, None);
        match self.class_converter(&class_map, &src_type, &dest_type) {
            Some(converter) => {
                self.invoke_converter(converter.as_ref(), dest, src, &src_type, &dest_type)?;
            }
            None => self.map_into(Some(Arc::clone(&class_map)), src, dest, false, map_id)?,
        }
        self.emit(MappingEventType::MappingFinished, &class_map, None, src, dest, None);
        Ok(())
    }

    /// Populate `dest` from `src`.
    ///
    /// The pair is memoized before any field is visited, so a cycle back to
    /// `src` resolves to the in-progress `dest`. Unless `bypass_super` is
    /// set, class maps registered for supertypes run first and the fields
    /// they wrote are skipped here.
    pub(crate) fn map_into(
        &self,
        class_map: Option<Arc<ClassMap>>,
        src: &Value,
        dest: &Value,
        bypass_super: bool,
        map_id: Option<&str>,
    ) -> MappingResult<()> {
        self.memo.record(src, dest);
        let src_type = src.runtime_type();
        let dest_type = dest.runtime_type();
        let class_map = match class_map {
            Some(cm) => cm,
            None => self.engine.class_maps.find(&src_type, &dest_type, map_id)?,
        };

        if let Some(converter) = self.class_converter(&class_map, &src_type, &dest_type) {
            self.invoke_converter(converter.as_ref(), dest, src, &src_type, &dest_type)?;
            return Ok(());
        }

        let mut satisfied: FxHashSet<String> = FxHashSet::default();
        if !bypass_super {
            let supers = self
                .engine
                .super_types
                .resolve(&self.engine.class_maps, &src_type, &dest_type);
            for super_map in supers.iter() {
                if super_map.key() == class_map.key() {
                    continue;
                }
                self.map_into(Some(Arc::clone(super_map)), src, dest, true, map_id)?;
                satisfied.extend(
                    super_map
                        .field_maps()
                        .iter()
                        .map(|fm| fm.dest().path.to_string()),
                );
            }
        }

        for field_map in class_map.field_maps() {
            if satisfied.contains(&field_map.dest().path.to_string()) {
                continue;
            }
            let ctx = FieldContext {
                class_map: &class_map,
                field_map,
                src,
                dest,
                element: false,
            };
            self.map_field(&ctx)?;
        }
        Ok(())
    }

    /// Map one field, applying the class map's error policy to any failure.
    fn map_field(&self, ctx: &FieldContext<'_>) -> MappingResult<()> {
        if ctx.field_map.is_excluded() {
            return Ok(());
        }
        match self.map_field_value(ctx) {
            Ok(()) => {
                self.stat(StatisticType::FieldMappingSuccess, 1);
                Ok(())
            }
            Err(err) => self.field_failed(ctx, err),
        }
    }

    fn field_failed(&self, ctx: &FieldContext<'_>, err: MappingError) -> MappingResult<()> {
        let cm = ctx.class_map;
        let fm = ctx.field_map;
        self.stat(StatisticType::FieldMappingFailure, 1);

        let allowed = err
            .extension_cause()
            .is_some_and(|cause| cm.allows_exception(cause.kind()));
        if allowed {
            debug!(class_map = %cm.describe(), field = %fm.describe(), error = %err, "allowed extension error");
            return Err(match err.into_extension_cause() {
                Ok(cause) => MappingError::Extension(cause),
                Err(other) => other,
            });
        }

        error!(
            class_map = %cm.describe(),
            field = %fm.describe(),
            error = %err,
            "field mapping failed"
        );
        if cm.stop_on_errors() {
            return Err(MappingError::FieldMapping {
                class_map: cm.describe(),
                src_field: fm.src().path.to_string(),
                dest_field: fm.dest().path.to_string(),
                source: Box::new(err),
            });
        }
        self.stat(StatisticType::FieldMappingIgnoredFailure, 1);
        Ok(())
    }

    fn map_field_value(&self, ctx: &FieldContext<'_>) -> MappingResult<()> {
        let fm = ctx.field_map;
        let src_value = self.engine.accessors.read(fm, Side::Src, ctx.src)?;

        if let Some(mapper) = &self.engine.field_mapper {
            let handled = mapper.map_field(&FieldMappingRequest {
                source: ctx.src,
                destination: ctx.dest,
                source_field_value: &src_value,
                class_map: ctx.class_map,
                field_map: fm,
            })?;
            if handled {
                debug!(field = %fm.describe(), "field handled by custom field mapper");
                return Ok(());
            }
        }

        if fm.is_iterate() {
            return self.map_iterate(ctx, &src_value);
        }

        let dest_type = self.engine.accessors.field_type(fm, Side::Dest, ctx.dest)?;
        let value = match fm.converter() {
            Some(reference) => {
                let converter = self.field_converter(reference)?;
                let src_type = self.src_type(ctx, &src_value);
                self.convert_field(ctx, converter.as_ref(), &src_value, &src_type, &dest_type)?
            }
            None => self.map_or_recurse(ctx, &src_value, &dest_type)?,
        };
        self.write_dest(ctx, value)?;
        debug!(
            class_map = %ctx.class_map.describe(),
            field = %fm.describe(),
            "mapped field"
        );
        Ok(())
    }

    /// Write through the destination accessor, subject to the null,
    /// empty-string and trim policies.
    pub(crate) fn write_dest(&self, ctx: &FieldContext<'_>, value: Value) -> MappingResult<()> {
        self.write_with(ctx, value, |v| {
            self.engine.accessors.write(
                ctx.field_map,
                Side::Dest,
                ctx.dest,
                v,
                &|ty| self.create_intermediate(ctx, ty),
            )
        })
    }

    pub(crate) fn write_with(
        &self,
        ctx: &FieldContext<'_>,
        value: Value,
        write: impl FnOnce(Value) -> MappingResult<()>,
    ) -> MappingResult<()> {
        if value.is_null() && !ctx.map_null() {
            return Ok(());
        }
        if value.as_str() == Some("") && !ctx.map_empty_string() {
            return Ok(());
        }
        let value = match value {
            Value::Str(s) if ctx.trim_strings() => Value::Str(s.trim().to_string()),
            other => other,
        };
        self.emit(
            MappingEventType::PreWritingDestinationValue,
            ctx.class_map,
            Some(ctx.field_map),
            ctx.src,
            ctx.dest,
            Some(&value),
        );
        write(value.clone())?;
        self.emit(
            MappingEventType::PostWritingDestinationValue,
            ctx.class_map,
            Some(ctx.field_map),
            ctx.src,
            ctx.dest,
            Some(&value),
        );
        Ok(())
    }

    /// Current value of the destination field, if it may be merged into.
    pub(crate) fn existing_value(&self, ctx: &FieldContext<'_>, dest_type: &TypeRef) -> Value {
        if ctx.element || ctx.dest.is_null() {
            return Value::Null;
        }
        // write-only destinations have nothing to merge into
        let current = self
            .engine
            .accessors
            .read(ctx.field_map, Side::Dest, ctx.dest)
            .unwrap_or_default();
        if current.is_container() && !dest_type.is_container() {
            return Value::Null;
        }
        current
    }

    /// Runtime type of the source value, or the declared type when it is null.
    pub(crate) fn src_type(&self, ctx: &FieldContext<'_>, value: &Value) -> TypeRef {
        if !value.is_null() {
            return value.runtime_type();
        }
        if ctx.element {
            return TypeRef::Any;
        }
        self.engine
            .accessors
            .field_type(ctx.field_map, Side::Src, ctx.src)
            .unwrap_or(TypeRef::Any)
    }

    pub(crate) fn date_format<'s>(&'s self, ctx: &FieldContext<'s>) -> &'s str {
        ctx.field_map
            .date_format()
            .or_else(|| ctx.class_map.date_format())
            .unwrap_or_else(|| self.engine.config.mapping.effective_date_format())
    }

    pub(crate) fn create(
        &self,
        source: &Value,
        src_type: &TypeRef,
        dest_type: &TypeRef,
        declared: &TypeRef,
        factory: Option<&str>,
        create_method: Option<&str>,
    ) -> MappingResult<Value> {
        self.engine.creator.create(&CreateRequest {
            source,
            src_type,
            dest_type,
            declared_dest_type: declared,
            factory,
            create_method,
            types: self.types(),
        })
    }

    /// Missing intermediate object on a deep destination path.
    fn create_intermediate(&self, ctx: &FieldContext<'_>, ty: &TypeRef) -> MappingResult<Value> {
        self.create(ctx.src, &ctx.src.runtime_type(), ty, ty, None, None)
    }

    pub(crate) fn class_converter(
        &self,
        class_map: &ClassMap,
        src_type: &TypeRef,
        dest_type: &TypeRef,
    ) -> Option<Arc<dyn CustomConverter>> {
        self.engine
            .converters
            .find(class_map, src_type, dest_type, self.types())
    }

    fn field_converter(&self, reference: &ConverterRef) -> MappingResult<Arc<dyn CustomConverter>> {
        match reference {
            ConverterRef::Instance(converter) => Ok(Arc::clone(converter)),
            ConverterRef::Id(id) => self
                .engine
                .converters_by_id
                .get(id)
                .cloned()
                .ok_or_else(|| {
                    MappingError::configuration(format!(
                        "custom converter instance not found with id '{id}'"
                    ))
                }),
        }
    }

    /// Run a converter for a field. With `map_null` off a null source never
    /// reaches the converter.
    pub(crate) fn convert_field(
        &self,
        ctx: &FieldContext<'_>,
        converter: &dyn CustomConverter,
        src_value: &Value,
        src_type: &TypeRef,
        dest_type: &TypeRef,
    ) -> MappingResult<Value> {
        if src_value.is_null() && !ctx.map_null() {
            return Ok(Value::Null);
        }
        let existing = self.existing_value(ctx, dest_type);
        self.invoke_converter(converter, &existing, src_value, src_type, dest_type)
    }

    pub(crate) fn invoke_converter(
        &self,
        converter: &dyn CustomConverter,
        existing: &Value,
        source: &Value,
        src_type: &TypeRef,
        dest_type: &TypeRef,
    ) -> MappingResult<Value> {
        let started = Instant::now();
        let result = converter.convert(&ConversionRequest {
            existing,
            source,
            src_type,
            dest_type,
            types: self.types(),
        })?;
        let elapsed = started.elapsed();
        self.stat(StatisticType::CustomConverterSuccess, 1);
        for sink in &self.engine.sinks {
            sink.record_converter_time(elapsed);
        }
        Ok(result)
    }

    pub(crate) fn emit(
        &self,
        event_type: MappingEventType,
        class_map: &ClassMap,
        field_map: Option<&FieldMap>,
        source: &Value,
        destination: &Value,
        value: Option<&Value>,
    ) {
        if self.engine.events.is_empty() {
            return;
        }
        self.engine.events.emit(&MappingEvent {
            event_type,
            class_map,
            field_map,
            source,
            destination,
            value,
        });
    }

    pub(crate) fn stat(&self, stat: StatisticType, by: u64) {
        for sink in &self.engine.sinks {
            sink.increment(stat, by);
        }
    }
}
