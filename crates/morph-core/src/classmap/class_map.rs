//! Registered correspondence between a source and a destination type.

use std::fmt;
use std::sync::Arc;

use super::field_map::{FieldMap, FieldMapBuilder, RelationshipType};
use crate::config::MappingConfig;
use crate::errors::{ExtensionError, MappingResult};
use crate::model::TypeRef;
use crate::traits::CustomConverter;

/// Registry key of a class map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassMapKey {
    pub src: TypeRef,
    pub dest: TypeRef,
    pub map_id: Option<String>,
}

impl ClassMapKey {
    pub fn new(src: TypeRef, dest: TypeRef, map_id: Option<&str>) -> Self {
        Self {
            src,
            dest,
            map_id: map_id.map(str::to_string),
        }
    }
}

impl fmt::Display for ClassMapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dest)?;
        if let Some(id) = &self.map_id {
            write!(f, " [{id}]")?;
        }
        Ok(())
    }
}

/// A class-level converter between two types, applied in either direction.
#[derive(Clone)]
pub struct ConverterDescriptor {
    pub a: TypeRef,
    pub b: TypeRef,
    pub converter: Arc<dyn CustomConverter>,
}

impl fmt::Debug for ConverterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConverterDescriptor({} <-> {})", self.a, self.b)
    }
}

#[derive(Debug, Clone)]
pub struct ClassMap {
    src_type: TypeRef,
    dest_type: TypeRef,
    map_id: Option<String>,
    field_maps: Vec<FieldMap>,
    converters: Vec<ConverterDescriptor>,
    wildcard: Option<bool>,
    map_null: Option<bool>,
    map_empty_string: Option<bool>,
    trim_strings: Option<bool>,
    stop_on_errors: Option<bool>,
    relationship: Option<RelationshipType>,
    allowed_exceptions: Vec<String>,
    date_format: Option<String>,
    bean_factory: Option<String>,
    create_method: Option<String>,
    bidirectional: Option<bool>,
}

impl ClassMap {
    pub fn builder(src: impl Into<TypeRef>, dest: impl Into<TypeRef>) -> ClassMapBuilder {
        ClassMapBuilder::new(src.into(), dest.into())
    }

    pub fn key(&self) -> ClassMapKey {
        ClassMapKey::new(
            self.src_type.clone(),
            self.dest_type.clone(),
            self.map_id.as_deref(),
        )
    }

    pub fn src_type(&self) -> &TypeRef {
        &self.src_type
    }

    pub fn dest_type(&self) -> &TypeRef {
        &self.dest_type
    }

    pub fn map_id(&self) -> Option<&str> {
        self.map_id.as_deref()
    }

    pub fn field_maps(&self) -> &[FieldMap] {
        &self.field_maps
    }

    /// Append a field map; used when augmenting wildcard class maps.
    pub fn add_field_map(&mut self, fm: FieldMap) {
        self.field_maps.push(fm);
    }

    pub fn converters(&self) -> &[ConverterDescriptor] {
        &self.converters
    }

    pub fn wildcard(&self) -> bool {
        self.wildcard.unwrap_or(true)
    }

    pub fn map_null(&self) -> bool {
        self.map_null.unwrap_or(true)
    }

    pub fn map_empty_string(&self) -> bool {
        self.map_empty_string.unwrap_or(true)
    }

    pub fn trim_strings(&self) -> bool {
        self.trim_strings.unwrap_or(false)
    }

    pub fn stop_on_errors(&self) -> bool {
        self.stop_on_errors.unwrap_or(true)
    }

    pub fn relationship(&self) -> RelationshipType {
        self.relationship.unwrap_or_default()
    }

    pub fn bidirectional(&self) -> bool {
        self.bidirectional.unwrap_or(true)
    }

    pub fn allowed_exceptions(&self) -> &[String] {
        &self.allowed_exceptions
    }

    /// Whether an extension error of this kind propagates unmodified.
    pub fn allows_exception(&self, kind: &str) -> bool {
        self.allowed_exceptions.iter().any(|k| k == kind)
    }

    pub fn date_format(&self) -> Option<&str> {
        self.date_format.as_deref()
    }

    pub fn bean_factory(&self) -> Option<&str> {
        self.bean_factory.as_deref()
    }

    pub fn create_method(&self) -> Option<&str> {
        self.create_method.as_deref()
    }

    /// Fill every unset policy from the global mapping configuration.
    pub fn apply_defaults(&mut self, config: &MappingConfig) {
        self.wildcard.get_or_insert(config.effective_wildcard());
        self.map_null.get_or_insert(config.effective_map_null());
        self.map_empty_string
            .get_or_insert(config.effective_map_empty_string());
        self.trim_strings.get_or_insert(config.effective_trim_strings());
        self.stop_on_errors
            .get_or_insert(config.effective_stop_on_errors());
        self.relationship
            .get_or_insert(config.effective_relationship_type());
        self.bidirectional
            .get_or_insert(config.effective_bidirectional());
        if self.date_format.is_none() {
            self.date_format = config.date_format.clone();
        }
    }

    /// The reverse correspondence: sides swapped. One-way field maps become
    /// exclusions so wildcard matching cannot map them back.
    pub fn reversed(&self) -> ClassMap {
        ClassMap {
            src_type: self.dest_type.clone(),
            dest_type: self.src_type.clone(),
            field_maps: self
                .field_maps
                .iter()
                .map(|fm| {
                    if fm.is_one_way() {
                        fm.reversed_excluded()
                    } else {
                        fm.reversed()
                    }
                })
                .collect(),
            ..self.clone()
        }
    }

    /// "Src -> Dest" for log and error messages.
    pub fn describe(&self) -> String {
        self.key().to_string()
    }
}

/// Builder for [`ClassMap`]; field paths are parsed on `build()`.
#[derive(Debug, Clone)]
pub struct ClassMapBuilder {
    map: ClassMap,
    fields: Vec<FieldMapBuilder>,
    prebuilt: Vec<FieldMap>,
}

impl ClassMapBuilder {
    fn new(src_type: TypeRef, dest_type: TypeRef) -> Self {
        Self {
            map: ClassMap {
                src_type,
                dest_type,
                map_id: None,
                field_maps: Vec::new(),
                converters: Vec::new(),
                wildcard: None,
                map_null: None,
                map_empty_string: None,
                trim_strings: None,
                stop_on_errors: None,
                relationship: None,
                allowed_exceptions: Vec::new(),
                date_format: None,
                bean_factory: None,
                create_method: None,
                bidirectional: None,
            },
            fields: Vec::new(),
            prebuilt: Vec::new(),
        }
    }

    pub fn map_id(mut self, id: impl Into<String>) -> Self {
        self.map.map_id = Some(id.into());
        self
    }

    /// Same-named or renamed property pair with default settings.
    pub fn map(self, src: &str, dest: &str) -> Self {
        self.field(FieldMap::builder(src, dest))
    }

    /// Exclude a property from mapping, including wildcard matching.
    pub fn exclude(self, name: &str) -> Self {
        self.field(FieldMap::builder(name, name).excluded())
    }

    pub fn field(mut self, fm: FieldMapBuilder) -> Self {
        self.fields.push(fm);
        self
    }

    pub fn field_map(mut self, fm: FieldMap) -> Self {
        self.prebuilt.push(fm);
        self
    }

    pub fn converter(
        mut self,
        a: impl Into<TypeRef>,
        b: impl Into<TypeRef>,
        converter: Arc<dyn CustomConverter>,
    ) -> Self {
        self.map.converters.push(ConverterDescriptor {
            a: a.into(),
            b: b.into(),
            converter,
        });
        self
    }

    pub fn wildcard(mut self, wildcard: bool) -> Self {
        self.map.wildcard = Some(wildcard);
        self
    }

    pub fn map_null(mut self, map_null: bool) -> Self {
        self.map.map_null = Some(map_null);
        self
    }

    pub fn map_empty_string(mut self, map_empty: bool) -> Self {
        self.map.map_empty_string = Some(map_empty);
        self
    }

    pub fn trim_strings(mut self, trim: bool) -> Self {
        self.map.trim_strings = Some(trim);
        self
    }

    pub fn stop_on_errors(mut self, stop: bool) -> Self {
        self.map.stop_on_errors = Some(stop);
        self
    }

    pub fn relationship(mut self, relationship: RelationshipType) -> Self {
        self.map.relationship = Some(relationship);
        self
    }

    pub fn bidirectional(mut self, bidirectional: bool) -> Self {
        self.map.bidirectional = Some(bidirectional);
        self
    }

    pub fn allow_exception_kind(mut self, kind: impl Into<String>) -> Self {
        self.map.allowed_exceptions.push(kind.into());
        self
    }

    /// Let extension errors of concrete type `E` propagate unmodified.
    pub fn allow_exception<E: 'static>(self) -> Self {
        self.allow_exception_kind(ExtensionError::kind_of::<E>())
    }

    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.map.date_format = Some(format.into());
        self
    }

    pub fn bean_factory(mut self, name: impl Into<String>) -> Self {
        self.map.bean_factory = Some(name.into());
        self
    }

    pub fn create_method(mut self, name: impl Into<String>) -> Self {
        self.map.create_method = Some(name.into());
        self
    }

    pub fn build(self) -> MappingResult<ClassMap> {
        let mut map = self.map;
        for fm in self.fields {
            map.field_maps.push(fm.build()?);
        }
        map.field_maps.extend(self.prebuilt);
        Ok(map)
    }
}
