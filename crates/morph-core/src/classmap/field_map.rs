//! One source-to-destination field correspondence.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::accessor_spec::{AccessorKind, FieldPath};
use super::hints::HintContainer;
use crate::errors::MappingResult;
use crate::traits::CustomConverter;

static NEXT_FIELD_MAP_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_FIELD_MAP_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldMapKind {
    /// Never mapped; also blocks wildcard matching of the same names.
    Excluded,
    Generic,
    /// One side is a map entry keyed by the field name.
    MapBacked,
    /// One side uses explicitly named accessor methods.
    CustomAccessor,
}

/// How collection and map fields merge into existing destination content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipType {
    /// Always append.
    #[default]
    Cumulative,
    /// Update an equal existing element in place, else append.
    NonCumulative,
}

/// Field-level custom converter, by registered id or by instance.
#[derive(Clone)]
pub enum ConverterRef {
    Id(String),
    Instance(Arc<dyn CustomConverter>),
}

impl fmt::Debug for ConverterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "Id({id})"),
            Self::Instance(_) => f.write_str("Instance(..)"),
        }
    }
}

/// One side of a field map.
#[derive(Debug, Clone)]
pub struct FieldSide {
    pub path: FieldPath,
    pub hints: Option<HintContainer>,
    /// Types of the intermediate steps of a deep path, in order.
    pub deep_hints: Option<HintContainer>,
    pub create_method: Option<String>,
}

impl FieldSide {
    fn new(path: FieldPath) -> Self {
        Self {
            path,
            hints: None,
            deep_hints: None,
            create_method: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldMap {
    id: u64,
    kind: FieldMapKind,
    src: FieldSide,
    dest: FieldSide,
    relationship: Option<RelationshipType>,
    remove_orphans: bool,
    copy_by_reference: bool,
    converter: Option<ConverterRef>,
    map_null: Option<bool>,
    map_empty_string: Option<bool>,
    trim_strings: Option<bool>,
    map_id: Option<String>,
    date_format: Option<String>,
    iterate: bool,
    one_way: bool,
}

impl FieldMap {
    pub fn builder(src: impl Into<String>, dest: impl Into<String>) -> FieldMapBuilder {
        FieldMapBuilder::new(src.into(), dest.into())
    }

    /// Identifier unique within the process; keys the accessor cache.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> FieldMapKind {
        self.kind
    }

    pub fn is_excluded(&self) -> bool {
        self.kind == FieldMapKind::Excluded
    }

    pub fn src(&self) -> &FieldSide {
        &self.src
    }

    pub fn dest(&self) -> &FieldSide {
        &self.dest
    }

    pub fn relationship(&self) -> Option<RelationshipType> {
        self.relationship
    }

    pub fn remove_orphans(&self) -> bool {
        self.remove_orphans
    }

    pub fn copy_by_reference(&self) -> bool {
        self.copy_by_reference
    }

    pub fn converter(&self) -> Option<&ConverterRef> {
        self.converter.as_ref()
    }

    pub fn map_null(&self) -> Option<bool> {
        self.map_null
    }

    pub fn map_empty_string(&self) -> Option<bool> {
        self.map_empty_string
    }

    pub fn trim_strings(&self) -> Option<bool> {
        self.trim_strings
    }

    pub fn map_id(&self) -> Option<&str> {
        self.map_id.as_deref()
    }

    pub fn date_format(&self) -> Option<&str> {
        self.date_format.as_deref()
    }

    pub fn is_iterate(&self) -> bool {
        self.iterate
    }

    pub fn is_one_way(&self) -> bool {
        self.one_way
    }

    /// Same correspondence in the other direction, under a fresh id.
    pub fn reversed(&self) -> FieldMap {
        FieldMap {
            id: next_id(),
            src: self.dest.clone(),
            dest: self.src.clone(),
            ..self.clone()
        }
    }

    /// Reverse of a one-way field: the same sides, never mapped.
    pub(crate) fn reversed_excluded(&self) -> FieldMap {
        FieldMap {
            kind: FieldMapKind::Excluded,
            converter: None,
            ..self.reversed()
        }
    }

    /// "src -> dest" for log and error messages.
    pub fn describe(&self) -> String {
        format!("{} -> {}", self.src.path, self.dest.path)
    }
}

/// Builder for [`FieldMap`]; paths are parsed on `build()`.
#[derive(Debug, Clone)]
pub struct FieldMapBuilder {
    src: String,
    dest: String,
    kind: FieldMapKind,
    src_kind: Option<AccessorKind>,
    dest_kind: Option<AccessorKind>,
    src_hints: Option<HintContainer>,
    dest_hints: Option<HintContainer>,
    src_deep_hints: Option<HintContainer>,
    dest_deep_hints: Option<HintContainer>,
    src_create_method: Option<String>,
    dest_create_method: Option<String>,
    relationship: Option<RelationshipType>,
    remove_orphans: bool,
    copy_by_reference: bool,
    converter: Option<ConverterRef>,
    map_null: Option<bool>,
    map_empty_string: Option<bool>,
    trim_strings: Option<bool>,
    map_id: Option<String>,
    date_format: Option<String>,
    iterate: bool,
    one_way: bool,
}

impl FieldMapBuilder {
    fn new(src: String, dest: String) -> Self {
        Self {
            src,
            dest,
            kind: FieldMapKind::Generic,
            src_kind: None,
            dest_kind: None,
            src_hints: None,
            dest_hints: None,
            src_deep_hints: None,
            dest_deep_hints: None,
            src_create_method: None,
            dest_create_method: None,
            relationship: None,
            remove_orphans: false,
            copy_by_reference: false,
            converter: None,
            map_null: None,
            map_empty_string: None,
            trim_strings: None,
            map_id: None,
            date_format: None,
            iterate: false,
            one_way: false,
        }
    }

    pub fn excluded(mut self) -> Self {
        self.kind = FieldMapKind::Excluded;
        self
    }

    /// Access the source side as a map entry (`key` defaults to the field name).
    pub fn src_map_key(mut self, key: Option<&str>) -> Self {
        self.kind = FieldMapKind::MapBacked;
        self.src_kind = Some(AccessorKind::MapEntry {
            key: key.map(str::to_string),
        });
        self
    }

    /// Access the destination side as a map entry (`key` defaults to the field name).
    pub fn dest_map_key(mut self, key: Option<&str>) -> Self {
        self.kind = FieldMapKind::MapBacked;
        self.dest_kind = Some(AccessorKind::MapEntry {
            key: key.map(str::to_string),
        });
        self
    }

    /// Read the source field slot directly.
    pub fn src_direct(mut self) -> Self {
        self.src_kind = Some(AccessorKind::Field);
        self
    }

    /// Write the destination field slot directly.
    pub fn dest_direct(mut self) -> Self {
        self.dest_kind = Some(AccessorKind::Field);
        self
    }

    pub fn src_accessors(mut self, getter: Option<&str>, setter: Option<&str>) -> Self {
        self.kind = FieldMapKind::CustomAccessor;
        self.src_kind = Some(AccessorKind::Property {
            getter: getter.map(str::to_string),
            setter: setter.map(str::to_string),
        });
        self
    }

    pub fn dest_accessors(mut self, getter: Option<&str>, setter: Option<&str>) -> Self {
        self.kind = FieldMapKind::CustomAccessor;
        self.dest_kind = Some(AccessorKind::Property {
            getter: getter.map(str::to_string),
            setter: setter.map(str::to_string),
        });
        self
    }

    pub fn src_hint(mut self, hints: HintContainer) -> Self {
        self.src_hints = Some(hints);
        self
    }

    pub fn dest_hint(mut self, hints: HintContainer) -> Self {
        self.dest_hints = Some(hints);
        self
    }

    pub fn src_deep_hint(mut self, hints: HintContainer) -> Self {
        self.src_deep_hints = Some(hints);
        self
    }

    pub fn dest_deep_hint(mut self, hints: HintContainer) -> Self {
        self.dest_deep_hints = Some(hints);
        self
    }

    pub fn src_create_method(mut self, method: impl Into<String>) -> Self {
        self.src_create_method = Some(method.into());
        self
    }

    pub fn dest_create_method(mut self, method: impl Into<String>) -> Self {
        self.dest_create_method = Some(method.into());
        self
    }

    pub fn relationship(mut self, relationship: RelationshipType) -> Self {
        self.relationship = Some(relationship);
        self
    }

    pub fn remove_orphans(mut self, remove: bool) -> Self {
        self.remove_orphans = remove;
        self
    }

    pub fn copy_by_reference(mut self, by_ref: bool) -> Self {
        self.copy_by_reference = by_ref;
        self
    }

    pub fn converter(mut self, converter: Arc<dyn CustomConverter>) -> Self {
        self.converter = Some(ConverterRef::Instance(converter));
        self
    }

    pub fn converter_id(mut self, id: impl Into<String>) -> Self {
        self.converter = Some(ConverterRef::Id(id.into()));
        self
    }

    pub fn map_null(mut self, map_null: bool) -> Self {
        self.map_null = Some(map_null);
        self
    }

    pub fn map_empty_string(mut self, map_empty: bool) -> Self {
        self.map_empty_string = Some(map_empty);
        self
    }

    pub fn trim_strings(mut self, trim: bool) -> Self {
        self.trim_strings = Some(trim);
        self
    }

    pub fn map_id(mut self, map_id: impl Into<String>) -> Self {
        self.map_id = Some(map_id.into());
        self
    }

    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    /// Map each element of the source collection as a separate write.
    pub fn iterate(mut self) -> Self {
        self.iterate = true;
        self
    }

    /// Excluded from the reverse class map.
    pub fn one_way(mut self) -> Self {
        self.one_way = true;
        self
    }

    pub fn build(self) -> MappingResult<FieldMap> {
        let mut src_path = FieldPath::parse(&self.src)?;
        if let Some(kind) = self.src_kind {
            src_path = src_path.with_kind(kind);
        }
        let mut dest_path = FieldPath::parse(&self.dest)?;
        if let Some(kind) = self.dest_kind {
            dest_path = dest_path.with_kind(kind);
        }
        Ok(FieldMap {
            id: next_id(),
            kind: self.kind,
            src: FieldSide {
                hints: self.src_hints,
                deep_hints: self.src_deep_hints,
                create_method: self.src_create_method,
                ..FieldSide::new(src_path)
            },
            dest: FieldSide {
                hints: self.dest_hints,
                deep_hints: self.dest_deep_hints,
                create_method: self.dest_create_method,
                ..FieldSide::new(dest_path)
            },
            relationship: self.relationship,
            remove_orphans: self.remove_orphans,
            copy_by_reference: self.copy_by_reference,
            converter: self.converter,
            map_null: self.map_null,
            map_empty_string: self.map_empty_string,
            trim_strings: self.trim_strings,
            map_id: self.map_id,
            date_format: self.date_format,
            iterate: self.iterate,
            one_way: self.one_way,
        })
    }
}
