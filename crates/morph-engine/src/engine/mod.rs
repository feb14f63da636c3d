//! The mapping engine: public entry points and shared state.
//!
//! Every top-level call runs a single-threaded recursive walk. Caches, the
//! class-map registry and (by default) the identity memo are shared between
//! calls, so one engine can serve concurrent callers.

mod builder;
mod memo;
mod walk;

use std::sync::Arc;

use rustc_hash::FxHashMap;

use morph_core::classmap::ClassMap;
use morph_core::config::{MemoScope, MorphConfig};
use morph_core::errors::MappingResult;
use morph_core::events::EventDispatcher;
use morph_core::model::{TypeRef, TypeRegistry, Value};
use morph_core::telemetry::{MappingStatistics, StatisticType, StatisticsSink, StatisticsSnapshot};
use morph_core::traits::{BeanCreator, CustomConverter, CustomFieldMapper};

use crate::accessor::AccessorResolver;
use crate::converter::TypeConverter;
use crate::lookup::ConverterLookup;
use crate::registry::ClassMapRegistry;
use crate::supertype::SuperTypeResolver;

pub use builder::MappingEngineBuilder;
pub(crate) use memo::IdentityMemo;
pub(crate) use walk::{FieldContext, MappingWalk};

/// Maps object graphs between types using registered and synthesized class
/// maps. `Send + Sync`; share one instance between callers.
pub struct MappingEngine {
    pub(crate) types: Arc<TypeRegistry>,
    pub(crate) config: MorphConfig,
    pub(crate) class_maps: ClassMapRegistry,
    pub(crate) super_types: SuperTypeResolver,
    pub(crate) accessors: AccessorResolver,
    pub(crate) converter: TypeConverter,
    pub(crate) converters: ConverterLookup,
    pub(crate) converters_by_id: FxHashMap<String, Arc<dyn CustomConverter>>,
    pub(crate) creator: Arc<dyn BeanCreator>,
    pub(crate) events: EventDispatcher,
    pub(crate) statistics: Option<Arc<MappingStatistics>>,
    pub(crate) sinks: Vec<Arc<dyn StatisticsSink>>,
    pub(crate) field_mapper: Option<Arc<dyn CustomFieldMapper>>,
    pub(crate) memo: IdentityMemo,
}

impl MappingEngine {
    pub fn builder(types: impl Into<Arc<TypeRegistry>>) -> MappingEngineBuilder {
        MappingEngineBuilder::new(types.into())
    }

    /// Map `src` onto a new instance of `dest_type`.
    pub fn map(&self, src: &Value, dest_type: impl Into<TypeRef>) -> MappingResult<Value> {
        self.run(|walk| walk.map_new(src, &dest_type.into(), None))
    }

    /// Like [`map`](Self::map), with the class map registered under `map_id`.
    pub fn map_with_id(
        &self,
        src: &Value,
        dest_type: impl Into<TypeRef>,
        map_id: &str,
    ) -> MappingResult<Value> {
        self.run(|walk| walk.map_new(src, &dest_type.into(), non_blank(map_id)))
    }

    /// Map `src` into the existing object `dest`.
    pub fn map_onto(&self, src: &Value, dest: &Value) -> MappingResult<()> {
        self.run(|walk| walk.map_existing(src, dest, None))
    }

    /// Like [`map_onto`](Self::map_onto), with the class map registered under `map_id`.
    pub fn map_onto_with_id(&self, src: &Value, dest: &Value, map_id: &str) -> MappingResult<()> {
        self.run(|walk| walk.map_existing(src, dest, non_blank(map_id)))
    }

    /// Register a class map (and its reverse when bidirectional) after
    /// construction. Super-type lookups cached before it are no longer used.
    pub fn register_class_map(&self, class_map: ClassMap) -> MappingResult<()> {
        self.class_maps.register(class_map)?;
        self.super_types.invalidate();
        Ok(())
    }

    /// Forget every source-to-destination identity recorded so far.
    pub fn reset_identity_memo(&self) {
        self.memo.clear();
    }

    /// Number of source objects currently remembered by the engine-scoped memo.
    pub fn identity_memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Built-in counters, when statistics are enabled.
    pub fn statistics(&self) -> Option<StatisticsSnapshot> {
        self.statistics.as_ref().map(|s| s.snapshot())
    }

    pub fn class_maps(&self) -> &ClassMapRegistry {
        &self.class_maps
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn config(&self) -> &MorphConfig {
        &self.config
    }

    pub fn super_types(&self) -> &SuperTypeResolver {
        &self.super_types
    }

    pub fn accessors(&self) -> &AccessorResolver {
        &self.accessors
    }

    pub fn converter(&self) -> &TypeConverter {
        &self.converter
    }

    fn run<T>(&self, f: impl FnOnce(&MappingWalk<'_>) -> MappingResult<T>) -> MappingResult<T> {
        let call_memo;
        let memo = match self.config.engine.effective_memo_scope() {
            MemoScope::Engine => &self.memo,
            MemoScope::Call => {
                call_memo = IdentityMemo::new();
                &call_memo
            }
        };
        let walk = MappingWalk::new(self, memo);
        let result = f(&walk);
        let stat = if result.is_ok() {
            StatisticType::MappingSuccess
        } else {
            StatisticType::MappingFailure
        };
        walk.stat(stat, 1);
        result
    }
}

fn non_blank(map_id: &str) -> Option<&str> {
    Some(map_id).filter(|id| !id.trim().is_empty())
}

impl std::fmt::Debug for MappingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingEngine")
            .field("types", &self.types.len())
            .field("class_maps", &self.class_maps.registered_count())
            .field("converters", &self.converters.global_count())
            .field("events", &self.events)
            .field("statistics", &self.statistics.is_some())
            .finish()
    }
}
