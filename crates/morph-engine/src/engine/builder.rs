use std::sync::Arc;

use rustc_hash::FxHashMap;

use morph_core::classmap::{ClassMap, ConverterDescriptor};
use morph_core::config::MorphConfig;
use morph_core::errors::MappingResult;
use morph_core::events::{EventDispatcher, MappingEventHandler};
use morph_core::model::{TypeRef, TypeRegistry};
use morph_core::telemetry::{MappingStatistics, StatisticsSink};
use morph_core::traits::{BeanCreator, BeanFactory, CustomConverter, CustomFieldMapper};

use super::{IdentityMemo, MappingEngine};
use crate::accessor::AccessorResolver;
use crate::converter::TypeConverter;
use crate::creator::DefaultBeanCreator;
use crate::lookup::ConverterLookup;
use crate::registry::ClassMapRegistry;
use crate::supertype::SuperTypeResolver;

/// Collects configuration, class maps and extensions, then builds a
/// [`MappingEngine`].
pub struct MappingEngineBuilder {
    types: Arc<TypeRegistry>,
    config: MorphConfig,
    class_maps: Vec<ClassMap>,
    converters: Vec<ConverterDescriptor>,
    converters_by_id: FxHashMap<String, Arc<dyn CustomConverter>>,
    bean_creator: Option<Arc<dyn BeanCreator>>,
    default_creator: DefaultBeanCreator,
    events: EventDispatcher,
    sinks: Vec<Arc<dyn StatisticsSink>>,
    field_mapper: Option<Arc<dyn CustomFieldMapper>>,
}

impl MappingEngineBuilder {
    pub(super) fn new(types: Arc<TypeRegistry>) -> Self {
        Self {
            types,
            config: MorphConfig::default(),
            class_maps: Vec::new(),
            converters: Vec::new(),
            converters_by_id: FxHashMap::default(),
            bean_creator: None,
            default_creator: DefaultBeanCreator::new(),
            events: EventDispatcher::new(),
            sinks: Vec::new(),
            field_mapper: None,
        }
    }

    pub fn config(mut self, config: MorphConfig) -> Self {
        self.config = config;
        self
    }

    /// Registered in order on `build()`.
    pub fn class_map(mut self, class_map: ClassMap) -> Self {
        self.class_maps.push(class_map);
        self
    }

    /// Engine-wide converter between `a` and `b`, applied in both directions.
    pub fn converter(
        mut self,
        a: impl Into<TypeRef>,
        b: impl Into<TypeRef>,
        converter: Arc<dyn CustomConverter>,
    ) -> Self {
        self.converters.push(ConverterDescriptor {
            a: a.into(),
            b: b.into(),
            converter,
        });
        self
    }

    /// Converter referenced from field maps by id.
    pub fn converter_with_id(mut self, id: impl Into<String>, converter: Arc<dyn CustomConverter>) -> Self {
        self.converters_by_id.insert(id.into(), converter);
        self
    }

    /// Replace the default bean creator entirely.
    pub fn bean_creator(mut self, creator: Arc<dyn BeanCreator>) -> Self {
        self.bean_creator = Some(creator);
        self
    }

    /// Named factory for the default bean creator.
    pub fn bean_factory(mut self, name: impl Into<String>, factory: Arc<dyn BeanFactory>) -> Self {
        self.default_creator.register_factory(name, factory);
        self
    }

    pub fn event_handler(mut self, handler: Arc<dyn MappingEventHandler>) -> Self {
        self.events.register(handler);
        self
    }

    /// Additional statistics sink, fed alongside the built-in counters.
    pub fn statistics(mut self, sink: Arc<dyn StatisticsSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn field_mapper(mut self, mapper: Arc<dyn CustomFieldMapper>) -> Self {
        self.field_mapper = Some(mapper);
        self
    }

    pub fn build(self) -> MappingResult<MappingEngine> {
        let engine_config = &self.config.engine;
        let statistics = engine_config
            .effective_statistics_enabled()
            .then(|| Arc::new(MappingStatistics::new()));
        let mut sinks = self.sinks;
        if let Some(stats) = &statistics {
            sinks.insert(0, Arc::clone(stats) as Arc<dyn StatisticsSink>);
        }

        let engine = MappingEngine {
            class_maps: ClassMapRegistry::new(Arc::clone(&self.types), self.config.mapping.clone()),
            super_types: SuperTypeResolver::new(engine_config.super_type_cache_capacity),
            accessors: AccessorResolver::new(Arc::clone(&self.types)),
            converter: TypeConverter::new(engine_config.converter_cache_capacity),
            converters: ConverterLookup::new(self.converters, engine_config.converter_cache_capacity),
            converters_by_id: self.converters_by_id,
            creator: self
                .bean_creator
                .unwrap_or_else(|| Arc::new(self.default_creator)),
            events: self.events,
            statistics,
            sinks,
            field_mapper: self.field_mapper,
            memo: IdentityMemo::new(),
            types: self.types,
            config: self.config,
        };
        for class_map in self.class_maps {
            engine.class_maps.register(class_map)?;
        }
        tracing::debug!(
            types = engine.types.len(),
            class_maps = engine.class_maps.registered_count(),
            "mapping engine ready"
        );
        Ok(engine)
    }
}
