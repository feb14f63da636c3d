//! Class-map lookup by (source type, destination type, map-id).
//!
//! Registered maps come from configuration. Pairs nobody registered get a
//! synthesized default map on first use, which is then kept for the life of
//! the registry.

pub(crate) mod defaults;

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use morph_core::classmap::{ClassMap, ClassMapKey};
use morph_core::config::MappingConfig;
use morph_core::errors::{MappingError, MappingResult};
use morph_core::model::{TypeRef, TypeRegistry};

#[derive(Default)]
struct Maps {
    registered: FxHashMap<ClassMapKey, Arc<ClassMap>>,
    /// Registration order, for map-id and interface fallback searches.
    order: Vec<ClassMapKey>,
    synthesized: FxHashMap<ClassMapKey, Arc<ClassMap>>,
    /// Bumped by every successful registration.
    generation: u64,
}

/// Registered and synthesized class maps, shared by every mapping call.
pub struct ClassMapRegistry {
    types: Arc<TypeRegistry>,
    config: MappingConfig,
    maps: RwLock<Maps>,
}

impl ClassMapRegistry {
    pub fn new(types: Arc<TypeRegistry>, config: MappingConfig) -> Self {
        Self {
            types,
            config,
            maps: RwLock::new(Maps::default()),
        }
    }

    /// Register a class map, and its reverse when it is bidirectional.
    ///
    /// Unset policies take the global defaults; wildcard maps gain a field map
    /// for every same-named property left unmapped. A key that is already
    /// registered is a configuration error. An existing reverse is kept.
    pub fn register(&self, class_map: ClassMap) -> MappingResult<()> {
        let mut cm = class_map;
        cm.apply_defaults(&self.config);

        let mut reverse = if cm.bidirectional() && cm.src_type() != cm.dest_type() {
            Some(cm.reversed())
        } else {
            None
        };
        if cm.wildcard() {
            defaults::augment(&self.types, &mut cm)?;
        }
        if let Some(rev) = reverse.as_mut() {
            if rev.wildcard() {
                defaults::augment(&self.types, rev)?;
            }
        }

        let key = cm.key();
        let mut maps = self.maps.write();
        if maps.registered.contains_key(&key) {
            return Err(MappingError::configuration(format!(
                "duplicate class mapping {key}"
            )));
        }
        debug!(class_map = %key, fields = cm.field_maps().len(), "registered class map");
        maps.synthesized.remove(&key);
        maps.registered.insert(key.clone(), Arc::new(cm));
        maps.order.push(key);

        if let Some(rev) = reverse {
            let rev_key = rev.key();
            if !maps.registered.contains_key(&rev_key) {
                maps.synthesized.remove(&rev_key);
                maps.registered.insert(rev_key.clone(), Arc::new(rev));
                maps.order.push(rev_key);
            }
        }
        maps.generation += 1;
        Ok(())
    }

    /// Changes whenever the set of registered maps does. Results derived from
    /// the registered maps are valid only for the generation they were read at.
    pub fn generation(&self) -> u64 {
        self.maps.read().generation
    }

    /// Exact lookup among registered maps only.
    pub fn get_registered(
        &self,
        src: &TypeRef,
        dest: &TypeRef,
        map_id: Option<&str>,
    ) -> Option<Arc<ClassMap>> {
        let key = ClassMapKey::new(src.clone(), dest.clone(), map_id);
        self.maps.read().registered.get(&key).cloned()
    }

    /// Resolve the class map for a pair.
    ///
    /// With a map-id: the exact key, else any map registered under that id
    /// whose source accepts `src` and whose destination is compatible with
    /// `dest`; otherwise a configuration error. Without one: the exact key,
    /// else a registered map whose destination implements an abstract or
    /// interface `dest`, else a synthesized default.
    pub fn find(
        &self,
        src: &TypeRef,
        dest: &TypeRef,
        map_id: Option<&str>,
    ) -> MappingResult<Arc<ClassMap>> {
        let key = ClassMapKey::new(src.clone(), dest.clone(), map_id);
        {
            let maps = self.maps.read();
            if let Some(found) = maps.registered.get(&key) {
                return Ok(Arc::clone(found));
            }
            if let Some(found) = self.find_compatible(&maps, src, dest, map_id) {
                return Ok(found);
            }
            if map_id.is_none() {
                if let Some(found) = maps.synthesized.get(&key) {
                    return Ok(Arc::clone(found));
                }
            }
        }
        if let Some(id) = map_id {
            return Err(MappingError::configuration(format!(
                "class mapping not found for map-id '{id}' ({src} -> {dest})"
            )));
        }

        let created = Arc::new(defaults::default_class_map(
            &self.types,
            &self.config,
            src,
            dest,
        )?);
        let mut maps = self.maps.write();
        let entry = maps
            .synthesized
            .entry(key)
            .or_insert_with(|| {
                info!(
                    class_map = %created.describe(),
                    fields = created.field_maps().len(),
                    "synthesized default class map"
                );
                Arc::clone(&created)
            });
        Ok(Arc::clone(entry))
    }

    fn find_compatible(
        &self,
        maps: &Maps,
        src: &TypeRef,
        dest: &TypeRef,
        map_id: Option<&str>,
    ) -> Option<Arc<ClassMap>> {
        let abstract_dest = dest
            .as_named()
            .and_then(|n| self.types.get(n.as_str()))
            .is_some_and(|d| !d.is_instantiable());
        if map_id.is_none() && !abstract_dest {
            return None;
        }
        maps.order
            .iter()
            .filter_map(|k| maps.registered.get(k))
            .find(|cm| {
                cm.map_id() == map_id
                    && self.types.is_assignable(cm.src_type(), src)
                    && (self.types.is_assignable(dest, cm.dest_type())
                        || (map_id.is_some() && self.types.is_assignable(cm.dest_type(), dest)))
            })
            .cloned()
    }

    /// Registered maps in registration order.
    pub fn registered(&self) -> Vec<Arc<ClassMap>> {
        let maps = self.maps.read();
        maps.order
            .iter()
            .filter_map(|k| maps.registered.get(k).cloned())
            .collect()
    }

    pub fn registered_count(&self) -> usize {
        self.maps.read().registered.len()
    }

    pub fn synthesized_count(&self) -> usize {
        self.maps.read().synthesized.len()
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }
}
