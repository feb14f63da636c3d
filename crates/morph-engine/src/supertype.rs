//! Ancestor and interface class maps that apply to a type pair.

use std::sync::Arc;

use moka::sync::Cache;

use morph_core::classmap::ClassMap;
use morph_core::model::{TypeName, TypeRef, TypeRegistry};

use crate::registry::ClassMapRegistry;

type SuperMaps = Arc<Vec<Arc<ClassMap>>>;

/// Finds registered class maps keyed by any combination of the source type
/// or one of its supertypes with the destination type or one of its
/// supertypes. Results are cached per (registry generation, destination,
/// source), so a lookup racing a registration never outlives it.
pub struct SuperTypeResolver {
    cache: Cache<(u64, TypeRef, TypeRef), SuperMaps>,
}

impl SuperTypeResolver {
    pub fn new(capacity: Option<u64>) -> Self {
        let cache = match capacity {
            Some(max) => Cache::new(max),
            None => Cache::builder().build(),
        };
        Self { cache }
    }

    /// Applicable maps, farthest ancestors first so nearer ones win.
    pub fn resolve(&self, registry: &ClassMapRegistry, src: &TypeRef, dest: &TypeRef) -> SuperMaps {
        let (TypeRef::Named(src_name), TypeRef::Named(dest_name)) = (src, dest) else {
            return Arc::new(Vec::new());
        };
        let generation = registry.generation();
        self.cache.get_with((generation, dest.clone(), src.clone()), || {
            Arc::new(collect(registry, src_name, dest_name))
        })
    }

    /// Drop every cached result. Entries from older generations are never
    /// read again, so this only reclaims memory.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }

    pub fn cached_pairs(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

impl Default for SuperTypeResolver {
    fn default() -> Self {
        Self::new(None)
    }
}

/// The type itself, its parent chain, then its interfaces.
fn lineage(types: &TypeRegistry, name: &TypeName) -> Vec<TypeName> {
    let mut out = vec![name.clone()];
    out.extend(types.ancestors(name.as_str()));
    out.extend(types.all_interfaces(name.as_str()));
    out
}

fn collect(registry: &ClassMapRegistry, src: &TypeName, dest: &TypeName) -> Vec<Arc<ClassMap>> {
    let types = registry.types();
    let src_line = lineage(types, src);
    let dest_line = lineage(types, dest);

    let mut found: Vec<Arc<ClassMap>> = Vec::new();
    for s in &src_line {
        for d in &dest_line {
            if s == src && d == dest {
                continue;
            }
            let hit = registry.get_registered(&TypeRef::Named(s.clone()), &TypeRef::Named(d.clone()), None);
            if let Some(cm) = hit {
                if !found.iter().any(|f| Arc::ptr_eq(f, &cm)) {
                    found.push(cm);
                }
            }
        }
    }
    found.reverse();
    found
}
