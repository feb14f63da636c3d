//! Class-level custom converter lookup.

use std::sync::Arc;

use moka::sync::Cache;

use morph_core::classmap::{ClassMap, ConverterDescriptor};
use morph_core::model::{TypeRef, TypeRegistry};
use morph_core::traits::CustomConverter;

type Found = Option<Arc<dyn CustomConverter>>;

/// Matches a (source, destination) type pair against converter descriptors,
/// in either direction. The active class map's converters are searched first,
/// then the engine-wide ones, whose outcome is cached per pair.
pub struct ConverterLookup {
    global: Vec<ConverterDescriptor>,
    cache: Cache<(TypeRef, TypeRef), Found>,
}

impl ConverterLookup {
    pub fn new(global: Vec<ConverterDescriptor>, capacity: Option<u64>) -> Self {
        let cache = match capacity {
            Some(max) => Cache::new(max),
            None => Cache::builder().build(),
        };
        Self { global, cache }
    }

    pub fn find(
        &self,
        class_map: &ClassMap,
        src: &TypeRef,
        dest: &TypeRef,
        types: &TypeRegistry,
    ) -> Found {
        if let Some(found) = first_match(class_map.converters(), src, dest, types) {
            return Some(found);
        }
        if self.global.is_empty() {
            return None;
        }
        self.cache.get_with((src.clone(), dest.clone()), || {
            first_match(&self.global, src, dest, types)
        })
    }

    pub fn global_count(&self) -> usize {
        self.global.len()
    }
}

fn first_match(
    descriptors: &[ConverterDescriptor],
    src: &TypeRef,
    dest: &TypeRef,
    types: &TypeRegistry,
) -> Found {
    descriptors
        .iter()
        .find(|d| {
            (types.is_assignable(&d.a, src) && types.is_assignable(&d.b, dest))
                || (types.is_assignable(&d.b, src) && types.is_assignable(&d.a, dest))
        })
        .map(|d| Arc::clone(&d.converter))
}
