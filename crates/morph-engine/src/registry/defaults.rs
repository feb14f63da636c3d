//! Wildcard field maps and synthesized class maps.

use morph_core::classmap::accessor_spec::SELF_PATH;
use morph_core::classmap::{ClassMap, FieldMap};
use morph_core::config::MappingConfig;
use morph_core::errors::{MappingError, MappingResult};
use morph_core::model::{TypeRef, TypeRegistry};

/// A property name is taken if any field map (excluded ones included) already
/// names it on either side.
fn already_mapped(cm: &ClassMap, name: &str) -> bool {
    cm.field_maps().iter().any(|fm| {
        fm.src().path.to_string() == name || fm.dest().path.to_string() == name
    })
}

/// Same-named field maps for every property not mapped explicitly.
pub(crate) fn augment(types: &TypeRegistry, cm: &mut ClassMap) -> MappingResult<()> {
    let mut added = Vec::new();
    match (cm.src_type(), cm.dest_type()) {
        (TypeRef::Named(src), TypeRef::Named(dest)) => {
            for prop in types.writable_properties(dest.as_str()) {
                if types.is_readable(src.as_str(), &prop) && !already_mapped(cm, &prop) {
                    added.push(FieldMap::builder(prop.as_str(), prop.as_str()).build()?);
                }
            }
        }
        (TypeRef::Named(src), TypeRef::Map) => {
            for prop in types.readable_properties(src.as_str()) {
                if !already_mapped(cm, &prop) {
                    added.push(
                        FieldMap::builder(prop.as_str(), prop.as_str())
                            .dest_map_key(None)
                            .build()?,
                    );
                }
            }
        }
        (TypeRef::Map, TypeRef::Named(dest)) => {
            for prop in types.writable_properties(dest.as_str()) {
                if !already_mapped(cm, &prop) {
                    added.push(
                        FieldMap::builder(prop.as_str(), prop.as_str())
                            .src_map_key(None)
                            .build()?,
                    );
                }
            }
        }
        (TypeRef::Map, TypeRef::Map) => {
            if !already_mapped(cm, SELF_PATH) {
                added.push(FieldMap::builder(SELF_PATH, SELF_PATH).build()?);
            }
        }
        _ => {}
    }
    for fm in added {
        cm.add_field_map(fm);
    }
    Ok(())
}

/// Class map for a pair nobody registered: global policies, plus wildcard
/// field maps when wildcard matching is on.
pub(crate) fn default_class_map(
    types: &TypeRegistry,
    config: &MappingConfig,
    src: &TypeRef,
    dest: &TypeRef,
) -> MappingResult<ClassMap> {
    let supported = matches!(
        (src, dest),
        (TypeRef::Named(_) | TypeRef::Map, TypeRef::Named(_) | TypeRef::Map)
    );
    if !supported {
        return Err(MappingError::configuration(format!(
            "no class mapping can be derived for {src} -> {dest}"
        )));
    }
    let mut cm = ClassMap::builder(src.clone(), dest.clone()).build()?;
    cm.apply_defaults(config);
    if cm.wildcard() {
        augment(types, &mut cm)?;
    }
    Ok(cm)
}
