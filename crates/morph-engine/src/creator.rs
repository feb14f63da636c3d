//! Default destination construction.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use morph_core::errors::{MappingError, MappingResult};
use morph_core::model::{TypeRef, Value};
use morph_core::traits::{BeanCreator, BeanFactory, CreateRequest};

use crate::accessor::new_container;

/// Tries, in order: the named bean factory, the named create method on the
/// destination type, container allocation, plain instantiation.
#[derive(Default, Clone)]
pub struct DefaultBeanCreator {
    factories: FxHashMap<String, Arc<dyn BeanFactory>>,
}

impl DefaultBeanCreator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_factory(&mut self, name: impl Into<String>, factory: Arc<dyn BeanFactory>) {
        self.factories.insert(name.into(), factory);
    }

    pub fn with_factory(mut self, name: impl Into<String>, factory: Arc<dyn BeanFactory>) -> Self {
        self.register_factory(name, factory);
        self
    }

    pub fn factory_count(&self) -> usize {
        self.factories.len()
    }
}

impl BeanCreator for DefaultBeanCreator {
    fn create(&self, req: &CreateRequest<'_>) -> MappingResult<Value> {
        if let Some(name) = req.factory {
            let factory = self.factories.get(name).ok_or_else(|| {
                MappingError::configuration(format!("bean factory '{name}' is not registered"))
            })?;
            return Ok(factory.create_bean(req)?);
        }

        if let Some(method) = req.create_method {
            let type_name = req.dest_type.as_named().ok_or_else(|| {
                MappingError::instantiation(
                    req.dest_type.to_string(),
                    format!("create method '{method}' needs a registered type"),
                )
            })?;
            let def = req.types.get(type_name.as_str()).ok_or_else(|| {
                MappingError::instantiation(type_name.as_str(), "type is not registered")
            })?;
            let create = def.create_method(method).ok_or_else(|| {
                MappingError::instantiation(
                    type_name.as_str(),
                    format!("no create method '{method}'"),
                )
            })?;
            return Ok(create(req.types)?);
        }

        if let Some(container) = new_container(req.dest_type) {
            return Ok(container);
        }
        match req.dest_type {
            TypeRef::Named(name) => Ok(Value::Object(req.types.instantiate(name.as_str())?)),
            other => Err(MappingError::instantiation(
                other.to_string(),
                "only registered classes and containers can be created",
            )),
        }
    }
}

impl std::fmt::Debug for DefaultBeanCreator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultBeanCreator")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morph_core::errors::ExtensionError;
    use morph_core::model::{TypeDef, TypeRegistry};

    fn types() -> TypeRegistry {
        TypeRegistry::new()
            .with(
                TypeDef::class("Invoice")
                    .field("number", TypeRef::String)
                    .create_method("draft", |types: &TypeRegistry| {
                        let obj = types
                            .instantiate("Invoice")
                            .map_err(ExtensionError::from_error)?;
                        Ok(Value::Object(obj.with("number", "DRAFT")))
                    })
                    .build(),
            )
            .with(TypeDef::interface("Document").build())
    }

    fn request<'a>(
        types: &'a TypeRegistry,
        dest: &'a TypeRef,
        factory: Option<&'a str>,
        create_method: Option<&'a str>,
    ) -> CreateRequest<'a> {
        CreateRequest {
            source: &Value::Null,
            src_type: &TypeRef::Any,
            dest_type: dest,
            declared_dest_type: dest,
            factory,
            create_method,
            types,
        }
    }

    #[test]
    fn instantiates_registered_classes_and_containers() {
        let types = types();
        let creator = DefaultBeanCreator::new();
        let invoice = TypeRef::named("Invoice");
        let made = creator.create(&request(&types, &invoice, None, None)).unwrap();
        assert_eq!(made.runtime_type(), invoice);

        let list = TypeRef::list_of(TypeRef::String);
        let made = creator.create(&request(&types, &list, None, None)).unwrap();
        assert!(matches!(made, Value::List(_)));
    }

    #[test]
    fn create_method_is_used_when_named() {
        let types = types();
        let invoice = TypeRef::named("Invoice");
        let made = DefaultBeanCreator::new()
            .create(&request(&types, &invoice, None, Some("draft")))
            .unwrap();
        assert_eq!(made.as_object().and_then(|o| o.get("number")), Some(Value::from("DRAFT")));
    }

    #[test]
    fn named_factory_wins() {
        let types = types();
        let creator = DefaultBeanCreator::new().with_factory(
            "numbers",
            Arc::new(|_: &CreateRequest<'_>| -> Result<Value, ExtensionError> { Ok(Value::Int(7)) }),
        );
        let any = TypeRef::Any;
        let made = creator.create(&request(&types, &any, Some("numbers"), None)).unwrap();
        assert_eq!(made, Value::Int(7));

        let err = creator
            .create(&request(&types, &any, Some("missing"), None))
            .unwrap_err();
        assert!(matches!(err, MappingError::Configuration { .. }));
    }

    #[test]
    fn interfaces_cannot_be_created() {
        let types = types();
        let doc = TypeRef::named("Document");
        let err = DefaultBeanCreator::new()
            .create(&request(&types, &doc, None, None))
            .unwrap_err();
        assert!(matches!(err, MappingError::Instantiation { .. }));
    }
}
