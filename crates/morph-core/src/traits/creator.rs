//! Destination construction.

use crate::errors::{ExtensionError, MappingResult};
use crate::model::{TypeRef, TypeRegistry, Value};

/// Everything known about a destination that needs constructing.
pub struct CreateRequest<'a> {
    pub source: &'a Value,
    pub src_type: &'a TypeRef,
    /// Hinted or configured destination type.
    pub dest_type: &'a TypeRef,
    /// Type declared by the destination accessor.
    pub declared_dest_type: &'a TypeRef,
    /// Name of a registered [`BeanFactory`].
    pub factory: Option<&'a str>,
    /// Name of a create method on the destination type.
    pub create_method: Option<&'a str>,
    pub types: &'a TypeRegistry,
}

/// Builds destination instances. Fails with an instantiation error when no
/// usable factory, create method or constructor exists.
pub trait BeanCreator: Send + Sync {
    fn create(&self, req: &CreateRequest<'_>) -> MappingResult<Value>;
}

/// A named factory selectable per class map.
pub trait BeanFactory: Send + Sync {
    fn create_bean(&self, req: &CreateRequest<'_>) -> Result<Value, ExtensionError>;
}

impl<F> BeanFactory for F
where
    F: Fn(&CreateRequest<'_>) -> Result<Value, ExtensionError> + Send + Sync,
{
    fn create_bean(&self, req: &CreateRequest<'_>) -> Result<Value, ExtensionError> {
        self(req)
    }
}
