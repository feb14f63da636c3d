//! User-supplied value converters.

use crate::errors::ExtensionError;
use crate::model::{TypeRef, TypeRegistry, Value};

/// Arguments handed to a [`CustomConverter`].
pub struct ConversionRequest<'a> {
    /// Current value of the destination slot; `Null` when there is none.
    pub existing: &'a Value,
    /// Source value, possibly `Null` so converters can supply defaults.
    pub source: &'a Value,
    pub src_type: &'a TypeRef,
    pub dest_type: &'a TypeRef,
    pub types: &'a TypeRegistry,
}

/// Converts a source value into a destination value, replacing built-in
/// dispatch for the type pair or field it is registered on.
pub trait CustomConverter: Send + Sync {
    fn convert(&self, req: &ConversionRequest<'_>) -> Result<Value, ExtensionError>;
}

impl<F> CustomConverter for F
where
    F: Fn(&ConversionRequest<'_>) -> Result<Value, ExtensionError> + Send + Sync,
{
    fn convert(&self, req: &ConversionRequest<'_>) -> Result<Value, ExtensionError> {
        self(req)
    }
}
