//! Errors raised by user-supplied extension points (custom converters,
//! getters/setters, bean factories, field mappers).

use std::error::Error as StdError;

/// An error surfaced from user code.
///
/// `kind` names the concrete error type. Class maps list the kinds that are
/// allowed to propagate unmodified out of a field mapping.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ExtensionError {
    kind: String,
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl ExtensionError {
    /// Create an error with an explicit kind name and no underlying cause.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a concrete error; its type name becomes the kind.
    pub fn from_error<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            kind: std::any::type_name::<E>().to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Kind name of the wrapped error type.
    pub fn kind_of<E: 'static>() -> &'static str {
        std::any::type_name::<E>()
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Borrow the wrapped error as its concrete type, if it is one.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.as_ref().and_then(|s| s.downcast_ref::<E>())
    }
}
