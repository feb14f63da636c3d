//! Explicit element types for when runtime types are not enough.

use crate::errors::{MappingError, MappingResult};
use crate::model::TypeRef;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct HintContainer {
    hints: Vec<TypeRef>,
}

impl HintContainer {
    pub fn new(hints: impl IntoIterator<Item = TypeRef>) -> Self {
        Self {
            hints: hints.into_iter().collect(),
        }
    }

    pub fn single(hint: impl Into<TypeRef>) -> Self {
        Self {
            hints: vec![hint.into()],
        }
    }

    pub fn hints(&self) -> &[TypeRef] {
        &self.hints
    }

    pub fn len(&self) -> usize {
        self.hints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }

    pub fn has_more_than_one(&self) -> bool {
        self.hints.len() > 1
    }

    /// The hint, when there is exactly one.
    pub fn single_hint(&self) -> Option<&TypeRef> {
        match self.hints.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Pick the hint paired with `src_type`.
    ///
    /// A single hint always wins. With several, the source-side hints are
    /// matched by position against `src_type`; no match yields `src_type`.
    pub fn hint_for(
        &self,
        src_type: &TypeRef,
        src_hints: Option<&HintContainer>,
    ) -> MappingResult<TypeRef> {
        if let Some(only) = self.single_hint() {
            return Ok(only.clone());
        }
        let src_hints = src_hints.map(HintContainer::hints).unwrap_or(&[]);
        if src_hints.len() != self.hints.len() {
            return Err(MappingError::configuration(
                "multiple source and destination hints must have the same number of entries",
            ));
        }
        Ok(src_hints
            .iter()
            .position(|h| h == src_type)
            .map(|i| self.hints[i].clone())
            .unwrap_or_else(|| src_type.clone()))
    }
}
