//! Source identity to destination objects already produced for it.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use morph_core::model::{TypeRef, TypeRegistry, Value};

struct MemoEntry {
    /// Keeps the source alive so its address cannot be reused by another
    /// object while the entry exists.
    _source: Value,
    targets: SmallVec<[Value; 2]>,
}

/// Keyed by object identity, never by equality: two equal but distinct
/// sources get distinct destinations. Holds one destination per runtime type.
#[derive(Default)]
pub(crate) struct IdentityMemo {
    entries: Mutex<FxHashMap<usize, MemoEntry>>,
}

impl IdentityMemo {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Only objects are tracked; scalars and containers are ignored.
    pub(crate) fn record(&self, src: &Value, dest: &Value) {
        let (Value::Object(obj), Some(_)) = (src, dest.identity()) else {
            return;
        };
        let dest_type = dest.runtime_type();
        let mut entries = self.entries.lock();
        let entry = entries.entry(obj.id()).or_insert_with(|| MemoEntry {
            _source: src.clone(),
            targets: SmallVec::new(),
        });
        entry.targets.retain(|t| t.runtime_type() != dest_type);
        entry.targets.push(dest.clone());
    }

    /// A destination already produced for `src` that fits `want`.
    pub(crate) fn lookup(&self, src: &Value, want: &TypeRef, types: &TypeRegistry) -> Option<Value> {
        let Value::Object(obj) = src else {
            return None;
        };
        let entries = self.entries.lock();
        entries
            .get(&obj.id())?
            .targets
            .iter()
            .find(|t| types.is_value_assignable(want, t))
            .cloned()
    }

    pub(crate) fn clear(&self) {
        self.entries.lock().clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
