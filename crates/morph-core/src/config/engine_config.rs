//! Engine runtime settings.

use serde::{Deserialize, Serialize};

/// Lifetime of the identity memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoScope {
    /// One memo for the engine's lifetime; never evicted automatically.
    #[default]
    Engine,
    /// A fresh memo for every top-level call.
    Call,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Default: engine.
    pub memo_scope: Option<MemoScope>,
    /// Collect mapping statistics. Default: true.
    pub statistics_enabled: Option<bool>,
    /// Maximum converter-lookup cache entries. Default: unbounded.
    pub converter_cache_capacity: Option<u64>,
    /// Maximum super-type cache entries. Default: unbounded.
    pub super_type_cache_capacity: Option<u64>,
}

impl EngineConfig {
    pub fn effective_memo_scope(&self) -> MemoScope {
        self.memo_scope.unwrap_or_default()
    }

    pub fn effective_statistics_enabled(&self) -> bool {
        self.statistics_enabled.unwrap_or(true)
    }
}
