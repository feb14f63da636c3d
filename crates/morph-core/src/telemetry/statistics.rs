//! Monotonic counters for mapping outcomes and custom converter cost.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticType {
    MappingSuccess,
    MappingFailure,
    FieldMappingSuccess,
    FieldMappingFailure,
    FieldMappingIgnoredFailure,
    CustomConverterSuccess,
    /// Cumulative microseconds spent inside custom converters.
    CustomConverterTime,
}

/// Receiver of statistic increments. Must tolerate concurrent calls.
pub trait StatisticsSink: Send + Sync {
    fn increment(&self, stat: StatisticType, by: u64);

    fn record_converter_time(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.increment(StatisticType::CustomConverterTime, micros);
    }
}

/// Lock-free in-memory statistics.
#[derive(Debug, Default)]
pub struct MappingStatistics {
    mapping_success: AtomicU64,
    mapping_failure: AtomicU64,
    field_success: AtomicU64,
    field_failure: AtomicU64,
    field_ignored_failure: AtomicU64,
    converter_success: AtomicU64,
    converter_micros: AtomicU64,
}

/// Point-in-time copy of [`MappingStatistics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub mapping_success: u64,
    pub mapping_failure: u64,
    pub field_success: u64,
    pub field_failure: u64,
    pub field_ignored_failure: u64,
    pub converter_success: u64,
    pub converter_micros: u64,
}

impl MappingStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, stat: StatisticType) -> &AtomicU64 {
        match stat {
            StatisticType::MappingSuccess => &self.mapping_success,
            StatisticType::MappingFailure => &self.mapping_failure,
            StatisticType::FieldMappingSuccess => &self.field_success,
            StatisticType::FieldMappingFailure => &self.field_failure,
            StatisticType::FieldMappingIgnoredFailure => &self.field_ignored_failure,
            StatisticType::CustomConverterSuccess => &self.converter_success,
            StatisticType::CustomConverterTime => &self.converter_micros,
        }
    }

    pub fn get(&self, stat: StatisticType) -> u64 {
        self.counter(stat).load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            mapping_success: self.get(StatisticType::MappingSuccess),
            mapping_failure: self.get(StatisticType::MappingFailure),
            field_success: self.get(StatisticType::FieldMappingSuccess),
            field_failure: self.get(StatisticType::FieldMappingFailure),
            field_ignored_failure: self.get(StatisticType::FieldMappingIgnoredFailure),
            converter_success: self.get(StatisticType::CustomConverterSuccess),
            converter_micros: self.get(StatisticType::CustomConverterTime),
        }
    }
}

impl StatisticsSink for MappingStatistics {
    fn increment(&self, stat: StatisticType, by: u64) {
        self.counter(stat).fetch_add(by, Ordering::Relaxed);
    }
}
