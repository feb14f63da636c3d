//! Mapping statistics.

pub mod statistics;

pub use statistics::{MappingStatistics, StatisticType, StatisticsSink, StatisticsSnapshot};
