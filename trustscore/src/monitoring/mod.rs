//! Dashboard-facing views over the health and pipeline registries.

mod aggregator;
mod counters;
mod system;
mod views;

pub use aggregator::{MetricsAggregator, performance, pipeline_stats};
pub use counters::{RunCounters, RunCountersSnapshot};
pub use system::{MemoryUsage, current_memory};
pub use views::{
    HealthView, MonitoringView, PerformanceView, PipelineStats, ServiceView, ServicesView,
    SystemView,
};
