use crate::error::Result;
use crate::model::{BatteryInfo, CounterReading, HostIdentity, MemoryInfo, PartitionUsage, ProcessInfo};

/// Capability surface the sampler depends on.
///
/// Outer `Err` values mean the whole source is gone and are fatal. Per-item
/// `Err` values inside the returned lists (one partition, one process) are
/// dropped by the sampler for that tick.
pub trait MetricsSource {
    fn host_identity(&self) -> HostIdentity;

    /// Utilization per logical core since the previous call. Must not block.
    fn cpu_per_core(&mut self) -> Result<Vec<f64>>;

    fn memory(&mut self) -> Result<MemoryInfo>;

    fn counters(&mut self) -> Result<CounterReading>;

    fn partitions(&mut self) -> Result<Vec<Result<PartitionUsage>>>;

    /// `None` when the host has no battery sensor.
    fn battery(&mut self) -> Option<BatteryInfo>;

    fn processes(&mut self) -> Result<Vec<Result<ProcessInfo>>>;
}
