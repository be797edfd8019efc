use super::ProcessInfo;
use chrono::{DateTime, Local};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostIdentity {
    pub os_name: String,
    pub hostname: String,
    pub kernel: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryInfo {
    pub total: u64,
    pub used: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetworkRates {
    pub tx_bytes_sec: f64,
    pub rx_bytes_sec: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiskIoRates {
    pub read_bytes_sec: f64,
    pub write_bytes_sec: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionUsage {
    pub device: String,
    pub mount_point: String,
    pub fs_type: String,
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryInfo {
    pub percent: f64,
    pub plugged: bool,
}

/// Cumulative OS counters read at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterReading {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub disk_read: u64,
    pub disk_write: u64,
    pub taken_at: std::time::SystemTime,
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub taken_at: DateTime<Local>,
    pub cpu_per_core: Vec<f64>,
    pub memory: MemoryInfo,
    pub network: NetworkRates,
    pub disk_io: DiskIoRates,
    pub partitions: Vec<PartitionUsage>,
    pub battery: Option<BatteryInfo>,
    pub processes: Vec<ProcessInfo>,
}
