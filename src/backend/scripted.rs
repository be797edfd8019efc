//! Deterministic `MetricsSource` for tests.

use crate::backend::MetricsSource;
use crate::error::{MonitorError, Result};
use crate::model::{BatteryInfo, CounterReading, HostIdentity, MemoryInfo, PartitionUsage, ProcessInfo};
use std::time::{Duration, SystemTime};

/// `(bytes_sent, bytes_recv, disk_read, disk_write, seconds since epoch)`
pub type ScriptedCounters = (u64, u64, u64, u64, f64);

pub struct ScriptedSource {
    counters: Vec<ScriptedCounters>,
    counter_calls: usize,
    fail_counters_after: Option<usize>,
    partitions: Vec<(String, std::result::Result<f64, ()>)>,
    processes: Vec<std::result::Result<ProcessInfo, i32>>,
    battery: Option<BatteryInfo>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            counters: vec![(0, 0, 0, 0, 0.0)],
            counter_calls: 0,
            fail_counters_after: None,
            partitions: Vec::new(),
            processes: Vec::new(),
            battery: None,
        }
    }

    /// Each `counters()` call consumes one entry; the last one repeats.
    pub fn with_counters(mut self, readings: &[ScriptedCounters]) -> Self {
        self.counters = readings.to_vec();
        self
    }

    /// `counters()` reports the source as unavailable from call `n` on (0-based).
    pub fn fail_counters_after(mut self, n: usize) -> Self {
        self.fail_counters_after = Some(n);
        self
    }

    /// `Ok(percent)` is a readable mount, `Err(())` a permission-denied one.
    pub fn with_partition(mut self, mount_point: &str, usage: std::result::Result<f64, ()>) -> Self {
        self.partitions.push((mount_point.to_string(), usage));
        self
    }

    pub fn with_process(mut self, process: ProcessInfo) -> Self {
        self.processes.push(Ok(process));
        self
    }

    pub fn with_vanished_process(mut self, pid: i32) -> Self {
        self.processes.push(Err(pid));
        self
    }

    pub fn with_battery(mut self, battery: BatteryInfo) -> Self {
        self.battery = Some(battery);
        self
    }
}

impl MetricsSource for ScriptedSource {
    fn host_identity(&self) -> HostIdentity {
        HostIdentity {
            os_name: "Linux".into(),
            hostname: "scripted-host".into(),
            kernel: "6.1.0-test".into(),
        }
    }

    fn cpu_per_core(&mut self) -> Result<Vec<f64>> {
        Ok(vec![12.5, 55.0, 80.0, 100.0])
    }

    fn memory(&mut self) -> Result<MemoryInfo> {
        Ok(MemoryInfo {
            total: 8 * 1024 * 1024 * 1024,
            used: 2 * 1024 * 1024 * 1024,
            percent: 25.0,
        })
    }

    fn counters(&mut self) -> Result<CounterReading> {
        let call = self.counter_calls;
        self.counter_calls += 1;
        if self.fail_counters_after.is_some_and(|n| call >= n) {
            return Err(MonitorError::UnavailableMetricsSource("scripted source exhausted".into()));
        }

        let idx = call.min(self.counters.len().saturating_sub(1));
        let (bytes_sent, bytes_recv, disk_read, disk_write, secs) = self.counters[idx];
        Ok(CounterReading {
            bytes_sent,
            bytes_recv,
            disk_read,
            disk_write,
            taken_at: SystemTime::UNIX_EPOCH + Duration::from_secs_f64(secs),
        })
    }

    fn partitions(&mut self) -> Result<Vec<Result<PartitionUsage>>> {
        Ok(self
            .partitions
            .iter()
            .map(|(mount_point, usage)| match usage {
                Ok(percent) => Ok(PartitionUsage {
                    device: format!("/dev/scripted{}", mount_point.replace('/', "_")),
                    mount_point: mount_point.clone(),
                    fs_type: "ext4".into(),
                    total: 100 * 1024 * 1024 * 1024,
                    used: (*percent * 1024.0 * 1024.0 * 1024.0) as u64,
                    free: ((100.0 - *percent) * 1024.0 * 1024.0 * 1024.0) as u64,
                    percent: *percent,
                }),
                Err(()) => Err(MonitorError::PartitionAccessDenied {
                    mount_point: mount_point.clone(),
                }),
            })
            .collect())
    }

    fn battery(&mut self) -> Option<BatteryInfo> {
        self.battery
    }

    fn processes(&mut self) -> Result<Vec<Result<ProcessInfo>>> {
        Ok(self
            .processes
            .iter()
            .map(|entry| match entry {
                Ok(process) => Ok(process.clone()),
                Err(pid) => Err(MonitorError::ProcessVanished { pid: *pid }),
            })
            .collect())
    }
}
