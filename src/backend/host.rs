use crate::backend::battery::BatteryCollector;
use crate::backend::cpu::CpuCollector;
use crate::backend::disk::{self, PartitionCollector};
use crate::backend::memory::MemoryCollector;
use crate::backend::network;
use crate::backend::process::ProcessCollector;
use crate::backend::MetricsSource;
use crate::config::Config;
use crate::error::{MonitorError, Result};
use crate::model::{BatteryInfo, CounterReading, HostIdentity, MemoryInfo, PartitionUsage, ProcessInfo};
use std::path::Path;
use std::time::{Duration, SystemTime};
use sysinfo::System;

/// Linux metrics source backed by `/proc` and `/sys`.
pub struct ProcSource {
    identity: HostIdentity,
    cpu: CpuCollector,
    memory: MemoryCollector,
    partitions: PartitionCollector,
    battery: BatteryCollector,
    processes: ProcessCollector,
}

impl ProcSource {
    pub fn open(config: &Config) -> Result<Self> {
        if !Path::new("/proc/stat").exists() {
            return Err(MonitorError::UnavailableMetricsSource(
                "/proc is not mounted; only Linux hosts are supported".into(),
            ));
        }

        let identity = HostIdentity {
            os_name: System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
            hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            kernel: System::kernel_version().unwrap_or_else(|| "unknown".to_string()),
        };

        let mut source = Self {
            identity,
            cpu: CpuCollector::new(),
            memory: MemoryCollector::new(),
            partitions: PartitionCollector::new(
                config.partition_timeout_ms.map(Duration::from_millis),
                config.include_pseudo_filesystems,
            ),
            battery: BatteryCollector::new(),
            processes: ProcessCollector::new(),
        };

        // Initial collection to prime deltas
        source.cpu.collect()?;
        source.processes.collect()?;

        log::info!(
            "Metrics source ready on {} ({} {})",
            source.identity.hostname,
            source.identity.os_name,
            source.identity.kernel
        );
        Ok(source)
    }
}

impl MetricsSource for ProcSource {
    fn host_identity(&self) -> HostIdentity {
        self.identity.clone()
    }

    fn cpu_per_core(&mut self) -> Result<Vec<f64>> {
        self.cpu.collect()
    }

    fn memory(&mut self) -> Result<MemoryInfo> {
        self.memory.collect()
    }

    fn counters(&mut self) -> Result<CounterReading> {
        let (bytes_sent, bytes_recv) = network::read_totals()?;
        let (disk_read, disk_write) = disk::read_io_totals()?;
        Ok(CounterReading {
            bytes_sent,
            bytes_recv,
            disk_read,
            disk_write,
            taken_at: SystemTime::now(),
        })
    }

    fn partitions(&mut self) -> Result<Vec<Result<PartitionUsage>>> {
        self.partitions.collect()
    }

    fn battery(&mut self) -> Option<BatteryInfo> {
        self.battery.collect()
    }

    fn processes(&mut self) -> Result<Vec<Result<ProcessInfo>>> {
        self.processes.collect()
    }
}
