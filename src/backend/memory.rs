use crate::error::{MonitorError, Result};
use crate::model::MemoryInfo;
use std::fs;

const PROC_MEMINFO: &str = "/proc/meminfo";

pub struct MemoryCollector;

impl MemoryCollector {
    pub fn new() -> Self {
        Self
    }

    pub fn collect(&self) -> Result<MemoryInfo> {
        let meminfo = fs::read_to_string(PROC_MEMINFO)
            .map_err(|e| MonitorError::UnavailableMetricsSource(format!("{}: {}", PROC_MEMINFO, e)))?;
        Ok(parse_meminfo(&meminfo))
    }
}

pub fn parse_meminfo(meminfo: &str) -> MemoryInfo {
    let mut total = 0u64;
    let mut available = None;
    let mut free = 0u64;

    for line in meminfo.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }
        let val: u64 = parts[1].parse::<u64>().unwrap_or(0) * 1024; // kB to bytes
        match parts[0] {
            "MemTotal:" => total = val,
            "MemAvailable:" => available = Some(val),
            "MemFree:" => free = val,
            _ => {}
        }
    }

    // Kernels before 3.14 have no MemAvailable
    let used = total.saturating_sub(available.unwrap_or(free));
    let percent = if total > 0 {
        used as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    MemoryInfo { total, used, percent }
}
