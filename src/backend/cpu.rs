use crate::error::{MonitorError, Result};
use std::fs;

const PROC_STAT: &str = "/proc/stat";

/// Per-core utilization from `/proc/stat` tick deltas. Each call measures the
/// window since the previous call, so it never sleeps.
pub struct CpuCollector {
    prev_total: Vec<u64>,
    prev_idle: Vec<u64>,
}

impl CpuCollector {
    pub fn new() -> Self {
        Self {
            prev_total: Vec::new(),
            prev_idle: Vec::new(),
        }
    }

    pub fn collect(&mut self) -> Result<Vec<f64>> {
        let stat = fs::read_to_string(PROC_STAT)
            .map_err(|e| MonitorError::UnavailableMetricsSource(format!("{}: {}", PROC_STAT, e)))?;
        Ok(self.collect_from(&stat))
    }

    pub fn collect_from(&mut self, stat: &str) -> Vec<f64> {
        let mut per_core = Vec::new();

        for line in stat.lines() {
            // Only cpu0, cpu1... ; the aggregate "cpu " line is skipped
            let Some(rest) = line.strip_prefix("cpu") else {
                continue;
            };
            if !rest.starts_with(|c: char| c.is_ascii_digit()) {
                continue;
            }
            let parts: Vec<&str> = rest.split_whitespace().collect();
            let idx = match parts.first().and_then(|n| n.parse::<usize>().ok()) {
                Some(idx) => idx,
                None => continue,
            };
            let Some((total, idle)) = parse_ticks(&parts[1..]) else {
                continue;
            };

            if idx >= self.prev_total.len() {
                self.prev_total.resize(idx + 1, 0);
                self.prev_idle.resize(idx + 1, 0);
            }
            if idx >= per_core.len() {
                per_core.resize(idx + 1, 0.0);
            }

            let dtotal = total.saturating_sub(self.prev_total[idx]);
            let didle = idle.saturating_sub(self.prev_idle[idx]);

            per_core[idx] = if dtotal > 0 {
                (dtotal.saturating_sub(didle) as f64 / dtotal as f64) * 100.0
            } else {
                0.0
            };

            self.prev_total[idx] = total;
            self.prev_idle[idx] = idle;
        }

        per_core
    }
}

/// Returns `(total, idle)` ticks for one cpu line's numeric fields.
fn parse_ticks(fields: &[&str]) -> Option<(u64, u64)> {
    if fields.len() < 7 {
        return None;
    }
    let value = |i: usize| -> u64 { fields.get(i).and_then(|s| s.parse().ok()).unwrap_or(0) };

    let user = value(0);
    let nice = value(1);
    let system = value(2);
    let idle = value(3);
    let iowait = value(4);
    let irq = value(5);
    let softirq = value(6);
    let steal = value(7);

    let total = user + nice + system + idle + iowait + irq + softirq + steal;
    Some((total, idle + iowait))
}

/// Sum of every field on the aggregate `cpu ` line.
pub fn total_ticks(stat: &str) -> u64 {
    stat.lines()
        .find(|l| l.starts_with("cpu "))
        .map(|line| {
            line.split_whitespace()
                .skip(1)
                .filter_map(|s| s.parse::<u64>().ok())
                .sum()
        })
        .unwrap_or(0)
}
