//! Turns cumulative OS counters into per-tick snapshots with per-second rates.

use crate::backend::MetricsSource;
use crate::error::Result;
use crate::model::{
    CounterReading, DiskIoRates, HostIdentity, MetricsSnapshot, NetworkRates, ProcessInfo,
};
use chrono::{DateTime, Local};
use std::time::SystemTime;

/// Interval substituted when the clock did not advance (or went backwards).
pub const FLOOR_INTERVAL_SECS: f64 = 1.0;

pub const DEFAULT_TOP_PROCESSES: usize = 10;

/// Previous counter reading; rates for the next tick are derived against it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerState {
    pub last_sample_time: SystemTime,
    pub last_bytes_sent: u64,
    pub last_bytes_recv: u64,
    pub last_disk_read: u64,
    pub last_disk_write: u64,
}

impl From<CounterReading> for SamplerState {
    fn from(reading: CounterReading) -> Self {
        Self {
            last_sample_time: reading.taken_at,
            last_bytes_sent: reading.bytes_sent,
            last_bytes_recv: reading.bytes_recv,
            last_disk_read: reading.disk_read,
            last_disk_write: reading.disk_write,
        }
    }
}

pub struct Sampler<S: MetricsSource> {
    source: S,
    state: SamplerState,
    identity: HostIdentity,
    top_processes: usize,
}

impl<S: MetricsSource> Sampler<S> {
    /// Reads host identity and seeds the counters. The seeding read is never reported.
    pub fn initialize(mut source: S, top_processes: usize) -> Result<Self> {
        let identity = source.host_identity();
        let state = SamplerState::from(source.counters()?);

        Ok(Self {
            source,
            state,
            identity,
            top_processes,
        })
    }

    pub fn identity(&self) -> &HostIdentity {
        &self.identity
    }

    #[cfg(test)]
    pub fn state(&self) -> &SamplerState {
        &self.state
    }

    /// Produces one snapshot. Only a fatal source error is returned; the state is
    /// left untouched in that case.
    pub fn sample(&mut self) -> Result<MetricsSnapshot> {
        let cpu_per_core = self.source.cpu_per_core()?;
        let memory = self.source.memory()?;
        let now = self.source.counters()?;

        let dt = elapsed_secs(self.state.last_sample_time, now.taken_at);
        let network = NetworkRates {
            tx_bytes_sec: counter_rate(self.state.last_bytes_sent, now.bytes_sent, dt),
            rx_bytes_sec: counter_rate(self.state.last_bytes_recv, now.bytes_recv, dt),
        };
        let disk_io = DiskIoRates {
            read_bytes_sec: counter_rate(self.state.last_disk_read, now.disk_read, dt),
            write_bytes_sec: counter_rate(self.state.last_disk_write, now.disk_write, dt),
        };

        let partitions = keep_readable(self.source.partitions()?);
        let battery = self.source.battery();
        let processes = rank_processes(keep_readable(self.source.processes()?), self.top_processes);

        self.state = SamplerState::from(now);

        Ok(MetricsSnapshot {
            taken_at: DateTime::<Local>::from(now.taken_at),
            cpu_per_core,
            memory,
            network,
            disk_io,
            partitions,
            battery,
            processes,
        })
    }
}

/// Seconds between two readings, floored to [`FLOOR_INTERVAL_SECS`] when the
/// clock stood still or stepped backwards.
pub fn elapsed_secs(previous: SystemTime, now: SystemTime) -> f64 {
    match now.duration_since(previous) {
        Ok(elapsed) if elapsed.as_secs_f64() > 0.0 => elapsed.as_secs_f64(),
        _ => {
            log::debug!("Non-positive sampling interval, assuming {}s", FLOOR_INTERVAL_SECS);
            FLOOR_INTERVAL_SECS
        }
    }
}

/// Per-second rate of a cumulative counter. A counter that went backwards
/// (reset or wraparound) yields 0.
pub fn counter_rate(previous: u64, current: u64, dt_secs: f64) -> f64 {
    let dt = if dt_secs > 0.0 { dt_secs } else { FLOOR_INTERVAL_SECS };
    match current.checked_sub(previous) {
        Some(delta) => delta as f64 / dt,
        None => {
            log::debug!("Counter regressed from {} to {}, clamping rate to 0", previous, current);
            0.0
        }
    }
}

/// Highest CPU first; ties keep enumeration order. Missing percentages rank as 0.
pub fn rank_processes(mut processes: Vec<ProcessInfo>, limit: usize) -> Vec<ProcessInfo> {
    // sort_by is stable
    processes.sort_by(|a, b| b.cpu_or_zero().total_cmp(&a.cpu_or_zero()));
    processes.truncate(limit);
    processes
}

fn keep_readable<T>(items: Vec<Result<T>>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Ok(value) => Some(value),
            Err(err) if err.is_fatal() => {
                // Should never be nested per item; still not worth aborting the tick
                log::warn!("Dropping item: {}", err);
                None
            }
            Err(err) => {
                log::debug!("Skipping item this tick: {}", err);
                None
            }
        })
        .collect()
}
