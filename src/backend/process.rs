use crate::backend::cpu;
use crate::error::{MonitorError, Result};
use crate::model::{state_label, ProcessInfo};
use std::collections::{HashMap, HashSet};
use std::fs;

pub struct ProcessCollector {
    prev_cpu_time: HashMap<i32, u64>,
    prev_total_cpu: u64,
}

/// Fields pulled out of `/proc/<pid>/stat`.
#[derive(Debug, PartialEq)]
struct StatFields {
    name: String,
    state: char,
    cpu_time: u64,
}

impl ProcessCollector {
    pub fn new() -> Self {
        Self {
            prev_cpu_time: HashMap::new(),
            prev_total_cpu: 0,
        }
    }

    pub fn collect(&mut self) -> Result<Vec<Result<ProcessInfo>>> {
        let stat = fs::read_to_string("/proc/stat")
            .map_err(|e| MonitorError::UnavailableMetricsSource(format!("/proc/stat: {}", e)))?;
        let num_cores = stat
            .lines()
            .filter(|l| l.starts_with("cpu") && !l.starts_with("cpu "))
            .count()
            .max(1);
        let total_cpu = cpu::total_ticks(&stat);

        let proc_entries = fs::read_dir("/proc")
            .map_err(|e| MonitorError::UnavailableMetricsSource(format!("/proc: {}", e)))?;

        let pids: Vec<i32> = proc_entries
            .flatten()
            .filter_map(|entry| entry.file_name().to_string_lossy().parse().ok())
            .collect();

        let results = pids
            .into_iter()
            .map(|pid| {
                let content = fs::read_to_string(format!("/proc/{}/stat", pid))
                    .map_err(|_| MonitorError::ProcessVanished { pid })?;
                parse_stat(&content).ok_or(MonitorError::ProcessVanished { pid }).map(|fields| (pid, fields))
            })
            .collect();

        Ok(self.account(results, total_cpu, num_cores))
    }

    /// Turns raw per-pid tick counters into percentages and rolls the baseline forward.
    fn account(
        &mut self,
        raw: Vec<Result<(i32, StatFields)>>,
        total_cpu: u64,
        num_cores: usize,
    ) -> Vec<Result<ProcessInfo>> {
        let first_pass = self.prev_total_cpu == 0;
        let delta_total = total_cpu.saturating_sub(self.prev_total_cpu);
        let mut current = HashMap::new();

        let processes = raw
            .into_iter()
            .map(|entry| {
                let (pid, fields) = entry?;
                let prev_cpu = self.prev_cpu_time.get(&pid).copied();
                current.insert(pid, fields.cpu_time);

                // A pid seen for the first time has no baseline yet
                let cpu_percent = match prev_cpu {
                    Some(prev) if !first_pass && delta_total > 0 => {
                        let cpu_delta = fields.cpu_time.saturating_sub(prev);
                        Some((cpu_delta as f64 / delta_total as f64) * 100.0 * num_cores as f64)
                    }
                    _ => None,
                };

                Ok(ProcessInfo {
                    pid,
                    name: fields.name,
                    state: state_label(fields.state).to_string(),
                    cpu_percent,
                })
            })
            .collect();

        self.prev_total_cpu = total_cpu;

        // Prune dead processes
        let live: HashSet<i32> = current.keys().copied().collect();
        self.prev_cpu_time.retain(|pid, _| live.contains(pid));
        self.prev_cpu_time.extend(current);

        processes
    }
}

/// Parses the comm field, which may contain spaces and parens, then state and utime+stime.
fn parse_stat(stat: &str) -> Option<StatFields> {
    let comm_start = stat.find('(')?;
    let comm_end = stat.rfind(')')?;
    let name = stat.get(comm_start + 1..comm_end)?.to_string();

    let rest = stat.get(comm_end + 2..)?;
    let fields: Vec<&str> = rest.split_whitespace().collect();
    if fields.len() < 13 {
        return None;
    }

    let state = fields[0].chars().next()?;
    let utime: u64 = fields[11].parse().unwrap_or(0);
    let stime: u64 = fields[12].parse().unwrap_or(0);

    Some(StatFields {
        name,
        state,
        cpu_time: utime + stime,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat_line(pid: i32, comm: &str, state: char, utime: u64, stime: u64) -> String {
        format!(
            "{} ({}) {} 1 1 1 0 -1 4194560 100 0 0 0 {} {} 0 0 20 0 1 0 100 0 0",
            pid, comm, state, utime, stime
        )
    }

    fn fields(name: &str, cpu_time: u64) -> StatFields {
        StatFields {
            name: name.into(),
            state: 'S',
            cpu_time,
        }
    }

    #[test]
    fn parses_comm_with_spaces_and_parens() {
        let parsed = parse_stat(&stat_line(7, "Web (Content)", 'R', 30, 12)).unwrap();
        assert_eq!(parsed.name, "Web (Content)");
        assert_eq!(parsed.state, 'R');
        assert_eq!(parsed.cpu_time, 42);
    }

    #[test]
    fn truncated_stat_is_rejected() {
        assert_eq!(parse_stat("12 (bash) S 1 1"), None);
        assert_eq!(parse_stat("garbage"), None);
    }

    #[test]
    fn first_pass_has_no_percent() {
        let mut collector = ProcessCollector::new();
        let out = collector.account(vec![Ok((1, fields("init", 500)))], 10_000, 4);
        assert_eq!(out[0].as_ref().unwrap().cpu_percent, None);
    }

    #[test]
    fn newcomer_after_priming_has_no_percent() {
        let mut collector = ProcessCollector::new();
        collector.account(vec![Ok((1, fields("init", 500)))], 1_000, 4);

        let out = collector.account(
            vec![Ok((1, fields("init", 500))), Ok((99, fields("newcomer", 5_000)))],
            1_400,
            4,
        );
        let newcomer = out[1].as_ref().unwrap();
        assert_eq!(newcomer.cpu_percent, None);
        assert_eq!(newcomer.cpu_or_zero(), 0.0);

        // Measured normally from its second sighting on
        let out = collector.account(vec![Ok((99, fields("newcomer", 5_100)))], 1_800, 4);
        assert!((out[0].as_ref().unwrap().cpu_percent.unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn percent_is_relative_to_one_core() {
        let mut collector = ProcessCollector::new();
        collector.account(vec![Ok((1, fields("busy", 100)))], 1_000, 4);

        // 400 total ticks across 4 cores is one core-interval of 100 ticks
        let out = collector.account(vec![Ok((1, fields("busy", 200)))], 1_400, 4);
        let busy = out[0].as_ref().unwrap();
        assert!((busy.cpu_percent.unwrap() - 100.0).abs() < 1e-9);
        assert_eq!(busy.state, "sleeping");
    }

    #[test]
    fn vanished_entries_pass_through_and_are_forgotten() {
        let mut collector = ProcessCollector::new();
        collector.account(vec![Ok((1, fields("a", 10))), Ok((2, fields("b", 10)))], 100, 1);

        let out = collector.account(
            vec![Ok((1, fields("a", 20))), Err(MonitorError::ProcessVanished { pid: 2 })],
            200,
            1,
        );
        assert!(out[0].is_ok());
        assert!(matches!(out[1], Err(MonitorError::ProcessVanished { pid: 2 })));
        assert!(!collector.prev_cpu_time.contains_key(&2));
    }
}
