use crate::error::{MonitorError, Result};
use std::fs;

const PROC_NET_DEV: &str = "/proc/net/dev";

/// Host-wide cumulative `(bytes_sent, bytes_recv)`, loopback excluded.
pub fn read_totals() -> Result<(u64, u64)> {
    let netdev = fs::read_to_string(PROC_NET_DEV)
        .map_err(|e| MonitorError::UnavailableMetricsSource(format!("{}: {}", PROC_NET_DEV, e)))?;
    Ok(parse_net_dev(&netdev))
}

pub fn parse_net_dev(netdev: &str) -> (u64, u64) {
    let mut sent = 0u64;
    let mut recv = 0u64;

    for line in netdev.lines().skip(2) {
        // "eth0: 123 ..." and "eth0:123 ..." both occur
        let Some((name, counters)) = line.split_once(':') else {
            continue;
        };
        if name.trim() == "lo" {
            continue;
        }
        let parts: Vec<&str> = counters.split_whitespace().collect();
        if parts.len() < 9 {
            continue;
        }
        recv = recv.wrapping_add(parts[0].parse().unwrap_or(0));
        sent = sent.wrapping_add(parts[8].parse().unwrap_or(0));
    }

    (sent, recv)
}
