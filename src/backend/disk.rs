use crate::error::{MonitorError, Result};
use crate::model::PartitionUsage;
use nix::errno::Errno;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const PROC_DISKSTATS: &str = "/proc/diskstats";
const PROC_MOUNTS: &str = "/proc/self/mounts";
const SECTOR_SIZE: u64 = 512;

const PSEUDO_FILESYSTEMS: &[&str] = &[
    "autofs", "binfmt_misc", "bpf", "cgroup", "cgroup2", "configfs", "debugfs", "devpts",
    "devtmpfs", "efivarfs", "fusectl", "hugetlbfs", "mqueue", "nsfs", "overlay", "proc",
    "pstore", "ramfs", "rpc_pipefs", "securityfs", "squashfs", "sysfs", "tmpfs", "tracefs",
];

/// Host-wide cumulative `(read_bytes, write_bytes)` over whole disks.
pub fn read_io_totals() -> Result<(u64, u64)> {
    let diskstats = fs::read_to_string(PROC_DISKSTATS)
        .map_err(|e| MonitorError::UnavailableMetricsSource(format!("{}: {}", PROC_DISKSTATS, e)))?;
    Ok(parse_diskstats(&diskstats))
}

pub fn parse_diskstats(diskstats: &str) -> (u64, u64) {
    let mut read = 0u64;
    let mut write = 0u64;

    for line in diskstats.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 14 || !is_whole_disk(parts[2]) {
            continue;
        }
        let read_sectors: u64 = parts[5].parse().unwrap_or(0);
        let write_sectors: u64 = parts[9].parse().unwrap_or(0);
        read = read.wrapping_add(read_sectors.wrapping_mul(SECTOR_SIZE));
        write = write.wrapping_add(write_sectors.wrapping_mul(SECTOR_SIZE));
    }

    (read, write)
}

/// Whole block devices only; partitions would double count their parent.
fn is_whole_disk(name: &str) -> bool {
    let ends_in_digit = name.ends_with(|c: char| c.is_ascii_digit());
    if name.starts_with("nvme") || name.starts_with("mmcblk") {
        return !name.contains('p');
    }
    ["sd", "vd", "xvd", "hd"]
        .iter()
        .any(|prefix| name.starts_with(prefix) && !ends_in_digit)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mount {
    pub device: String,
    pub mount_point: String,
    pub fs_type: String,
}

/// Filesystem usage lookup for one mount; `statvfs` outside tests.
pub type UsageQuery = Arc<dyn Fn(Mount) -> Result<PartitionUsage> + Send + Sync>;

pub struct PartitionCollector {
    timeout: Option<Duration>,
    include_pseudo: bool,
    query: UsageQuery,
    // Queries that outlived their timeout, keyed by mount point
    pending: HashMap<String, flume::Receiver<Result<PartitionUsage>>>,
}

impl PartitionCollector {
    pub fn new(timeout: Option<Duration>, include_pseudo: bool) -> Self {
        Self::with_query(timeout, include_pseudo, Arc::new(query_usage))
    }

    pub fn with_query(timeout: Option<Duration>, include_pseudo: bool, query: UsageQuery) -> Self {
        Self {
            timeout,
            include_pseudo,
            query,
            pending: HashMap::new(),
        }
    }

    pub fn collect(&mut self) -> Result<Vec<Result<PartitionUsage>>> {
        let mounts = fs::read_to_string(PROC_MOUNTS)
            .map_err(|e| MonitorError::UnavailableMetricsSource(format!("{}: {}", PROC_MOUNTS, e)))?;

        Ok(self.collect_mounts(parse_mounts(&mounts, self.include_pseudo)))
    }

    fn collect_mounts(&mut self, mounts: Vec<Mount>) -> Vec<Result<PartitionUsage>> {
        mounts.into_iter().map(|mount| self.usage(mount)).collect()
    }

    fn usage(&mut self, mount: Mount) -> Result<PartitionUsage> {
        let Some(timeout) = self.timeout else {
            return (self.query)(mount);
        };
        let timeout_ms = timeout.as_millis() as u64;

        // At most one outstanding query per mount; a dead mount must not pile up threads
        let outstanding = self.pending.get(&mount.mount_point).map(|rx| rx.try_recv());
        match outstanding {
            Some(Err(flume::TryRecvError::Empty)) => {
                log::debug!("Usage query for {} still outstanding", mount.mount_point);
                return Err(MonitorError::PartitionTimeout {
                    mount_point: mount.mount_point,
                    timeout_ms,
                });
            }
            // Late answer is stale; fall through to a fresh query
            Some(_) => {
                self.pending.remove(&mount.mount_point);
            }
            None => {}
        }

        let (tx, rx) = flume::bounded(1);
        let mount_point = mount.mount_point.clone();
        let query = Arc::clone(&self.query);
        thread::Builder::new()
            .name("statvfs".into())
            .spawn(move || {
                let _ = tx.send(query(mount));
            })?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(flume::RecvTimeoutError::Timeout) => {
                log::warn!("Usage query for {} timed out", mount_point);
                self.pending.insert(mount_point.clone(), rx);
                Err(MonitorError::PartitionTimeout { mount_point, timeout_ms })
            }
            Err(flume::RecvTimeoutError::Disconnected) => Err(MonitorError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("usage query for {} panicked", mount_point),
            ))),
        }
    }
}

pub fn parse_mounts(mounts: &str, include_pseudo: bool) -> Vec<Mount> {
    let mut seen_devices = HashSet::new();
    let mut result = Vec::new();

    for line in mounts.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            continue;
        }
        let mount = Mount {
            device: unescape_octal(parts[0]),
            mount_point: unescape_octal(parts[1]),
            fs_type: parts[2].to_string(),
        };

        if !include_pseudo {
            if PSEUDO_FILESYSTEMS.contains(&mount.fs_type.as_str()) || !mount.device.starts_with('/') {
                continue;
            }
            // Bind mounts and btrfs subvolumes repeat the device
            if !seen_devices.insert(mount.device.clone()) {
                continue;
            }
        }

        result.push(mount);
    }

    result
}

/// `/proc/mounts` encodes space, tab, newline and backslash as `\ooo`.
fn unescape_octal(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 4 <= bytes.len() {
            let digits = std::str::from_utf8(&bytes[i + 1..i + 4]).unwrap_or("");
            if let Ok(value) = u8::from_str_radix(digits, 8) {
                out.push(value);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn query_usage(mount: Mount) -> Result<PartitionUsage> {
    let path = PathBuf::from(&mount.mount_point);
    let stat = nix::sys::statvfs::statvfs(&path).map_err(|errno| match errno {
        Errno::EACCES | Errno::EPERM => MonitorError::PartitionAccessDenied {
            mount_point: mount.mount_point.clone(),
        },
        other => MonitorError::Io(std::io::Error::from(other)),
    })?;

    let fragment = stat.fragment_size() as u64;
    let total = stat.blocks() as u64 * fragment;
    let free = stat.blocks_available() as u64 * fragment;
    let used = (stat.blocks() as u64).saturating_sub(stat.blocks_free() as u64) * fragment;

    Ok(usage_from(mount, total, used, free))
}

/// Percent is over the space visible to unprivileged users, as `df` reports it.
pub fn usage_from(mount: Mount, total: u64, used: u64, free: u64) -> PartitionUsage {
    let visible = used + free;
    let percent = if visible > 0 {
        used as f64 / visible as f64 * 100.0
    } else {
        0.0
    };

    PartitionUsage {
        device: mount.device,
        mount_point: mount.mount_point,
        fs_type: mount.fs_type,
        total,
        used,
        free,
        percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_whole_disks_only() {
        let stats = "\
   8       0 sda 100 0 10 0 50 0 20 0 0 0 0 0 0 0 0
   8       1 sda1 100 0 10 0 50 0 20 0 0 0 0 0 0 0 0
 259       0 nvme0n1 1 0 4 0 1 0 8 0 0 0 0 0 0 0 0
 259       1 nvme0n1p1 1 0 4 0 1 0 8 0 0 0 0 0 0 0 0
   7       0 loop0 1 0 1000 0 1 0 1000 0 0 0 0 0 0 0 0
";
        let (read, write) = parse_diskstats(stats);
        assert_eq!(read, (10 + 4) * 512);
        assert_eq!(write, (20 + 8) * 512);
    }

    #[test]
    fn whole_disk_names() {
        assert!(is_whole_disk("sda"));
        assert!(is_whole_disk("vdb"));
        assert!(is_whole_disk("mmcblk0"));
        assert!(!is_whole_disk("mmcblk0p2"));
        assert!(!is_whole_disk("sdb3"));
        assert!(!is_whole_disk("dm-0"));
    }

    #[test]
    fn mounts_skip_pseudo_and_repeated_devices() {
        let mounts = "\
proc /proc proc rw 0 0
/dev/sda1 / ext4 rw 0 0
tmpfs /run tmpfs rw 0 0
/dev/sda2 /home\\040dir ext4 rw 0 0
/dev/sda1 /srv/bind ext4 rw 0 0
";
        let parsed = parse_mounts(mounts, false);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].mount_point, "/");
        assert_eq!(parsed[1].mount_point, "/home dir");

        assert_eq!(parse_mounts(mounts, true).len(), 5);
    }

    #[test]
    fn usage_percent_matches_df() {
        let mount = Mount {
            device: "/dev/sda1".into(),
            mount_point: "/".into(),
            fs_type: "ext4".into(),
        };
        let usage = usage_from(mount, 1000, 600, 200);
        assert!((usage.percent - 75.0).abs() < 1e-9);
        assert_eq!(usage.free, 200);
    }

    #[test]
    fn root_partition_is_queryable() {
        let mount = Mount {
            device: "rootfs".into(),
            mount_point: "/".into(),
            fs_type: "rootfs".into(),
        };
        let mut collector = PartitionCollector::new(Some(Duration::from_secs(5)), true);
        let usage = collector.usage(mount).unwrap();
        assert!(usage.total >= usage.free);
        assert!(usage.percent >= 0.0 && usage.percent <= 100.0);
    }

    fn mount(point: &str) -> Mount {
        Mount {
            device: format!("server:{}", point),
            mount_point: point.into(),
            fs_type: "nfs".into(),
        }
    }

    #[test]
    fn hung_mount_is_dropped_without_piling_up_queries() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let (release, gate) = flume::unbounded::<()>();
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let query: UsageQuery = Arc::new(move |m: Mount| {
            counted.fetch_add(1, Ordering::SeqCst);
            let _ = gate.recv();
            Ok(usage_from(m, 100, 40, 60))
        });
        let mut collector = PartitionCollector::with_query(Some(Duration::from_millis(200)), false, query);

        let first = collector.collect_mounts(vec![mount("/mnt/dead")]);
        assert!(matches!(first[0], Err(MonitorError::PartitionTimeout { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let second = collector.collect_mounts(vec![mount("/mnt/dead")]);
        assert!(matches!(second[0], Err(MonitorError::PartitionTimeout { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Mount comes back: the stuck query finishes, then a fresh one is allowed
        release.send(()).unwrap();
        release.send(()).unwrap();
        let mut recovered = None;
        for _ in 0..100 {
            let out = collector.collect_mounts(vec![mount("/mnt/dead")]);
            if let Some(Ok(usage)) = out.into_iter().next() {
                recovered = Some(usage);
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(recovered.map(|u| u.used), Some(40));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn other_mounts_still_report_while_one_hangs() {
        let query: UsageQuery = Arc::new(|m: Mount| {
            if m.mount_point == "/mnt/dead" {
                thread::sleep(Duration::from_secs(2));
            }
            Ok(usage_from(m, 100, 10, 90))
        });
        let mut collector = PartitionCollector::with_query(Some(Duration::from_millis(20)), false, query);

        let out = collector.collect_mounts(vec![mount("/"), mount("/mnt/dead"), mount("/home")]);
        let ok: Vec<String> = out.into_iter().filter_map(|r| r.ok()).map(|u| u.mount_point).collect();
        assert_eq!(ok, ["/", "/home"]);
    }
}
