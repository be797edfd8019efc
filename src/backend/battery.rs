use crate::model::BatteryInfo;
use std::fs;
use std::path::{Path, PathBuf};

const POWER_SUPPLY_DIR: &str = "/sys/class/power_supply";

pub struct BatteryCollector {
    battery_path: Option<PathBuf>,
    ac_path: Option<PathBuf>,
}

impl BatteryCollector {
    pub fn new() -> Self {
        Self::with_root(Path::new(POWER_SUPPLY_DIR))
    }

    pub fn with_root(root: &Path) -> Self {
        let battery_path = find_power_supply(root, |t| t == "Battery");
        let ac_path = find_power_supply(root, |t| t == "Mains" || t == "USB");

        if battery_path.is_some() {
            log::info!("Battery found: {:?}", battery_path);
        } else {
            log::info!("No battery found (desktop PC?)");
        }

        Self { battery_path, ac_path }
    }

    pub fn collect(&self) -> Option<BatteryInfo> {
        let bat_path = self.battery_path.as_ref()?;

        // Try capacity first (direct percentage), else calculate from energy or charge
        let percent = read_sysfs_u64(&bat_path.join("capacity"))
            .map(|c| c as f64)
            .or_else(|| {
                let now = read_sysfs_u64(&bat_path.join("energy_now"))
                    .or_else(|| read_sysfs_u64(&bat_path.join("charge_now")))?;
                let full = read_sysfs_u64(&bat_path.join("energy_full"))
                    .or_else(|| read_sysfs_u64(&bat_path.join("charge_full")))?;
                (full > 0).then(|| now as f64 / full as f64 * 100.0)
            });

        // The sensor can disappear (hot-unplugged battery); that reads as absent
        let Some(percent) = percent else {
            log::debug!("Battery at {} stopped reporting", bat_path.display());
            return None;
        };

        let status = read_sysfs_string(&bat_path.join("status")).unwrap_or_else(|| "Unknown".to_string());

        let plugged = match &self.ac_path {
            Some(ac_path) => read_sysfs_u64(&ac_path.join("online"))
                .map(|v| v == 1)
                .unwrap_or(false),
            // Infer from battery status
            None => status == "Charging" || status == "Full",
        };

        Some(BatteryInfo {
            percent: percent.clamp(0.0, 100.0),
            plugged,
        })
    }
}

fn find_power_supply(root: &Path, matches: impl Fn(&str) -> bool) -> Option<PathBuf> {
    let entries = fs::read_dir(root).ok()?;

    let mut candidates: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            fs::read_to_string(path.join("type"))
                .map(|t| matches(t.trim()))
                .unwrap_or(false)
        })
        .collect();
    // read_dir order is unspecified; BAT0 should win over BAT1
    candidates.sort();
    candidates.into_iter().next()
}

fn read_sysfs_u64(path: &Path) -> Option<u64> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

fn read_sysfs_string(path: &Path) -> Option<String> {
    Some(fs::read_to_string(path).ok()?.trim().to_string())
}
