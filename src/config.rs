use crate::backend::DEFAULT_TOP_PROCESSES;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub refresh_interval_ms: u64,
    pub startup_delay_ms: u64,
    pub partition_timeout_ms: Option<u64>,
    pub cpu_gauge_width: usize,
    pub memory_gauge_width: usize,
    pub partition_gauge_width: usize,
    pub battery_gauge_width: usize,
    pub top_processes: usize,
    pub include_pseudo_filesystems: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 1000,
            startup_delay_ms: 2000,
            partition_timeout_ms: Some(2000),
            cpu_gauge_width: 30,
            memory_gauge_width: 50,
            partition_gauge_width: 30,
            battery_gauge_width: 50,
            top_processes: DEFAULT_TOP_PROCESSES,
            include_pseudo_filesystems: false,
        }
    }
}

impl Config {
    /// Loads the user config, falling back to defaults. Never writes anything.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed config {}: {}", path.display(), e);
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("hostwatch")
        .join("config.json")
}
