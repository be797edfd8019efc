use crate::config::Config;
use crate::model::{BatteryInfo, MetricsSnapshot, PartitionUsage, ProcessInfo};
use crate::ui::format::{format_bytes, gauge, truncate_chars, UsageTier, BLUE, BOLD, GREEN, RESET, YELLOW};

const RULE_WIDTH: usize = 80;
const PROCESS_NAME_WIDTH: usize = 20;

/// Gauge widths, footer text and table heading; everything else comes from the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub cpu_gauge_width: usize,
    pub memory_gauge_width: usize,
    pub partition_gauge_width: usize,
    pub battery_gauge_width: usize,
    pub refresh_interval_ms: u64,
    pub top_processes: usize,
}

impl From<&Config> for Layout {
    fn from(config: &Config) -> Self {
        Self {
            cpu_gauge_width: config.cpu_gauge_width,
            memory_gauge_width: config.memory_gauge_width,
            partition_gauge_width: config.partition_gauge_width,
            battery_gauge_width: config.battery_gauge_width,
            refresh_interval_ms: config.refresh_interval_ms,
            top_processes: config.top_processes,
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Formats one snapshot. Pure: the same snapshot always yields the same text.
pub fn render(snapshot: &MetricsSnapshot, layout: &Layout) -> String {
    let mut lines = Vec::new();
    let rule = "=".repeat(RULE_WIDTH);

    lines.push(format!("{BOLD}{GREEN}{rule}{RESET}"));
    lines.push(format!(
        "{BOLD}{BLUE}  SYSTEM MONITOR  - {}{RESET}",
        snapshot.taken_at.format("%Y-%m-%d %H:%M:%S")
    ));
    lines.push(format!("{GREEN}{rule}{RESET}"));

    cpu_section(&mut lines, &snapshot.cpu_per_core, layout);
    memory_section(&mut lines, snapshot, layout);

    section_title(&mut lines, "DISK I/O");
    lines.push(format!("  {YELLOW}Read: {RESET} {}/s", format_bytes(snapshot.disk_io.read_bytes_sec)));
    lines.push(format!("  {YELLOW}Write:{RESET} {}/s", format_bytes(snapshot.disk_io.write_bytes_sec)));

    partition_section(&mut lines, &snapshot.partitions, layout);

    section_title(&mut lines, "NETWORK");
    lines.push(format!("  {YELLOW}↑ TX:{RESET} {}/s", format_bytes(snapshot.network.tx_bytes_sec)));
    lines.push(format!("  {YELLOW}↓ RX:{RESET} {}/s", format_bytes(snapshot.network.rx_bytes_sec)));

    if let Some(battery) = &snapshot.battery {
        battery_section(&mut lines, battery, layout);
    }

    process_section(&mut lines, &snapshot.processes, layout);

    lines.push(String::new());
    lines.push(format!("{GREEN}{rule}{RESET}"));
    lines.push(format!(
        "Refresh every {}ms | Press Ctrl+C to exit",
        layout.refresh_interval_ms
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn section_title(lines: &mut Vec<String>, title: &str) {
    lines.push(String::new());
    lines.push(format!("{BOLD}{BLUE}[{title}]{RESET}"));
}

fn cpu_section(lines: &mut Vec<String>, cores: &[f64], layout: &Layout) {
    section_title(lines, &format!("CPU USAGE - {} cores", cores.len()));
    for (idx, usage) in cores.iter().enumerate() {
        let color = UsageTier::classify(*usage).color();
        let bar = gauge(*usage, layout.cpu_gauge_width);
        lines.push(format!("  Core {idx:2}: {color}{bar}{RESET} {usage:5.1}%"));
    }
}

fn memory_section(lines: &mut Vec<String>, snapshot: &MetricsSnapshot, layout: &Layout) {
    let memory = &snapshot.memory;
    section_title(lines, "MEMORY");
    lines.push(format!(
        "  Used: {} / {} ({:.1}%)",
        format_bytes(memory.used as f64),
        format_bytes(memory.total as f64),
        memory.percent
    ));
    let color = UsageTier::classify(memory.percent).color();
    lines.push(format!("  {color}{}{RESET}", gauge(memory.percent, layout.memory_gauge_width)));
}

fn partition_section(lines: &mut Vec<String>, partitions: &[PartitionUsage], layout: &Layout) {
    section_title(lines, "DISK PARTITIONS");
    for part in partitions {
        let color = UsageTier::classify(part.percent).color();
        lines.push(format!("  {YELLOW}{}{RESET} ({})", part.mount_point, part.device));
        lines.push(format!(
            "    {} / {} ({:.1}%)",
            format_bytes(part.used as f64),
            format_bytes(part.total as f64),
            part.percent
        ));
        lines.push(format!("    {color}{}{RESET}", gauge(part.percent, layout.partition_gauge_width)));
        lines.push(format!("    Free: {} | Type: {}", format_bytes(part.free as f64), part.fs_type));
    }
}

fn battery_section(lines: &mut Vec<String>, battery: &BatteryInfo, layout: &Layout) {
    section_title(lines, "BATTERY");
    let state = if battery.plugged { "Plugged in" } else { "On battery" };
    let color = UsageTier::for_battery(battery.percent).color();
    lines.push(format!("  Level: {:.0}% ({})", battery.percent, state));
    lines.push(format!("  {color}{}{RESET}", gauge(battery.percent, layout.battery_gauge_width)));
}

fn process_section(lines: &mut Vec<String>, processes: &[ProcessInfo], layout: &Layout) {
    // Heading shows the configured limit, even when fewer processes are listed
    section_title(lines, &format!("TOP {} PROCESSES", layout.top_processes));
    lines.push(format!(
        "  {YELLOW}{:<10} {:<20} {:<10} {:<10}{RESET}",
        "PID", "NAME", "STATE", "CPU %"
    ));
    lines.push(format!("  {}", "-".repeat(60)));
    for proc in processes {
        lines.push(format!(
            "  {:<10} {:<20} {:<10} {:>6.1}%",
            proc.pid,
            truncate_chars(&proc.name, PROCESS_NAME_WIDTH),
            proc.state,
            proc.cpu_or_zero()
        ));
    }
}
