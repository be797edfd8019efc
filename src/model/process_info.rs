#[derive(Debug, Clone, PartialEq)]
pub struct ProcessInfo {
    pub pid: i32,
    pub name: String,
    pub state: String,
    /// Percent of one core since the previous tick; `None` when no interval was measured.
    pub cpu_percent: Option<f64>,
}

impl ProcessInfo {
    pub fn cpu_or_zero(&self) -> f64 {
        self.cpu_percent.unwrap_or(0.0)
    }
}

/// Maps a `/proc/<pid>/stat` state code to the label `ps` tooling shows.
pub fn state_label(code: char) -> &'static str {
    match code {
        'R' => "running",
        'S' => "sleeping",
        'D' => "disk-sleep",
        'Z' => "zombie",
        'T' => "stopped",
        't' => "tracing-stop",
        'X' | 'x' => "dead",
        'K' => "wake-kill",
        'W' => "waking",
        'P' => "parked",
        'I' => "idle",
        _ => "unknown",
    }
}
