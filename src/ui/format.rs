pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const BLUE: &str = "\x1b[94m";
pub const YELLOW: &str = "\x1b[93m";
pub const GREEN: &str = "\x1b[92m";
pub const RED: &str = "\x1b[91m";
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const FILLED: char = '█';
const EMPTY: char = '░';

/// Binary units, two decimals: `1536.0` -> `"1.50 KB"`.
pub fn format_bytes(bytes: f64) -> String {
    let mut value = bytes;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if value < 1024.0 {
            return format!("{:.2} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.2} PB", value)
}

/// Fixed-width bar; the filled part is the floor of the proportional width.
pub fn gauge(percent: f64, width: usize) -> String {
    let filled = ((percent / 100.0) * width as f64).floor().clamp(0.0, width as f64) as usize;
    let mut bar = String::with_capacity(width * FILLED.len_utf8());
    bar.extend(std::iter::repeat(FILLED).take(filled));
    bar.extend(std::iter::repeat(EMPTY).take(width - filled));
    bar
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageTier {
    Low,
    Medium,
    High,
}

impl UsageTier {
    pub fn classify(percent: f64) -> Self {
        if percent < 50.0 {
            UsageTier::Low
        } else if percent < 80.0 {
            UsageTier::Medium
        } else {
            UsageTier::High
        }
    }

    /// Remaining charge is inverted so a nearly empty battery reads as urgent.
    pub fn for_battery(charge_percent: f64) -> Self {
        Self::classify(100.0 - charge_percent)
    }

    pub fn color(self) -> &'static str {
        match self {
            UsageTier::Low => GREEN,
            UsageTier::Medium => YELLOW,
            UsageTier::High => RED,
        }
    }
}

/// Truncates to `max` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
