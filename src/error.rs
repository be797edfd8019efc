use thiserror::Error;

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("metrics source unavailable: {0}")]
    UnavailableMetricsSource(String),

    #[error("access denied to partition {mount_point}")]
    PartitionAccessDenied { mount_point: String },

    #[error("partition {mount_point} did not answer within {timeout_ms}ms")]
    PartitionTimeout { mount_point: String, timeout_ms: u64 },

    #[error("process {pid} vanished during enumeration")]
    ProcessVanished { pid: i32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MonitorError {
    /// Whether the sampler must stop. Everything else only degrades one tick.
    pub fn is_fatal(&self) -> bool {
        matches!(self, MonitorError::UnavailableMetricsSource(_))
    }
}
