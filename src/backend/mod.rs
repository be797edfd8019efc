mod battery;
mod cpu;
mod disk;
mod host;
mod memory;
mod network;
mod process;
mod sampler;
mod source;

#[cfg(test)]
pub mod scripted;

pub use host::ProcSource;
pub use sampler::{Sampler, DEFAULT_TOP_PROCESSES};
pub use source::MetricsSource;
