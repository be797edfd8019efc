mod process_info;
mod system_snapshot;

pub use process_info::{state_label, ProcessInfo};
pub use system_snapshot::*;
