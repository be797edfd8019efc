pub mod dashboard;
pub mod format;

pub use dashboard::{render, Layout};
