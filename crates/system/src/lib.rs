//! Battery sensors backed by the host operating system.

pub mod battery;

pub use battery::{SysfsSampler, DEFAULT_SYSFS_ROOT};
