//! [`Notifier`](battmon_core::Notifier) implementations.
//!
//! - [`DesktopNotifier`] talks to the freedesktop notification daemon over
//!   the D-Bus session bus.
//! - [`LogNotifier`] only writes a log line; used when notifications are
//!   disabled or no session bus is reachable.

pub mod desktop;
pub mod log;

pub use desktop::DesktopNotifier;
pub use log::LogNotifier;
