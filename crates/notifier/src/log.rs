use battmon_core::{AlertEvent, Notifier, Urgency};
use tracing::{info, warn};

/// Writes alerts to the log instead of the desktop.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, event: AlertEvent) {
        match event.urgency() {
            Urgency::Critical => warn!(kind = %event.kind, "{}: {}", event.title, event.body),
            Urgency::Normal | Urgency::Low => {
                info!(kind = %event.kind, "{}: {}", event.title, event.body)
            }
        }
    }
}
