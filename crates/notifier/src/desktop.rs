use battmon_core::{AlertEvent, AlertKind, MonitorError, Notifier, Urgency};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use zbus::zvariant::Value;
use zbus::Connection;

#[zbus::proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: &[&str],
        hints: &HashMap<&str, &Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;
}

/// Sends alerts to the desktop notification daemon over D-Bus.
///
/// Each alert kind reuses its previous popup id, so a repeated low-battery
/// alert replaces the old bubble instead of stacking a new one.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    proxy: NotificationsProxy<'static>,
    app_name: String,
    expire_timeout: i32,
    last_ids: Arc<Mutex<HashMap<AlertKind, u32>>>,
}

impl DesktopNotifier {
    /// Connect to the session bus.  Fails when no bus or notification
    /// daemon is reachable (headless sessions, SSH).
    pub async fn connect(
        app_name: impl Into<String>,
        timeout_secs: u32,
    ) -> battmon_core::Result<Self> {
        let conn = Connection::session()
            .await
            .map_err(|e| MonitorError::Notify(format!("session bus: {e}")))?;
        let proxy = NotificationsProxy::new(&conn)
            .await
            .map_err(|e| MonitorError::Notify(format!("notification proxy: {e}")))?;

        Ok(Self {
            proxy,
            app_name: app_name.into(),
            expire_timeout: expire_timeout_ms(timeout_secs),
            last_ids: Arc::default(),
        })
    }

    async fn deliver(self, event: AlertEvent) {
        let replaces_id = self.replaces_id(event.kind);
        let urgency = Value::from(urgency_byte(event.urgency()));
        let hints = HashMap::from([("urgency", &urgency)]);

        let result = self
            .proxy
            .notify(
                &self.app_name,
                replaces_id,
                "battery",
                &event.title,
                &event.body,
                &[],
                &hints,
                self.expire_timeout,
            )
            .await;

        match result {
            Ok(id) => {
                debug!(kind = %event.kind, id, "notification shown");
                if let Ok(mut ids) = self.last_ids.lock() {
                    ids.insert(event.kind, id);
                }
            }
            Err(e) => warn!(kind = %event.kind, "failed to send notification: {e}"),
        }
    }

    fn replaces_id(&self, kind: AlertKind) -> u32 {
        self.last_ids
            .lock()
            .ok()
            .and_then(|ids| ids.get(&kind).copied())
            .unwrap_or(0)
    }
}

impl Notifier for DesktopNotifier {
    fn send(&self, event: AlertEvent) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(self.clone().deliver(event));
            }
            Err(_) => warn!(kind = %event.kind, "no async runtime; notification dropped"),
        }
    }
}

/// The freedesktop `urgency` hint byte.
fn urgency_byte(urgency: Urgency) -> u8 {
    match urgency {
        Urgency::Low => 0,
        Urgency::Normal => 1,
        Urgency::Critical => 2,
    }
}

/// `0` seconds means "server default", which the protocol spells `-1`.
fn expire_timeout_ms(timeout_secs: u32) -> i32 {
    if timeout_secs == 0 {
        return -1;
    }
    i32::try_from(u64::from(timeout_secs) * 1000).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgency_levels() {
        assert_eq!(urgency_byte(Urgency::Low), 0);
        assert_eq!(urgency_byte(Urgency::Normal), 1);
        assert_eq!(urgency_byte(Urgency::Critical), 2);
    }

    #[test]
    fn expire_timeout() {
        assert_eq!(expire_timeout_ms(0), -1);
        assert_eq!(expire_timeout_ms(5), 5_000);
        assert_eq!(expire_timeout_ms(u32::MAX), i32::MAX);
    }
}
