use serde::{Deserialize, Serialize};
use std::fmt;

/// The two conditions the engine can alert on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowBattery,
    FullBattery,
}

impl AlertKind {
    /// Every kind, in evaluation order.
    pub const ALL: [AlertKind; 2] = [AlertKind::LowBattery, AlertKind::FullBattery];

    /// How loudly the notification should be presented.
    pub fn urgency(self) -> Urgency {
        match self {
            Self::LowBattery => Urgency::Critical,
            Self::FullBattery => Urgency::Normal,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LowBattery => "low-battery",
            Self::FullBattery => "full-battery",
        })
    }
}

/// Notification urgency, mirroring the freedesktop levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Normal,
    Critical,
}

/// A decision by the engine that a notification should be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub title: String,
    pub body: String,
}

impl AlertEvent {
    /// Build the event for `kind` at the given charge level.
    pub fn new(kind: AlertKind, percent: u8) -> Self {
        match kind {
            AlertKind::LowBattery => Self {
                kind,
                title: "Low battery".to_string(),
                body: format!("Battery is at {percent}%. Please plug in the charger."),
            },
            AlertKind::FullBattery => Self {
                kind,
                title: "Battery full".to_string(),
                body: format!(
                    "Battery is at {percent}%. Unplug the charger to preserve battery health."
                ),
            },
        }
    }

    pub fn urgency(&self) -> Urgency {
        self.kind.urgency()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_event_mentions_percent() {
        let ev = AlertEvent::new(AlertKind::LowBattery, 12);
        assert_eq!(ev.title, "Low battery");
        assert!(ev.body.contains("12%"));
        assert_eq!(ev.urgency(), Urgency::Critical);
    }

    #[test]
    fn full_event_is_normal_urgency() {
        let ev = AlertEvent::new(AlertKind::FullBattery, 96);
        assert_eq!(ev.title, "Battery full");
        assert!(ev.body.contains("96%"));
        assert_eq!(ev.urgency(), Urgency::Normal);
    }
}
