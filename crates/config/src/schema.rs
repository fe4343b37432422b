use battmon_core::{CooldownPolicy, Result, Thresholds};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure parsed from `battmon.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Alert thresholds.
    pub thresholds: ThresholdConfig,
    /// Minimum gap between repeated alerts of the same kind.
    pub cooldown: CooldownConfig,
    /// Sensor polling.
    pub poll: PollConfig,
    /// Desktop notification settings.
    pub notification: NotificationConfig,
    /// Where to find the battery.
    pub sensor: SensorConfig,
}

impl MonitorConfig {
    /// Validated thresholds.  Fails if `low >= full` or either is out of range.
    pub fn thresholds(&self) -> Result<Thresholds> {
        Thresholds::new(self.thresholds.low, self.thresholds.full)
    }

    pub fn cooldown(&self) -> CooldownPolicy {
        CooldownPolicy::from_secs(self.cooldown.total_secs())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_secs.max(1))
    }
}

/// Raw threshold percentages, validated by [`MonitorConfig::thresholds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Alert when unplugged at or below this level (0 – 99).
    pub low: u8,
    /// Alert when plugged in at or above this level (1 – 100).
    pub full: u8,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        let t = Thresholds::default();
        Self {
            low: t.low(),
            full: t.full(),
        }
    }
}

/// Cooldown split into minutes and seconds; the two are summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    pub minutes: u64,
    pub seconds: u64,
}

impl CooldownConfig {
    pub fn total_secs(&self) -> u64 {
        self.minutes.saturating_mul(60).saturating_add(self.seconds)
    }
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            minutes: 0,
            seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between sensor reads.  Values below 1 are treated as 1.
    pub interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// When `false`, alerts are only logged.
    pub enabled: bool,
    /// Application name reported to the notification daemon.
    pub app_name: String,
    /// How long the popup stays visible.  `0` lets the daemon decide.
    pub timeout_secs: u32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            app_name: "battmon".to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Root of the power-supply class directory.
    pub sysfs_root: PathBuf,
    /// Battery device name, e.g. `"BAT1"`.  First `BAT*` entry when unset.
    pub battery: Option<String>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from("/sys/class/power_supply"),
            battery: None,
        }
    }
}
