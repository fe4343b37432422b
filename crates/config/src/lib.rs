pub mod schema;
pub mod watcher;

pub use schema::{
    CooldownConfig, MonitorConfig, NotificationConfig, PollConfig, SensorConfig, ThresholdConfig,
};
pub use watcher::ConfigWatcher;

use battmon_core::{MonitorError, Result};
use std::path::{Path, PathBuf};

/// Environment variable that overrides [`default_path`].
pub const CONFIG_ENV: &str = "BATTMON_CONFIG";

/// Load configuration from a TOML file.  Returns `MonitorConfig::default()`
/// if the file doesn't exist.
///
/// Threshold values are validated here so a bad file is reported at load
/// time rather than when the monitor starts.
pub fn load(path: impl AsRef<Path>) -> Result<MonitorConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(MonitorConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| MonitorError::Config(format!("cannot read '{}': {e}", path.display())))?;

    parse(&raw)
}

/// Parse and validate a TOML document.
pub fn parse(raw: &str) -> Result<MonitorConfig> {
    let config: MonitorConfig =
        toml::from_str(raw).map_err(|e| MonitorError::Config(format!("TOML parse error: {e}")))?;
    config.thresholds()?;
    Ok(config)
}

/// Return the config path: `$BATTMON_CONFIG` if set, otherwise
/// `battmon/battmon.toml` under `$XDG_CONFIG_HOME` (or `~/.config`).
pub fn default_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("battmon").join("battmon.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn empty_document_is_all_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg, MonitorConfig::default());
        assert_eq!(cfg.thresholds.low, 20);
        assert_eq!(cfg.thresholds.full, 90);
        assert_eq!(cfg.cooldown().duration_secs, 30);
        assert_eq!(cfg.poll_interval(), Duration::from_secs(5));
        assert!(cfg.notification.enabled);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = parse(
            r#"
            [thresholds]
            low = 15

            [cooldown]
            minutes = 2
            "#,
        )
        .unwrap();
        assert_eq!(cfg.thresholds.low, 15);
        assert_eq!(cfg.thresholds.full, 90);
        // seconds keeps its default of 30
        assert_eq!(cfg.cooldown().duration_secs, 150);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let err = parse("[thresholds]\nlow = 50\nfull = 40\n").unwrap_err();
        assert!(matches!(err, MonitorError::InvalidThresholds { low: 50, full: 40 }));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = parse("[thresholds\nlow = ").unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }

    #[test]
    fn zero_poll_interval_is_clamped() {
        let cfg = parse("[poll]\ninterval_secs = 0\n").unwrap();
        assert_eq!(cfg.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn sensor_section() {
        let cfg = parse("[sensor]\nsysfs_root = \"/tmp/ps\"\nbattery = \"BAT1\"\n").unwrap();
        assert_eq!(cfg.sensor.sysfs_root, PathBuf::from("/tmp/ps"));
        assert_eq!(cfg.sensor.battery.as_deref(), Some("BAT1"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load(dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, MonitorConfig::default());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("battmon.toml");
        std::fs::write(&path, "[notification]\nenabled = false\napp_name = \"x\"\n").unwrap();
        let cfg = load(&path).unwrap();
        assert!(!cfg.notification.enabled);
        assert_eq!(cfg.notification.app_name, "x");
        assert_eq!(cfg.notification.timeout_secs, 5);
    }
}
