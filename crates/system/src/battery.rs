use battmon_core::{BatterySampler, Reading, Sample, TimeRemaining};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/power_supply";

/// Reads battery state from the Linux sysfs power-supply interface.
///
/// Each call to [`sample`](BatterySampler::sample) re-reads a handful of
/// small pseudo-files, so it is cheap enough to call on every tick.
#[derive(Debug, Clone)]
pub struct SysfsSampler {
    root: PathBuf,
    /// Fixed device name; scan for the first `BAT*` entry when `None`.
    battery: Option<String>,
}

impl SysfsSampler {
    pub fn new(root: impl Into<PathBuf>, battery: Option<String>) -> Self {
        Self {
            root: root.into(),
            battery,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read one snapshot, or `None` if no battery can be read.
    pub fn read(&self) -> Option<Reading> {
        let dir = self.battery_dir()?;

        let percent = read_trimmed(&dir.join("capacity"))?.parse::<u8>().ok()?;
        let status = read_trimmed(&dir.join("status")).unwrap_or_default();

        let plugged_in = mains_online(&self.root).unwrap_or_else(|| {
            matches!(status.as_str(), "Charging" | "Full" | "Not charging")
        });

        let time_remaining = if plugged_in {
            TimeRemaining::Unlimited
        } else {
            seconds_to_empty(&dir).map_or(TimeRemaining::Unknown, TimeRemaining::Seconds)
        };

        trace!(dir = %dir.display(), percent, %status, plugged_in, "battery read");
        Some(Reading::new(percent, plugged_in, time_remaining))
    }

    fn battery_dir(&self) -> Option<PathBuf> {
        if let Some(name) = &self.battery {
            let dir = self.root.join(name);
            return dir.is_dir().then_some(dir);
        }

        let mut candidates: Vec<PathBuf> = fs::read_dir(&self.root)
            .ok()?
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                is_battery(&path).then_some(path)
            })
            .collect();

        // BAT0 before BAT1
        candidates.sort();
        candidates.into_iter().next()
    }
}

impl Default for SysfsSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SYSFS_ROOT, None)
    }
}

impl BatterySampler for SysfsSampler {
    fn sample(&mut self) -> Sample {
        self.read().into()
    }
}

/// Host batteries only: peripherals (mice, keyboards, headsets) also show up
/// as `type = Battery` but carry `scope = Device`.
fn is_battery(path: &Path) -> bool {
    if read_trimmed(&path.join("scope")).as_deref() == Some("Device") {
        return false;
    }
    match read_trimmed(&path.join("type")) {
        Some(kind) => kind == "Battery",
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("BAT")),
    }
}

/// `Some(true)` if any `Mains` supply reports online, `Some(false)` if mains
/// supplies exist but all are offline, `None` if there are none.
fn mains_online(root: &Path) -> Option<bool> {
    let mut seen = false;
    for entry in fs::read_dir(root).ok()?.flatten() {
        let path = entry.path();
        if read_trimmed(&path.join("type")).as_deref() != Some("Mains") {
            continue;
        }
        seen = true;
        if read_trimmed(&path.join("online")).as_deref() == Some("1") {
            return Some(true);
        }
    }
    seen.then_some(false)
}

/// Estimate seconds until empty from the current draw.
///
/// Drivers expose either energy (µWh / µW) or charge (µAh / µA); both
/// ratios give hours.
fn seconds_to_empty(dir: &Path) -> Option<u64> {
    let pairs = [("energy_now", "power_now"), ("charge_now", "current_now")];
    pairs.iter().find_map(|(level, rate)| {
        let level = read_u64(&dir.join(level))?;
        let rate = read_u64(&dir.join(rate)).filter(|&r| r > 0)?;
        Some(level.saturating_mul(3600) / rate)
    })
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

fn read_u64(path: &Path) -> Option<u64> {
    // Some drivers report a negative current while discharging.
    let raw = read_trimmed(path)?;
    let value = raw.parse::<i64>().ok()?;
    Some(value.unsigned_abs())
}
