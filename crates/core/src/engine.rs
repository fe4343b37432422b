//! The threshold / cooldown decision engine.
//!
//! [`AlertEngine`] is a plain synchronous state machine.  It owns the alert
//! thresholds, the cooldown policy, and the per-kind "last fired" clock, and
//! turns one [`Sample`] at a time into at most one [`AlertEvent`].  It never
//! performs I/O; the driver samples the sensor before calling
//! [`AlertEngine::evaluate`] and dispatches the returned event afterwards.

use crate::alert::{AlertEvent, AlertKind};
use crate::error::{MonitorError, Result};
use crate::reading::{Reading, Sample};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Highest accepted `low` threshold.
pub const MAX_LOW_PERCENT: u8 = 99;
/// Lowest accepted `full` threshold.
pub const MIN_FULL_PERCENT: u8 = 1;

// ── Thresholds ────────────────────────────────────────────────────────────────

/// Charge levels that trigger alerts.  Always satisfies `low < full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Thresholds {
    low: u8,
    full: u8,
}

impl Thresholds {
    /// Validate and build a threshold pair.
    ///
    /// `low` must lie in `0..=99`, `full` in `1..=100`, and `low < full`.
    pub fn new(low: u8, full: u8) -> Result<Self> {
        if low > MAX_LOW_PERCENT {
            return Err(MonitorError::ThresholdOutOfRange {
                which: "low",
                value: low,
            });
        }
        if !(MIN_FULL_PERCENT..=100).contains(&full) {
            return Err(MonitorError::ThresholdOutOfRange {
                which: "full",
                value: full,
            });
        }
        if low >= full {
            return Err(MonitorError::InvalidThresholds { low, full });
        }
        Ok(Self { low, full })
    }

    pub fn low(&self) -> u8 {
        self.low
    }

    pub fn full(&self) -> u8 {
        self.full
    }

    /// Unplugged at or below `low`.
    pub fn is_low(&self, reading: &Reading) -> bool {
        !reading.plugged_in && reading.percent <= self.low
    }

    /// Plugged in at or above `full`.
    pub fn is_full(&self, reading: &Reading) -> bool {
        reading.plugged_in && reading.percent >= self.full
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { low: 20, full: 90 }
    }
}

// ── Cooldown ──────────────────────────────────────────────────────────────────

/// Minimum time between two firings of the same alert kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CooldownPolicy {
    pub duration_secs: u64,
}

impl CooldownPolicy {
    pub fn from_secs(duration_secs: u64) -> Self {
        Self { duration_secs }
    }

    /// `true` when strictly more than the cooldown has passed between
    /// `since` and `now`.
    ///
    /// A `now` earlier than `since` (wall clock stepped backwards) counts as
    /// no time elapsed.  Durations too large for [`TimeDelta`] never elapse.
    pub fn has_elapsed(&self, since: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let elapsed = now.signed_duration_since(since);
        i64::try_from(self.duration_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .is_some_and(|window| elapsed > window)
    }
}

// ── Alert state ───────────────────────────────────────────────────────────────

/// When each alert kind last fired.  `None` = never.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AlertState {
    low_battery: Option<DateTime<Utc>>,
    full_battery: Option<DateTime<Utc>>,
}

impl AlertState {
    pub fn last_fired(&self, kind: AlertKind) -> Option<DateTime<Utc>> {
        match kind {
            AlertKind::LowBattery => self.low_battery,
            AlertKind::FullBattery => self.full_battery,
        }
    }

    fn record(&mut self, kind: AlertKind, at: DateTime<Utc>) {
        let slot = match kind {
            AlertKind::LowBattery => &mut self.low_battery,
            AlertKind::FullBattery => &mut self.full_battery,
        };
        *slot = Some(at);
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// Outcome of a single [`AlertEngine::decide`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The sensor had nothing to report.
    SensorUnavailable,
    /// No alert condition holds.
    Idle,
    /// A condition holds but fired too recently.
    Suppressed(AlertKind),
    /// Show this notification.
    Fire(AlertEvent),
}

impl Decision {
    pub fn into_event(self) -> Option<AlertEvent> {
        match self {
            Self::Fire(event) => Some(event),
            _ => None,
        }
    }
}

/// Stateful alert decision engine.
///
/// All mutation goes through `&mut self`, so the borrow checker already
/// forbids concurrent calls on one instance; a driver that shares the engine
/// across tasks must put it behind a single owner or a mutex.
#[derive(Debug, Clone)]
pub struct AlertEngine {
    thresholds: Thresholds,
    cooldown: CooldownPolicy,
    state: AlertState,
}

impl AlertEngine {
    pub fn new(thresholds: Thresholds, cooldown: CooldownPolicy) -> Self {
        Self {
            thresholds,
            cooldown,
            state: AlertState::default(),
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn cooldown(&self) -> CooldownPolicy {
        self.cooldown
    }

    pub fn state(&self) -> &AlertState {
        &self.state
    }

    /// Replace both thresholds at once.  On error nothing changes.
    ///
    /// Fire history is kept: changing thresholds does not restart cooldowns.
    pub fn set_thresholds(&mut self, low: u8, full: u8) -> Result<()> {
        self.thresholds = Thresholds::new(low, full)?;
        Ok(())
    }

    pub fn set_cooldown(&mut self, seconds: u64) {
        self.cooldown = CooldownPolicy::from_secs(seconds);
    }

    /// The alert condition `reading` satisfies, if any.
    ///
    /// Low battery is checked first, so it wins if both conditions hold.
    pub fn triggered_kind(&self, reading: &Reading) -> Option<AlertKind> {
        pick_kind(
            self.thresholds.is_low(reading),
            self.thresholds.is_full(reading),
        )
    }

    /// Evaluate one sample and report what happened.
    ///
    /// State changes only on [`Decision::Fire`].
    pub fn decide(&mut self, sample: &Sample, now: DateTime<Utc>) -> Decision {
        let Sample::Available(reading) = sample else {
            return Decision::SensorUnavailable;
        };
        let Some(kind) = self.triggered_kind(reading) else {
            return Decision::Idle;
        };

        if let Some(last) = self.state.last_fired(kind) {
            if !self.cooldown.has_elapsed(last, now) {
                debug!(%kind, percent = reading.percent, "alert suppressed by cooldown");
                return Decision::Suppressed(kind);
            }
        }

        self.state.record(kind, now);
        Decision::Fire(AlertEvent::new(kind, reading.percent))
    }

    /// Evaluate one sample, returning the event to display, if any.
    pub fn evaluate(&mut self, sample: &Sample, now: DateTime<Utc>) -> Option<AlertEvent> {
        self.decide(sample, now).into_event()
    }
}

/// Resolve the two trigger conditions to a single kind, low first.
fn pick_kind(should_low: bool, should_full: bool) -> Option<AlertKind> {
    AlertKind::ALL
        .into_iter()
        .zip([should_low, should_full])
        .find_map(|(kind, holds)| holds.then_some(kind))
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new(Thresholds::default(), CooldownPolicy::from_secs(30))
    }
}
