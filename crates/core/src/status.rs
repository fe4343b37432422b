use crate::engine::Thresholds;
use crate::reading::Sample;
use serde::Serialize;
use std::fmt;

/// Display tone for the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Plugged in and still below the full threshold.
    Charging,
    /// Running on battery.
    Discharging,
    /// Plugged in at or above the full threshold.
    Attention,
    /// No sensor data.
    Unavailable,
}

/// Human-readable one-line summary of the power state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub text: String,
    pub tone: Tone,
}

impl StatusLine {
    pub fn describe(sample: &Sample, thresholds: &Thresholds) -> Self {
        let Some(r) = sample.reading() else {
            return Self {
                text: "Status: Battery info not available".to_string(),
                tone: Tone::Unavailable,
            };
        };

        let tone = match (r.plugged_in, r.percent < thresholds.full()) {
            (true, true) => Tone::Charging,
            (false, _) => Tone::Discharging,
            (true, false) => Tone::Attention,
        };
        let mode = if r.plugged_in { "Charging" } else { "Discharging" };

        Self {
            text: format!("Status: {}% ({mode})", r.percent),
            tone,
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
