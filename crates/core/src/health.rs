use crate::reading::{Sample, TimeRemaining};
use serde::Serialize;
use std::fmt;

/// Coarse charge-health bucket shown next to the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthLabel {
    Good,
    Moderate,
    Low,
}

impl HealthLabel {
    /// `Good` above 70 %, `Moderate` above 40 %, `Low` otherwise.
    pub fn classify(percent: u8) -> Self {
        match percent {
            71.. => Self::Good,
            41..=70 => Self::Moderate,
            _ => Self::Low,
        }
    }
}

impl fmt::Display for HealthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
        })
    }
}

/// Render a time estimate as `"Unlimited"`, `"Unknown"`, or `"{h}h {m}m"`.
pub fn time_left_label(remaining: TimeRemaining) -> String {
    match remaining {
        TimeRemaining::Unlimited => "Unlimited".to_string(),
        TimeRemaining::Unknown => "Unknown".to_string(),
        TimeRemaining::Seconds(secs) => {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        }
    }
}

/// The "Health / Time left" readout for one sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReadout {
    /// `None` when the sensor was unavailable.
    pub health: Option<HealthLabel>,
    pub time_left: Option<String>,
}

impl HealthReadout {
    pub fn from_sample(sample: &Sample) -> Self {
        match sample.reading() {
            Some(r) => Self {
                health: Some(HealthLabel::classify(r.percent)),
                time_left: Some(time_left_label(r.time_remaining)),
            },
            None => Self {
                health: None,
                time_left: None,
            },
        }
    }
}

impl fmt::Display for HealthReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let health = self
            .health
            .map_or_else(|| "N/A".to_string(), |h| h.to_string());
        let time = self.time_left.as_deref().unwrap_or("N/A");
        write!(f, "Health: {health}   |   Time left: {time}")
    }
}
