use serde::{Deserialize, Serialize};

/// Estimated time until the battery is empty, as reported by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "seconds")]
pub enum TimeRemaining {
    /// A concrete estimate in whole seconds.
    Seconds(u64),
    /// Running from mains power; the battery is not draining.
    Unlimited,
    /// The sensor could not produce an estimate.
    Unknown,
}

impl TimeRemaining {
    /// Map a raw signed seconds value to a [`TimeRemaining`].
    ///
    /// Negative values are how most power APIs spell "no estimate".
    pub fn from_raw_seconds(secs: i64) -> Self {
        u64::try_from(secs).map_or(Self::Unknown, Self::Seconds)
    }
}

/// One snapshot of power-supply state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Charge level, always within `0..=100`.
    pub percent: u8,
    /// `true` while the host is connected to external power.
    pub plugged_in: bool,
    pub time_remaining: TimeRemaining,
}

impl Reading {
    /// Build a reading, clamping `percent` into `0..=100`.
    pub fn new(percent: u8, plugged_in: bool, time_remaining: TimeRemaining) -> Self {
        Self {
            percent: percent.min(100),
            plugged_in,
            time_remaining,
        }
    }
}

/// Result of asking a [`BatterySampler`](crate::BatterySampler) for data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "reading")]
pub enum Sample {
    Available(Reading),
    /// No battery present, or the sensor could not be read.
    Unavailable,
}

impl Sample {
    pub fn reading(&self) -> Option<&Reading> {
        match self {
            Self::Available(r) => Some(r),
            Self::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

impl From<Option<Reading>> for Sample {
    fn from(value: Option<Reading>) -> Self {
        value.map_or(Self::Unavailable, Self::Available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_raw_seconds_are_unknown() {
        assert_eq!(TimeRemaining::from_raw_seconds(-1), TimeRemaining::Unknown);
        assert_eq!(TimeRemaining::from_raw_seconds(-2), TimeRemaining::Unknown);
        assert_eq!(TimeRemaining::from_raw_seconds(0), TimeRemaining::Seconds(0));
        assert_eq!(
            TimeRemaining::from_raw_seconds(5400),
            TimeRemaining::Seconds(5400)
        );
    }

    #[test]
    fn percent_is_clamped() {
        let r = Reading::new(140, true, TimeRemaining::Unlimited);
        assert_eq!(r.percent, 100);
    }

    #[test]
    fn sample_serializes_with_state_tag() {
        let sample = Sample::Available(Reading::new(42, false, TimeRemaining::Seconds(60)));
        let json = serde_json::to_value(sample).unwrap();
        assert_eq!(json["state"], "available");
        assert_eq!(json["reading"]["percent"], 42);
        assert_eq!(json["reading"]["time_remaining"]["kind"], "seconds");

        let json = serde_json::to_value(Sample::Unavailable).unwrap();
        assert_eq!(json["state"], "unavailable");
    }
}
