use thiserror::Error;

/// Top-level error type used across the entire application.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// `low` must be strictly below `full`.
    #[error("invalid thresholds: low ({low}%) must be below full ({full}%)")]
    InvalidThresholds { low: u8, full: u8 },

    #[error("{which} threshold {value}% is out of range")]
    ThresholdOutOfRange { which: &'static str, value: u8 },

    #[error("config error: {0}")]
    Config(String),

    #[error("notification error: {0}")]
    Notify(String),

    /// The monitor task has exited and no longer accepts commands.
    #[error("monitor is not running")]
    MonitorStopped,
}

impl MonitorError {
    /// `true` for the errors a caller should answer by re-prompting for
    /// threshold values.
    pub fn is_threshold_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidThresholds { .. } | Self::ThresholdOutOfRange { .. }
        )
    }
}

pub type Result<T, E = MonitorError> = std::result::Result<T, E>;
