pub mod alert;
pub mod collab;
pub mod engine;
pub mod error;
pub mod health;
pub mod reading;
pub mod status;

pub use alert::{AlertEvent, AlertKind, Urgency};
pub use collab::{BatterySampler, Notifier};
pub use engine::{AlertEngine, AlertState, CooldownPolicy, Decision, Thresholds};
pub use error::{MonitorError, Result};
pub use health::{time_left_label, HealthLabel, HealthReadout};
pub use reading::{Reading, Sample, TimeRemaining};
pub use status::{StatusLine, Tone};
