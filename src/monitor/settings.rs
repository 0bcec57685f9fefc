use crate::common::{DEFAULT_SAMPLE_INTERVAL, LabelSet};
use std::time::Duration;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(120);
pub const DEFAULT_CYCLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Live-tunable knobs of one monitor, delivered over a watch channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    pub sample_interval: Duration,
    pub cooldown: Duration,
    /// Budget shared by capture and inference within one cycle.
    pub cycle_timeout: Duration,
    pub errors_are_fatal: bool,
    /// Labels that count as a detection; empty means all of them.
    pub alert_labels: LabelSet,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            cooldown: DEFAULT_COOLDOWN,
            cycle_timeout: DEFAULT_CYCLE_TIMEOUT,
            errors_are_fatal: false,
            alert_labels: LabelSet::new(),
        }
    }
}
