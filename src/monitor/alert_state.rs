use crate::common::LabelSet;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertStatus {
    /// No active alert, new detections raise one.
    Idle,
    /// An alert fired recently and further detections are suppressed.
    Cooldown,
    /// The last cycle failed and failures are configured as fatal.
    Error,
}

/// Alert bookkeeping for exactly one camera. Only that camera's monitor
/// touches it.
#[derive(Debug, Clone)]
pub struct AlertState {
    status: AlertStatus,
    last_alert_at: Option<Instant>,
    last_labels: LabelSet,
    cooldown_duration: Duration,
}

impl AlertState {
    pub fn new(cooldown_duration: Duration) -> Self {
        Self {
            status: AlertStatus::Idle,
            last_alert_at: None,
            last_labels: LabelSet::new(),
            cooldown_duration,
        }
    }

    pub fn status(&self) -> AlertStatus {
        self.status
    }

    pub fn last_alert_at(&self) -> Option<Instant> {
        self.last_alert_at
    }

    pub fn last_labels(&self) -> &LabelSet {
        &self.last_labels
    }

    pub fn cooldown_duration(&self) -> Duration {
        self.cooldown_duration
    }

    pub fn set_cooldown_duration(&mut self, cooldown_duration: Duration) {
        self.cooldown_duration = cooldown_duration;
    }

    pub fn in_cooldown(&self) -> bool {
        self.status == AlertStatus::Cooldown
    }

    /// Leaves COOLDOWN once the window since the last alert has fully
    /// elapsed. Returns whether a transition happened.
    pub fn expire_cooldown(&mut self, now: Instant) -> bool {
        if self.status != AlertStatus::Cooldown {
            return false;
        }
        let expired = self
            .last_alert_at
            .map_or(true, |at| now.saturating_duration_since(at) >= self.cooldown_duration);
        if expired {
            self.status = AlertStatus::Idle;
        }
        expired
    }

    pub fn record_detection(&mut self, labels: LabelSet, now: Instant) {
        self.last_alert_at = Some(now);
        self.last_labels = labels;
        self.status = AlertStatus::Cooldown;
    }

    /// A successful cycle with nothing detected.
    pub fn record_clear(&mut self) {
        if self.status == AlertStatus::Error {
            self.status = AlertStatus::Idle;
        }
    }

    /// A failed capture or inference. The status only moves when failures
    /// are fatal, and never out of COOLDOWN.
    pub fn record_failure(&mut self, fatal: bool) {
        if fatal && self.status != AlertStatus::Cooldown {
            self.status = AlertStatus::Error;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> LabelSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn starts_idle() {
        let state = AlertState::new(Duration::from_secs(120));
        assert_eq!(state.status(), AlertStatus::Idle);
        assert!(state.last_alert_at().is_none());
        assert!(state.last_labels().is_empty());
    }

    #[test]
    fn cooldown_holds_until_window_elapses() {
        let t0 = Instant::now();
        let mut state = AlertState::new(Duration::from_secs(120));
        state.record_detection(labels(&["person"]), t0);

        assert!(!state.expire_cooldown(t0 + Duration::from_secs(119)));
        assert!(state.in_cooldown());

        assert!(state.expire_cooldown(t0 + Duration::from_secs(120)));
        assert_eq!(state.status(), AlertStatus::Idle);
        assert_eq!(state.last_labels(), &labels(&["person"]));
    }

    #[test]
    fn shorter_cooldown_applies_to_running_window() {
        let t0 = Instant::now();
        let mut state = AlertState::new(Duration::from_secs(120));
        state.record_detection(labels(&["person"]), t0);
        state.set_cooldown_duration(Duration::from_secs(10));
        assert!(state.expire_cooldown(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn non_fatal_failures_keep_status() {
        let mut state = AlertState::new(Duration::from_secs(120));
        state.record_failure(false);
        assert_eq!(state.status(), AlertStatus::Idle);

        state.record_detection(labels(&["knife"]), Instant::now());
        state.record_failure(true);
        assert_eq!(state.status(), AlertStatus::Cooldown);
    }

    #[test]
    fn fatal_failure_enters_error_until_next_success() {
        let mut state = AlertState::new(Duration::from_secs(120));
        state.record_failure(true);
        assert_eq!(state.status(), AlertStatus::Error);
        assert!(!state.expire_cooldown(Instant::now()));

        state.record_clear();
        assert_eq!(state.status(), AlertStatus::Idle);

        state.record_failure(true);
        state.record_detection(labels(&["gun"]), Instant::now());
        assert_eq!(state.status(), AlertStatus::Cooldown);
    }
}
