use crate::common::{
    CameraConfig, CameraStatusSnapshot, DetectionResult, EncodedFrame, LabelSet, SnapshotStatus,
};
use crate::error::{CaptureError, InferenceError};
use crate::inference::{InferenceRequest, InferenceService, into_inference_error};
use crate::intake::{FrameSampler, SamplerFactory};
use crate::monitor::{AlertState, MonitorSettings};
use crate::status::StatusSink;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, Interval, MissedTickBehavior, timeout_at};
use tokio_util::sync::CancellationToken;
use tower::{Service, ServiceExt};
use tracing::{debug, info, instrument, warn};

/// Drives one camera: sample, infer, update the alert state, publish.
///
/// A monitor runs its cycles strictly one after another, so its
/// [`AlertState`] never sees two transitions interleave. Failures stay inside
/// the cycle that hit them and come out as a snapshot.
pub struct CameraMonitor {
    camera: CameraConfig,
    state: AlertState,
    sampler_factory: Arc<dyn SamplerFactory>,
    sampler: Option<Box<dyn FrameSampler>>,
    inference: InferenceService,
    sink: Arc<dyn StatusSink>,
    settings_rx: watch::Receiver<MonitorSettings>,
}

impl CameraMonitor {
    pub fn new(
        camera: CameraConfig,
        sampler_factory: Arc<dyn SamplerFactory>,
        inference: InferenceService,
        sink: Arc<dyn StatusSink>,
        settings_rx: watch::Receiver<MonitorSettings>,
    ) -> Self {
        let state = AlertState::new(settings_rx.borrow().cooldown);
        Self {
            camera,
            state,
            sampler_factory,
            sampler: None,
            inference,
            sink,
            settings_rx,
        }
    }

    pub fn state(&self) -> &AlertState {
        &self.state
    }

    /// Ticks on the configured sample interval until `cancel_token` fires.
    /// Ticks that come due while a cycle is still running are skipped.
    pub async fn run(mut self, cancel_token: CancellationToken) {
        let mut period = self.settings_rx.borrow_and_update().sample_interval;
        let mut ticker = new_ticker(Instant::now(), period);
        info!(
            "Camera monitor for {} started, sampling every {:?}",
            self.camera.camera_id(),
            period
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => break,
                changed = self.settings_rx.changed() => {
                    if changed.is_err() {
                        debug!("Settings for {} closed", self.camera.camera_id());
                        break;
                    }
                    let next = self.settings_rx.borrow_and_update().sample_interval;
                    if next != period {
                        debug!(
                            "Camera {} sample interval {:?} -> {:?}",
                            self.camera.camera_id(),
                            period,
                            next
                        );
                        period = next;
                        ticker = new_ticker(Instant::now() + period, period);
                    }
                }
                _ = ticker.tick() => {
                    tokio::select! {
                        biased;
                        _ = cancel_token.cancelled() => break,
                        _ = self.run_cycle() => {}
                    }
                }
            }
        }
        info!("Camera monitor for {} stopped", self.camera.camera_id());
    }

    pub async fn run_cycle(&mut self) -> CameraStatusSnapshot {
        self.cycle_at(Instant::now()).await
    }

    #[instrument(skip(self, now), fields(camera_id = %self.camera.camera_id()))]
    pub(crate) async fn cycle_at(&mut self, now: Instant) -> CameraStatusSnapshot {
        let settings = self.settings_rx.borrow().clone();
        self.state.set_cooldown_duration(settings.cooldown);

        if self.state.expire_cooldown(now) {
            debug!("Cooldown expired, accepting detections again");
        }

        let snapshot = if self.state.in_cooldown() {
            self.snapshot(SnapshotStatus::CooldownActive, self.state.last_labels().clone())
        } else {
            self.sample_and_infer(now, &settings).await
        };

        self.sink.publish(snapshot.clone());
        snapshot
    }

    async fn sample_and_infer(
        &mut self,
        now: Instant,
        settings: &MonitorSettings,
    ) -> CameraStatusSnapshot {
        let deadline = now + settings.cycle_timeout;

        // Running out of cycle time counts as a model failure whichever step
        // was in progress.
        let frame = match timeout_at(deadline, self.capture()).await {
            Ok(Ok(frame)) => frame,
            Ok(Err(e)) => {
                warn!("Capture failed: {}", e);
                self.state.record_failure(settings.errors_are_fatal);
                return self.snapshot(SnapshotStatus::CaptureError, LabelSet::new());
            }
            Err(_) => return self.deadline_exceeded(settings, "capture"),
        };

        let detection = match timeout_at(deadline, self.infer(frame)).await {
            Ok(Ok(detection)) => detection.retain_watched(&settings.alert_labels),
            Ok(Err(e)) => {
                warn!("Inference failed: {}", e);
                self.state.record_failure(settings.errors_are_fatal);
                return self.snapshot(SnapshotStatus::ModelError, LabelSet::new());
            }
            Err(_) => return self.deadline_exceeded(settings, "inference"),
        };

        if detection.is_empty() {
            self.state.record_clear();
            return self.snapshot(SnapshotStatus::Safe, LabelSet::new());
        }

        info!(
            "Detected {:?} in frame captured at {}, raising alert",
            detection.labels, detection.captured_at
        );
        self.state.record_detection(detection.labels.clone(), now);
        self.snapshot(SnapshotStatus::Alert, detection.labels)
    }

    fn deadline_exceeded(
        &mut self,
        settings: &MonitorSettings,
        step: &str,
    ) -> CameraStatusSnapshot {
        warn!(
            "Cycle deadline of {:?} exceeded during {}",
            settings.cycle_timeout, step
        );
        self.state.record_failure(settings.errors_are_fatal);
        self.snapshot(SnapshotStatus::ModelError, LabelSet::new())
    }

    async fn capture(&mut self) -> Result<EncodedFrame, CaptureError> {
        if self.sampler.is_none() {
            self.sampler = Some(self.sampler_factory.open(&self.camera)?);
        }
        let sampler = self.sampler.as_mut().ok_or_else(|| {
            CaptureError::SourceUnavailable("frame source not open".to_string())
        })?;

        let result = sampler.sample().await;
        if let Err(CaptureError::SourceUnavailable(_)) = result {
            // Reopen the source on the next tick.
            self.sampler = None;
        }
        result
    }

    async fn infer(&mut self, frame: EncodedFrame) -> Result<DetectionResult, InferenceError> {
        let captured_at = frame.captured_at();
        let labels = self
            .inference
            .ready()
            .await
            .map_err(into_inference_error)?
            .call(InferenceRequest::new(frame))
            .await
            .map_err(into_inference_error)?;
        Ok(DetectionResult::new(
            self.camera.camera_id(),
            labels,
            captured_at,
        ))
    }

    fn snapshot(&self, status: SnapshotStatus, labels: LabelSet) -> CameraStatusSnapshot {
        CameraStatusSnapshot::new(self.camera.camera_id(), status, labels, Utc::now())
    }
}

fn new_ticker(start: Instant, period: Duration) -> Interval {
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}
