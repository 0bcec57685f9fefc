use crate::common::{CameraConfig, CameraStatusSnapshot, LabelSet};
use crate::config::Configuration;
use crate::error::{AppError, ConfigError};
use crate::inference::InferenceService;
use crate::intake::{SamplerFactory, UriSamplerFactory};
use crate::monitor::MonitorSettings;
use crate::scheduler::supervisor::{MonitorSupervisor, SchedulerCommand};
use crate::status::StatusBoard;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;

pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(2);

/// Cloneable handle to the monitor supervisor task.
#[derive(Clone)]
pub struct MonitorScheduler {
    command_tx: mpsc::Sender<SchedulerCommand>,
    board: Arc<StatusBoard>,
}

impl MonitorScheduler {
    pub fn builder(inference: InferenceService) -> MonitorSchedulerBuilder {
        MonitorSchedulerBuilder::new(inference)
    }

    /// Starts monitoring `camera`. Returns `true` when a monitor with the same
    /// id was stopped and replaced.
    pub async fn register(&self, camera: CameraConfig) -> Result<bool, AppError> {
        self.request(|responder| SchedulerCommand::Register { camera, responder })
            .await
    }

    pub async fn register_camera(
        &self,
        camera_id: &str,
        source_uri: &str,
        sample_interval: Option<Duration>,
    ) -> Result<bool, AppError> {
        let mut camera = CameraConfig::new(camera_id, source_uri)?;
        if let Some(sample_interval) = sample_interval {
            camera = camera.with_sample_interval(sample_interval)?;
        }
        self.register(camera).await
    }

    /// Stops and forgets a camera. Unknown ids are a no-op returning `false`.
    pub async fn deregister(&self, camera_id: &str) -> Result<bool, AppError> {
        let camera_id = camera_id.to_string();
        self.request(|responder| SchedulerCommand::Deregister {
            camera_id,
            responder,
        })
        .await
    }

    pub fn current_snapshots(&self) -> BTreeMap<String, CameraStatusSnapshot> {
        self.board.snapshots()
    }

    pub fn snapshot(&self, camera_id: &str) -> Option<CameraStatusSnapshot> {
        self.board.snapshot(camera_id)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CameraStatusSnapshot> {
        self.board.subscribe()
    }

    pub async fn cameras(&self) -> Result<Vec<CameraConfig>, AppError> {
        self.request(|responder| SchedulerCommand::ListCameras { responder })
            .await
    }

    /// Number of monitor tasks still alive.
    pub async fn active_monitors(&self) -> Result<usize, AppError> {
        self.request(|responder| SchedulerCommand::ActiveMonitors { responder })
            .await
    }

    /// Changes one camera's cadence without touching the others. Returns
    /// `false` for an unknown camera.
    pub async fn update_sample_interval(
        &self,
        camera_id: &str,
        sample_interval: Duration,
    ) -> Result<bool, AppError> {
        if sample_interval.is_zero() {
            return Err(ConfigError::ZeroSampleInterval(camera_id.to_string()).into());
        }
        let camera_id = camera_id.to_string();
        let updated = self
            .request(|responder| SchedulerCommand::UpdateSampleInterval {
                camera_id,
                sample_interval,
                responder,
            })
            .await??;
        Ok(updated)
    }

    /// Changes the cooldown window of every camera, current and future.
    pub async fn update_cooldown(&self, cooldown: Duration) -> Result<(), AppError> {
        if cooldown.is_zero() {
            return Err(ConfigError::ZeroCooldown.into());
        }
        self.request(|responder| SchedulerCommand::UpdateCooldown {
            cooldown,
            responder,
        })
        .await
    }

    /// Stops every monitor and the supervisor itself.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.request(|responder| SchedulerCommand::Shutdown { responder })
            .await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SchedulerCommand,
    ) -> Result<T, AppError> {
        let (responder, response_rx) = oneshot::channel();
        self.command_tx
            .send(command(responder))
            .await
            .map_err(|_| AppError::SchedulerStopped)?;
        response_rx.await.map_err(|_| AppError::SchedulerStopped)
    }
}

pub struct MonitorSchedulerBuilder {
    inference: InferenceService,
    sampler_factory: Arc<dyn SamplerFactory>,
    board: Option<Arc<StatusBoard>>,
    defaults: MonitorSettings,
    stop_grace: Duration,
    snapshot_buffer_size: usize,
    command_buffer_size: usize,
}

impl MonitorSchedulerBuilder {
    pub fn new(inference: InferenceService) -> Self {
        Self {
            inference,
            sampler_factory: Arc::new(UriSamplerFactory::new()),
            board: None,
            defaults: MonitorSettings::default(),
            stop_grace: DEFAULT_STOP_GRACE,
            snapshot_buffer_size: 64,
            command_buffer_size: 32,
        }
    }

    /// Applies the scheduler-wide values of a loaded configuration.
    pub fn configure(mut self, configuration: &Configuration) -> Self {
        self.defaults.cooldown = configuration.cooldown();
        self.defaults.cycle_timeout = configuration.cycle_timeout();
        self.defaults.errors_are_fatal = configuration.errors_are_fatal;
        self.defaults.alert_labels = configuration.alert_label_set();
        self.stop_grace = configuration.stop_grace();
        self.snapshot_buffer_size = configuration.snapshot_buffer_size;
        self
    }

    pub fn sampler_factory(mut self, sampler_factory: Arc<dyn SamplerFactory>) -> Self {
        self.sampler_factory = sampler_factory;
        self
    }

    // Shares an existing board instead of creating one.
    pub fn board(mut self, board: Arc<StatusBoard>) -> Self {
        self.board = Some(board);
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.defaults.cooldown = cooldown;
        self
    }

    pub fn cycle_timeout(mut self, cycle_timeout: Duration) -> Self {
        self.defaults.cycle_timeout = cycle_timeout;
        self
    }

    pub fn errors_are_fatal(mut self, errors_are_fatal: bool) -> Self {
        self.defaults.errors_are_fatal = errors_are_fatal;
        self
    }

    pub fn alert_labels(mut self, alert_labels: LabelSet) -> Self {
        self.defaults.alert_labels = alert_labels;
        self
    }

    pub fn stop_grace(mut self, stop_grace: Duration) -> Self {
        self.stop_grace = stop_grace;
        self
    }

    /// Spawns the supervisor task; must be called inside a tokio runtime.
    pub fn build(self) -> Result<MonitorScheduler, AppError> {
        if self.defaults.cooldown.is_zero() {
            return Err(ConfigError::ZeroCooldown.into());
        }
        let board = self
            .board
            .unwrap_or_else(|| Arc::new(StatusBoard::new(self.snapshot_buffer_size)));
        let (command_tx, mut command_rx) = mpsc::channel(self.command_buffer_size);
        let mut supervisor = MonitorSupervisor::new(
            self.defaults,
            self.stop_grace,
            self.sampler_factory,
            self.inference,
            board.clone(),
        );

        tokio::spawn(async move {
            while let Some(command) = command_rx.recv().await {
                if !supervisor.handle_command(command).await {
                    debug!("Monitor supervisor shut down");
                    return;
                }
            }
            debug!("All scheduler handles dropped, stopping monitors");
            supervisor.stop_all().await;
        });

        Ok(MonitorScheduler { command_tx, board })
    }
}
