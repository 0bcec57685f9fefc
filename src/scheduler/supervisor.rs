use crate::common::CameraConfig;
use crate::error::ConfigError;
use crate::inference::InferenceService;
use crate::intake::SamplerFactory;
use crate::monitor::{CameraMonitor, MonitorSettings};
use crate::status::StatusBoard;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct MonitorEntry {
    pub camera: CameraConfig,
    settings_tx: watch::Sender<MonitorSettings>,
    cancel_token: CancellationToken,
    task: JoinHandle<()>,
}

pub enum SchedulerCommand {
    Register {
        camera: CameraConfig,
        responder: oneshot::Sender<bool>,
    },
    Deregister {
        camera_id: String,
        responder: oneshot::Sender<bool>,
    },
    UpdateSampleInterval {
        camera_id: String,
        sample_interval: Duration,
        responder: oneshot::Sender<Result<bool, ConfigError>>,
    },
    UpdateCooldown {
        cooldown: Duration,
        responder: oneshot::Sender<()>,
    },
    ListCameras {
        responder: oneshot::Sender<Vec<CameraConfig>>,
    },
    ActiveMonitors {
        responder: oneshot::Sender<usize>,
    },
    Shutdown {
        responder: oneshot::Sender<()>,
    },
}

/// Owns every running camera monitor. Commands are handled one at a time,
/// which keeps registrations and removals mutually exclusive while the
/// monitors themselves keep running in their own tasks.
pub struct MonitorSupervisor {
    monitors: HashMap<String, MonitorEntry>,
    defaults: MonitorSettings,
    stop_grace: Duration,
    sampler_factory: Arc<dyn SamplerFactory>,
    inference: InferenceService,
    board: Arc<StatusBoard>,
}

impl MonitorSupervisor {
    pub fn new(
        defaults: MonitorSettings,
        stop_grace: Duration,
        sampler_factory: Arc<dyn SamplerFactory>,
        inference: InferenceService,
        board: Arc<StatusBoard>,
    ) -> Self {
        Self {
            monitors: HashMap::new(),
            defaults,
            stop_grace,
            sampler_factory,
            inference,
            board,
        }
    }

    /// Returns `false` once the supervisor should stop taking commands.
    pub async fn handle_command(&mut self, command: SchedulerCommand) -> bool {
        match command {
            SchedulerCommand::Register { camera, responder } => {
                let replaced = self.register(camera).await;
                let _ = responder.send(replaced);
            }
            SchedulerCommand::Deregister {
                camera_id,
                responder,
            } => {
                let removed = self.deregister(&camera_id).await;
                let _ = responder.send(removed);
            }
            SchedulerCommand::UpdateSampleInterval {
                camera_id,
                sample_interval,
                responder,
            } => {
                let updated = self.update_sample_interval(&camera_id, sample_interval);
                let _ = responder.send(updated);
            }
            SchedulerCommand::UpdateCooldown {
                cooldown,
                responder,
            } => {
                self.update_cooldown(cooldown);
                let _ = responder.send(());
            }
            SchedulerCommand::ListCameras { responder } => {
                let mut cameras: Vec<CameraConfig> = self
                    .monitors
                    .values()
                    .map(|entry| entry.camera.clone())
                    .collect();
                cameras.sort_by(|a, b| a.camera_id().cmp(b.camera_id()));
                let _ = responder.send(cameras);
            }
            SchedulerCommand::ActiveMonitors { responder } => {
                let _ = responder.send(self.active_monitors());
            }
            SchedulerCommand::Shutdown { responder } => {
                self.stop_all().await;
                let _ = responder.send(());
                return false;
            }
        }
        true
    }

    /// Starts a monitor for `camera`. An existing monitor with the same id is
    /// fully stopped first; returns whether one was replaced.
    pub async fn register(&mut self, camera: CameraConfig) -> bool {
        let camera_id = camera.camera_id().to_string();
        let replaced = match self.monitors.remove(&camera_id) {
            Some(old) => {
                debug!("Replacing monitor for {}", camera_id);
                stop_entry(old, self.stop_grace, &self.board).await;
                true
            }
            None => false,
        };

        let settings = MonitorSettings {
            sample_interval: camera.sample_interval(),
            ..self.defaults.clone()
        };
        let (settings_tx, settings_rx) = watch::channel(settings);
        let cancel_token = CancellationToken::new();
        let monitor = CameraMonitor::new(
            camera.clone(),
            self.sampler_factory.clone(),
            self.inference.clone(),
            self.board.clone(),
            settings_rx,
        );
        let task = tokio::spawn(monitor.run(cancel_token.clone()));

        info!(
            "Registered camera {} ({})",
            camera_id,
            camera.source_uri()
        );
        self.monitors.insert(
            camera_id,
            MonitorEntry {
                camera,
                settings_tx,
                cancel_token,
                task,
            },
        );
        replaced
    }

    pub async fn deregister(&mut self, camera_id: &str) -> bool {
        match self.monitors.remove(camera_id) {
            Some(entry) => {
                stop_entry(entry, self.stop_grace, &self.board).await;
                info!("Deregistered camera {}", camera_id);
                true
            }
            None => {
                debug!("Deregister of unknown camera {} ignored", camera_id);
                false
            }
        }
    }

    pub fn update_sample_interval(
        &mut self,
        camera_id: &str,
        sample_interval: Duration,
    ) -> Result<bool, ConfigError> {
        let Some(entry) = self.monitors.get_mut(camera_id) else {
            return Ok(false);
        };
        entry.camera = entry.camera.clone().with_sample_interval(sample_interval)?;
        entry
            .settings_tx
            .send_modify(|settings| settings.sample_interval = sample_interval);
        Ok(true)
    }

    pub fn update_cooldown(&mut self, cooldown: Duration) {
        self.defaults.cooldown = cooldown;
        for entry in self.monitors.values() {
            entry
                .settings_tx
                .send_modify(|settings| settings.cooldown = cooldown);
        }
        info!("Cooldown set to {:?} for {} cameras", cooldown, self.monitors.len());
    }

    pub fn active_monitors(&self) -> usize {
        self.monitors
            .values()
            .filter(|entry| !entry.task.is_finished())
            .count()
    }

    pub async fn stop_all(&mut self) {
        let entries: Vec<MonitorEntry> = self.monitors.drain().map(|(_, entry)| entry).collect();
        let stop_grace = self.stop_grace;
        let board: &StatusBoard = &self.board;
        let stops = entries
            .into_iter()
            .map(|entry| stop_entry(entry, stop_grace, board));
        futures::future::join_all(stops).await;
    }
}

/// Cancels a monitor and waits up to `stop_grace` for it to wind down before
/// aborting the task outright. The camera reads as unsampled afterwards.
async fn stop_entry(entry: MonitorEntry, stop_grace: Duration, board: &StatusBoard) {
    let MonitorEntry {
        camera,
        cancel_token,
        mut task,
        ..
    } = entry;
    cancel_token.cancel();
    if tokio::time::timeout(stop_grace, &mut task).await.is_err() {
        warn!(
            "Monitor for {} did not stop within {:?}, aborting",
            camera.camera_id(),
            stop_grace
        );
        task.abort();
        let _ = task.await;
    }
    board.forget(camera.camera_id());
}
