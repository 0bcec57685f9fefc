use cctv_sentinel::config::Configuration;
use cctv_sentinel::error::AppError;
use cctv_sentinel::inference::{HttpInferenceGateway, InferenceServiceBuilder};
use cctv_sentinel::scheduler::MonitorScheduler;
use cctv_sentinel::status::spawn_log_reporter;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info};

fn init_logging(level: Level) -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let configuration = Configuration::load(config_path.as_deref())?;
    init_logging(configuration.log_level()?)?;

    let gateway = HttpInferenceGateway::new(
        &configuration.inference.endpoint,
        configuration.inference_timeout(),
    )?;
    info!("Using inference gateway at {}", gateway.endpoint());
    let inference = InferenceServiceBuilder::new(Arc::new(gateway))
        .timeout(configuration.inference_timeout())
        .build();

    let scheduler = MonitorScheduler::builder(inference)
        .configure(&configuration)
        .build()?;

    let reporter_cancel = CancellationToken::new();
    let reporter = spawn_log_reporter(scheduler.subscribe(), reporter_cancel.clone());

    for camera in configuration.camera_configs()? {
        scheduler.register(camera).await?;
    }
    info!(
        "Monitoring {} cameras, cooldown {:?}",
        scheduler.cameras().await?.len(),
        configuration.cooldown()
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");

    scheduler.shutdown().await?;
    reporter_cancel.cancel();
    let _ = reporter.await;
    Ok(())
}
