use crate::common::{CameraStatusSnapshot, SnapshotStatus};
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Logs every snapshot published on `updates_rx` until cancelled or the
/// board goes away.
pub fn spawn_log_reporter(
    updates_rx: broadcast::Receiver<CameraStatusSnapshot>,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut updates = BroadcastStream::new(updates_rx);
        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                update = updates.next() => match update {
                    Some(Ok(snapshot)) => log_snapshot(&snapshot),
                    Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                        warn!("Status reporter lagged, skipped {} snapshots", skipped);
                    }
                    None => break,
                },
            }
        }
    })
}

fn log_snapshot(snapshot: &CameraStatusSnapshot) {
    let labels = snapshot
        .labels
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    match snapshot.status {
        SnapshotStatus::Alert => warn!(
            camera_id = %snapshot.camera_id,
            "ALERT: detected [{}] at {}", labels, snapshot.updated_at
        ),
        status if status.is_error() => warn!(
            camera_id = %snapshot.camera_id,
            "{} at {}", snapshot.status, snapshot.updated_at
        ),
        _ => info!(
            camera_id = %snapshot.camera_id,
            "{} [{}] at {}", snapshot.status, labels, snapshot.updated_at
        ),
    }
}
