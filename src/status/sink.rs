use crate::common::CameraStatusSnapshot;

/// Receives the snapshot of every finished cycle, in cycle order per camera.
pub trait StatusSink: Send + Sync {
    fn publish(&self, snapshot: CameraStatusSnapshot);
}
