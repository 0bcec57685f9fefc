use crate::common::CameraStatusSnapshot;
use crate::status::StatusSink;
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;

/// Latest snapshot per camera plus a live feed of every published snapshot.
///
/// A camera missing from the board has not been sampled yet; callers must not
/// read that as SAFE.
pub struct StatusBoard {
    latest: RwLock<HashMap<String, CameraStatusSnapshot>>,
    updates_tx: broadcast::Sender<CameraStatusSnapshot>,
}

impl StatusBoard {
    pub fn new(capacity: usize) -> Self {
        let (updates_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            latest: RwLock::new(HashMap::new()),
            updates_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CameraStatusSnapshot> {
        self.updates_tx.subscribe()
    }

    pub fn snapshot(&self, camera_id: &str) -> Option<CameraStatusSnapshot> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(camera_id)
            .cloned()
    }

    pub fn snapshots(&self) -> BTreeMap<String, CameraStatusSnapshot> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, snapshot)| (id.clone(), snapshot.clone()))
            .collect()
    }

    /// Drops a removed camera so it reads as "not yet sampled" again.
    pub fn forget(&self, camera_id: &str) {
        self.latest
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(camera_id);
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new(64)
    }
}

impl StatusSink for StatusBoard {
    fn publish(&self, snapshot: CameraStatusSnapshot) {
        self.latest
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(snapshot.camera_id.clone(), snapshot.clone());
        // No subscribers is fine; the map above is the source of truth.
        let _ = self.updates_tx.send(snapshot);
    }
}
