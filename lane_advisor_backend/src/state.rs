use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use bike_lanes::{LaneCollection, SelectionOptions};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::watch;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Enhanced from the configured dataset.
    Dataset,
    /// Built-in sample, after the dataset failed to load.
    Sample,
}

/// One enhancement result. Never mutated; a reload publishes a new one.
#[derive(Debug)]
pub struct LaneSnapshot {
    pub lanes: LaneCollection,
    pub source: DataSource,
    pub loaded_at_ms: i64,
}

impl LaneSnapshot {
    pub fn new(lanes: LaneCollection, source: DataSource) -> Self {
        Self { lanes, source, loaded_at_ms: now_ms() }
    }
}

pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Holds the current snapshot. Publishing is the completion signal: anyone
/// waiting in [`LaneStore::ready`] wakes up, even if they started waiting
/// before the dataset fetch finished.
#[derive(Clone)]
pub struct LaneStore {
    tx: Arc<watch::Sender<Option<Arc<LaneSnapshot>>>>,
}

impl Default for LaneStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LaneStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn publish(&self, snapshot: LaneSnapshot) {
        let dups = snapshot.lanes.duplicate_ids();
        if !dups.is_empty() {
            tracing::warn!("{} lane ids appear more than once, e.g. {}", dups.len(), dups[0]);
        }
        tracing::info!(
            "lane data ready: {} lanes from {:?}",
            snapshot.lanes.len(),
            snapshot.source
        );
        self.tx.send_replace(Some(Arc::new(snapshot)));
    }

    /// Snapshot if loaded, without waiting.
    pub fn current(&self) -> Option<Arc<LaneSnapshot>> {
        Option::clone(&self.tx.borrow())
    }

    pub async fn ready(&self) -> Option<Arc<LaneSnapshot>> {
        let mut rx = self.tx.subscribe();
        let snapshot = rx.wait_for(|s| s.is_some()).await.ok()?;
        Option::clone(&snapshot)
    }
}

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub store: LaneStore,
    pub selection: SelectionOptions,
    /// Only the test-mode branches of the selector draw from this.
    pub rng: Arc<Mutex<StdRng>>,
}

impl AppState {
    pub fn new(selection: SelectionOptions, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            store: LaneStore::new(),
            selection,
            rng: Arc::new(Mutex::new(rng)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bike_lanes::sample_lanes;

    #[tokio::test]
    async fn test_waiters_wake_on_publish() {
        let store = LaneStore::new();
        assert!(store.current().is_none());

        let waiter = {
            let store = store.clone();
            tokio::spawn(async move { store.ready().await })
        };
        tokio::task::yield_now().await;

        store.publish(LaneSnapshot::new(sample_lanes(), DataSource::Sample));
        let snapshot = waiter.await.unwrap().expect("snapshot");
        assert_eq!(snapshot.lanes.len(), 2);
        assert_eq!(snapshot.source, DataSource::Sample);
    }

    #[tokio::test]
    async fn test_republish_replaces_snapshot() {
        let store = LaneStore::new();
        store.publish(LaneSnapshot::new(sample_lanes(), DataSource::Sample));
        let first = store.current().unwrap();

        store.publish(LaneSnapshot::new(LaneCollection::default(), DataSource::Dataset));
        let second = store.ready().await.unwrap();

        assert_eq!(first.lanes.len(), 2);
        assert!(second.lanes.is_empty());
        assert!(!Arc::ptr_eq(&first, &second));
    }
}
