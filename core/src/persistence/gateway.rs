use crate::persistence::snapshot::{Snapshot, SnapshotStore};
use crate::persistence::{PersistenceError, PersistenceResult};
use crate::processing::EntityRecord;
use crate::telemetry::{LogManager, PipelineMetrics};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::{self, JoinHandle};

/// Result of a save trigger.
#[derive(Debug)]
pub enum SaveOutcome {
    /// A write is running; the handle resolves once the guard is released.
    Started(JoinHandle<()>),
    /// Another write held the guard; nothing was queued.
    Skipped,
}

impl SaveOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, SaveOutcome::Started(_))
    }
}

/// Clears the in-flight flag when the background write ends, including on panic.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Single-writer, skip-on-busy snapshot writer.
pub struct PersistenceGateway {
    store: Arc<dyn SnapshotStore>,
    saving: Arc<AtomicBool>,
    metrics: Arc<PipelineMetrics>,
    logger: LogManager,
}

impl PersistenceGateway {
    pub fn new(store: Arc<dyn SnapshotStore>, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            store,
            saving: Arc::new(AtomicBool::new(false)),
            metrics,
            logger: LogManager::new("persistence"),
        }
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// Writes a fresh snapshot unless one is already in flight.
    ///
    /// `collect` runs only after the guard is acquired. Must be called from
    /// within a Tokio runtime.
    pub fn trigger<F>(&self, collect: F, now_ms: u64) -> SaveOutcome
    where
        F: FnOnce() -> Vec<EntityRecord>,
    {
        if self
            .saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.metrics.record_save_skipped();
            self.logger.detail("save in progress, skipping cycle");
            return SaveOutcome::Skipped;
        }

        let in_flight = InFlight(self.saving.clone());
        let snapshot = Snapshot::latest(collect(), now_ms);
        let store = self.store.clone();
        let metrics = self.metrics.clone();
        let logger = self.logger;
        self.metrics.record_save_started();

        let handle = task::spawn_blocking(move || {
            let _in_flight = in_flight;
            match store.put_latest(&snapshot) {
                Ok(()) => logger.detail(&format!(
                    "snapshot written ({} entities)",
                    snapshot.data.len()
                )),
                Err(err) => {
                    metrics.record_save_failure();
                    logger.error(&format!("snapshot write failed: {}", err));
                }
            }
        });
        SaveOutcome::Started(handle)
    }

    pub async fn load_latest(&self) -> PersistenceResult<Option<Snapshot>> {
        let store = self.store.clone();
        task::spawn_blocking(move || store.load_latest())
            .await
            .map_err(|err| PersistenceError::Aborted(err.to_string()))?
    }
}
