use crate::persistence::{PersistenceGateway, SaveOutcome, SnapshotStore};
use crate::prelude::{now_millis, PipelineConfig};
use crate::processing::denoise::{Decision, DenoiseEngine};
use crate::processing::render::{RenderBuffer, RenderBufferBuilder};
use crate::processing::store::CanonicalStore;
use crate::telemetry::{LogManager, PipelineMetrics};
use crate::wire::decode_frame;
use std::sync::Arc;

/// Decode -> denoise -> store -> render, plus the snapshot trigger.
///
/// Owns the canonical store; nothing else holds a mutable reference to it.
pub struct FramePipeline {
    store: CanonicalStore,
    engine: DenoiseEngine,
    persistence: Option<PersistenceGateway>,
    metrics: Arc<PipelineMetrics>,
    logger: LogManager,
}

impl FramePipeline {
    pub fn new(config: &PipelineConfig, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            store: CanonicalStore::new(),
            engine: DenoiseEngine::new(config.move_threshold),
            persistence: None,
            metrics,
            logger: LogManager::new("pipeline"),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.persistence = Some(PersistenceGateway::new(store, self.metrics.clone()));
        self
    }

    pub fn store(&self) -> &CanonicalStore {
        &self.store
    }

    pub fn persistence(&self) -> Option<&PersistenceGateway> {
        self.persistence.as_ref()
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    pub fn ingest(&mut self, frame: &[u8]) -> RenderBuffer {
        self.ingest_at(frame, now_millis())
    }

    /// Processes one frame as of `now_ms` and returns its render buffer.
    pub fn ingest_at(&mut self, frame: &[u8], now_ms: u64) -> RenderBuffer {
        let decoder = decode_frame(frame);
        if decoder.trailing() > 0 {
            self.logger.detail(&format!(
                "dropping {} trailing bytes of a partial record",
                decoder.trailing()
            ));
        }

        let mut builder = RenderBufferBuilder::with_rows(decoder.len());
        let mut suppressed = 0;
        for fix in decoder {
            let (decision, record) = self.engine.apply(&mut self.store, &fix, now_ms);
            if decision == Decision::Suppressed {
                suppressed += 1;
            }
            builder.push(record);
        }

        self.metrics.record_frame(builder.rows(), suppressed);
        builder.finish()
    }

    /// Snapshots the store unless a save is in flight. `None` without a configured store.
    pub fn trigger_save(&self) -> Option<SaveOutcome> {
        let gateway = self.persistence.as_ref()?;
        Some(gateway.trigger(|| self.store.snapshot_values(), now_millis()))
    }
}
