use serde::Serialize;
use std::sync::Mutex;

/// Shared counters for the ingestion pipeline.
pub struct PipelineMetrics {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub frames: usize,
    pub records: usize,
    pub suppressed: usize,
    pub saves_started: usize,
    pub saves_skipped: usize,
    pub save_failures: usize,
    pub reconnects: usize,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut MetricsSnapshot)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }

    pub fn record_frame(&self, records: usize, suppressed: usize) {
        self.update(|m| {
            m.frames += 1;
            m.records += records;
            m.suppressed += suppressed;
        });
    }

    pub fn record_save_started(&self) {
        self.update(|m| m.saves_started += 1);
    }

    pub fn record_save_skipped(&self) {
        self.update(|m| m.saves_skipped += 1);
    }

    pub fn record_save_failure(&self) {
        self.update(|m| m.save_failures += 1);
    }

    pub fn record_reconnect(&self) {
        self.update(|m| m.reconnects += 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().map(|m| *m).unwrap_or_default()
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
