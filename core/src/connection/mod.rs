pub mod backoff;
pub mod manager;

pub use backoff::Backoff;
pub use manager::{ConnectionManager, ConnectionState};

use crate::bridge::{host_channel, HostHandle};
use crate::persistence::SnapshotStore;
use crate::prelude::{PipelineConfig, PipelineResult};
use crate::processing::FramePipeline;
use crate::telemetry::PipelineMetrics;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Spawns the pipeline task for `url` and returns the host side of its bridge.
///
/// The task idles until the host sends `START`.
pub fn launch(
    url: impl Into<String>,
    config: &PipelineConfig,
    store: Option<Arc<dyn SnapshotStore>>,
) -> PipelineResult<(HostHandle, JoinHandle<PipelineResult<FramePipeline>>)> {
    let mut pipeline = FramePipeline::new(config, Arc::new(PipelineMetrics::new()));
    if let Some(store) = store {
        pipeline = pipeline.with_store(store);
    }
    let (host, endpoint) = host_channel(config.channel_capacity);
    let manager = ConnectionManager::new(url, config, pipeline, endpoint)?;
    Ok((host, tokio::spawn(manager.run())))
}
