use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use fleetcore::persistence::{RedbSnapshotStore, SnapshotStore};
use fleetcore::telemetry::MetricsSnapshot;
use fleetcore::{ConnectionStatus, HostCommand, HostEvent};
use log::{debug, info};
use std::fs;
use std::future::Future;
use std::sync::Arc;

/// What a host session observed.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub frames: usize,
    pub last_row_count: usize,
    pub reconnects_seen: usize,
    pub entities: usize,
    pub persisted_entities: Option<usize>,
    pub metrics: MetricsSnapshot,
}

/// Plays the host role: starts the pipeline, consumes its events and
/// requests a final save on the way out.
#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub async fn execute<S>(&self, shutdown: S) -> anyhow::Result<RunSummary>
    where
        S: Future<Output = ()>,
    {
        if let Some(parent) = self.config.db_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let store: Arc<dyn SnapshotStore> = Arc::new(
            RedbSnapshotStore::open(&self.config.db_path)
                .with_context(|| format!("opening {}", self.config.db_path.display()))?,
        );
        let (mut host, task) =
            fleetcore::launch(self.config.url.clone(), &self.config.pipeline, Some(store))
                .context("launching pipeline")?;

        host.send(HostCommand::Start)
            .await
            .context("sending START")?;

        let mut frames = 0usize;
        let mut last_row_count = 0usize;
        let mut reconnects_seen = 0usize;
        tokio::pin!(shutdown);

        loop {
            let event = tokio::select! {
                _ = &mut shutdown => break,
                event = host.next_event() => event,
            };
            match event {
                Some(HostEvent::UpdateRender { buffer, count }) => {
                    frames += 1;
                    last_row_count = count;
                    debug!("[host] frame {} -> {} rows", frames, buffer.rows());
                    if self.config.max_frames.map_or(false, |limit| frames >= limit) {
                        break;
                    }
                }
                Some(HostEvent::Status { payload }) => {
                    info!("[host] status {:?}", payload);
                    if payload == ConnectionStatus::Connected {
                        info!("[host] streaming from {}", self.config.url);
                    }
                }
                Some(HostEvent::ReconnectScheduled { attempt, delay_ms }) => {
                    reconnects_seen += 1;
                    info!("[host] reconnect #{} in {} ms", attempt, delay_ms);
                }
                None => break,
            }
        }

        host.send(HostCommand::ForceSave).await.ok();
        host.send(HostCommand::Shutdown).await.ok();
        // Keep reading so a pending emit cannot close the event side before the save lands.
        while let Some(event) = host.next_event().await {
            if let HostEvent::UpdateRender { count, .. } = event {
                last_row_count = count;
            }
        }

        let pipeline = task
            .await
            .context("joining pipeline task")?
            .context("pipeline task failed")?;

        let persisted_entities = match pipeline.persistence() {
            Some(gateway) => gateway
                .load_latest()
                .await
                .context("reading back the latest snapshot")?
                .map(|snapshot| snapshot.data.len()),
            None => None,
        };

        Ok(RunSummary {
            frames,
            last_row_count,
            reconnects_seen,
            entities: pipeline.store().len(),
            persisted_entities,
            metrics: pipeline.metrics().snapshot(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::bind_feed;
    use crate::generator::FeedConfig;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::time;

    #[tokio::test]
    async fn runner_executes_session_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let feed = FeedConfig {
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            interval_ms: 5,
            vehicles: 5,
            ..Default::default()
        };
        let (addr, server) = bind_feed(feed).unwrap();
        tokio::spawn(server);

        let cfg = WorkflowConfig::from_args(
            format!("ws://{}/socket", addr),
            dir.path().join("data").join("fleet.redb"),
            Some(3),
        );
        let runner = Runner::new(cfg);
        let summary = time::timeout(
            Duration::from_secs(10),
            runner.execute(futures::future::pending()),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(summary.frames, 3);
        assert_eq!(summary.last_row_count, 5);
        assert_eq!(summary.entities, 5);
        assert_eq!(summary.persisted_entities, Some(5));
        assert!(summary.metrics.frames >= 3);
    }
}
