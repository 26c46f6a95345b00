use crate::generator::FeedConfig;
use anyhow::Context;
use fleetcore::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub url: String,
    pub db_path: PathBuf,
    /// Stop after this many rendered frames; runs until Ctrl+C when unset.
    pub max_frames: Option<usize>,
    pub pipeline: PipelineConfig,
    pub feed: FeedConfig,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:9000/socket".to_string(),
            db_path: PathBuf::from("tools/data/vehicles.redb"),
            max_frames: None,
            pipeline: PipelineConfig::default(),
            feed: FeedConfig::default(),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_args(url: String, db_path: PathBuf, max_frames: Option<usize>) -> Self {
        Self {
            url,
            db_path,
            max_frames,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.pipeline
            .validate()
            .context("validating pipeline section")?;
        self.feed.validate().context("validating feed section")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_keeps_pipeline_defaults() {
        let cfg = WorkflowConfig::from_args("ws://feed/socket".into(), "fleet.redb".into(), Some(3));
        assert_eq!(cfg.pipeline, PipelineConfig::default());
        assert_eq!(cfg.max_frames, Some(3));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"url: ws://10.0.0.5:9000/socket\ndb_path: /tmp/fleet.redb\npipeline:\n  reconnect_base_ms: 250\nfeed:\n  vehicles: 16\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.url, "ws://10.0.0.5:9000/socket");
        assert_eq!(cfg.pipeline.reconnect_base_ms, 250);
        assert_eq!(cfg.pipeline.reconnect_max_ms, 30_000);
        assert_eq!(cfg.feed.vehicles, 16);
    }

    #[test]
    fn config_load_rejects_bad_pipeline_section() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"pipeline:\n  heartbeat_interval_ms: 0\n").unwrap();
        let path = temp.into_temp_path();
        assert!(WorkflowConfig::load(&path).is_err());
    }
}
