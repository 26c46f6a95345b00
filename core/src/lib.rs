//! Real-time vehicle telemetry ingestion core.
//!
//! Binary frames arrive over a websocket, are decoded into fixed-width
//! records, denoised against the canonical per-vehicle state, emitted to the
//! host as flat render buffers and periodically snapshotted to local storage.

pub mod bridge;
pub mod connection;
pub mod math;
pub mod persistence;
pub mod prelude;
pub mod processing;
pub mod telemetry;
pub mod wire;

pub use bridge::{ConnectionStatus, HostCommand, HostEvent, HostHandle};
pub use connection::{launch, ConnectionManager};
pub use prelude::{PipelineConfig, PipelineError, PipelineResult};
pub use processing::{EntityRecord, FramePipeline, RenderBuffer};
