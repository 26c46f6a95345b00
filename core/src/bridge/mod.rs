pub mod channel;
pub mod message;

pub use channel::{host_channel, HostHandle, PipelineEndpoint};
pub use message::{ConnectionStatus, HostCommand, HostEvent};
