use crate::bridge::message::{ConnectionStatus, HostCommand, HostEvent};
use crate::prelude::{PipelineError, PipelineResult};
use crate::processing::RenderBuffer;
use tokio::sync::mpsc;

/// Host side of the bridge: sends commands, receives events.
pub struct HostHandle {
    commands: mpsc::Sender<HostCommand>,
    events: mpsc::Receiver<HostEvent>,
}

/// Pipeline side of the bridge.
pub struct PipelineEndpoint {
    commands: mpsc::Receiver<HostCommand>,
    events: mpsc::Sender<HostEvent>,
}

/// Builds the bounded command-in / event-out channel pair.
pub fn host_channel(capacity: usize) -> (HostHandle, PipelineEndpoint) {
    let (command_tx, command_rx) = mpsc::channel(capacity);
    let (event_tx, event_rx) = mpsc::channel(capacity);
    (
        HostHandle {
            commands: command_tx,
            events: event_rx,
        },
        PipelineEndpoint {
            commands: command_rx,
            events: event_tx,
        },
    )
}

impl HostHandle {
    pub async fn send(&self, command: HostCommand) -> PipelineResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PipelineError::ChannelClosed)
    }

    pub async fn next_event(&mut self) -> Option<HostEvent> {
        self.events.recv().await
    }

    pub fn into_parts(self) -> (mpsc::Sender<HostCommand>, mpsc::Receiver<HostEvent>) {
        (self.commands, self.events)
    }
}

impl PipelineEndpoint {
    /// `None` once every host sender is gone.
    pub async fn recv(&mut self) -> Option<HostCommand> {
        self.commands.recv().await
    }

    /// Next already-queued command, without waiting.
    pub fn try_recv(&mut self) -> Option<HostCommand> {
        self.commands.try_recv().ok()
    }

    pub async fn emit(&self, event: HostEvent) -> PipelineResult<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| PipelineError::ChannelClosed)
    }

    pub async fn status(&self, status: ConnectionStatus) -> PipelineResult<()> {
        self.emit(HostEvent::Status { payload: status }).await
    }

    pub async fn render(&self, buffer: RenderBuffer) -> PipelineResult<()> {
        let count = buffer.rows();
        self.emit(HostEvent::UpdateRender { buffer, count }).await
    }
}
