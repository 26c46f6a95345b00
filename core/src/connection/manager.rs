use crate::bridge::{ConnectionStatus, HostCommand, HostEvent, PipelineEndpoint};
use crate::connection::backoff::Backoff;
use crate::prelude::{PipelineConfig, PipelineError, PipelineResult};
use crate::persistence::SaveOutcome;
use crate::processing::FramePipeline;
use crate::telemetry::LogManager;
use crate::wire::HEARTBEAT_FRAME;
use futures::{future, SinkExt, StreamExt};
use std::pin::Pin;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior, Sleep};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    /// Terminal; reached only through an explicit shutdown.
    Stopped,
}

enum Wake {
    Command(Option<HostCommand>),
    Socket(Option<Result<Message, WsError>>),
    Heartbeat,
    Reconnect,
}

enum Flow {
    Continue,
    Stop,
}

/// Owns the socket lifecycle and drives frames through the pipeline.
pub struct ConnectionManager {
    url: String,
    heartbeat_period: Duration,
    connect_timeout: Duration,
    backoff: Backoff,
    state: ConnectionState,
    socket: Option<Socket>,
    heartbeat: Option<Interval>,
    reconnect: Option<Pin<Box<Sleep>>>,
    /// Most recently started snapshot write.
    in_flight: Option<JoinHandle<()>>,
    /// A trigger was skipped since `in_flight` started.
    save_pending: bool,
    pipeline: FramePipeline,
    endpoint: PipelineEndpoint,
    logger: LogManager,
}

async fn next_message(socket: &mut Option<Socket>) -> Option<Result<Message, WsError>> {
    match socket {
        Some(socket) => socket.next().await,
        None => future::pending().await,
    }
}

async fn next_tick(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending().await,
    }
}

async fn reconnect_due(reconnect: &mut Option<Pin<Box<Sleep>>>) {
    match reconnect {
        Some(sleep) => sleep.as_mut().await,
        None => future::pending().await,
    }
}

impl ConnectionManager {
    pub fn new(
        url: impl Into<String>,
        config: &PipelineConfig,
        pipeline: FramePipeline,
        endpoint: PipelineEndpoint,
    ) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            url: url.into(),
            heartbeat_period: config.heartbeat_interval(),
            connect_timeout: config.connect_timeout(),
            backoff: Backoff::from_config(config),
            state: ConnectionState::Disconnected,
            socket: None,
            heartbeat: None,
            reconnect: None,
            in_flight: None,
            save_pending: false,
            pipeline,
            endpoint,
            logger: LogManager::new("connection"),
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Serves host commands and socket traffic until shutdown; hands back the pipeline.
    pub async fn run(mut self) -> PipelineResult<FramePipeline> {
        loop {
            let wake = tokio::select! {
                command = self.endpoint.recv() => Wake::Command(command),
                message = next_message(&mut self.socket) => Wake::Socket(message),
                _ = next_tick(&mut self.heartbeat) => Wake::Heartbeat,
                _ = reconnect_due(&mut self.reconnect) => Wake::Reconnect,
            };

            match self.handle(wake).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => break,
                Err(PipelineError::ChannelClosed) => {
                    self.logger.warn("host event channel closed, stopping");
                    self.drain_commands();
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        self.shutdown().await;
        Ok(self.pipeline)
    }

    async fn handle(&mut self, wake: Wake) -> PipelineResult<Flow> {
        match wake {
            Wake::Command(Some(HostCommand::Start)) => self.connect().await?,
            Wake::Command(Some(HostCommand::ForceSave)) => self.save(),
            Wake::Command(Some(HostCommand::Shutdown)) | Wake::Command(None) => {
                return Ok(Flow::Stop)
            }
            Wake::Socket(Some(Ok(Message::Binary(frame)))) => {
                let buffer = self.pipeline.ingest(&frame);
                let emitted = self.endpoint.render(buffer).await;
                self.save();
                emitted?;
            }
            Wake::Socket(Some(Ok(Message::Close(frame)))) => {
                self.logger
                    .record(&format!("server closed the socket ({:?})", frame));
                self.on_close().await?;
            }
            Wake::Socket(Some(Ok(other))) => {
                self.logger
                    .detail(&format!("ignoring non-binary message ({} bytes)", other.len()));
            }
            Wake::Socket(Some(Err(err))) => {
                // A read error ends the stream; the close path below does the recovery.
                self.logger.error(&format!("socket error: {}", err));
                self.on_close().await?;
            }
            Wake::Socket(None) => self.on_close().await?,
            Wake::Heartbeat => self.send_heartbeat().await,
            Wake::Reconnect => {
                self.reconnect = None;
                self.logger.record(&format!(
                    "reconnecting (attempt {})",
                    self.backoff.attempt()
                ));
                self.connect().await?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Replaces any existing socket with a fresh connection.
    async fn connect(&mut self) -> PipelineResult<()> {
        self.reconnect = None;
        self.close_socket().await;
        self.state = ConnectionState::Connecting;
        self.endpoint.status(ConnectionStatus::Connecting).await?;

        match time::timeout(self.connect_timeout, connect_async(self.url.as_str())).await {
            Ok(Ok((socket, _response))) => self.on_open(socket).await,
            Ok(Err(err)) => {
                self.logger
                    .error(&format!("connect to {} failed: {}", self.url, err));
                self.on_close().await
            }
            Err(_) => {
                self.logger.error(&format!(
                    "connect to {} timed out after {} ms",
                    self.url,
                    self.connect_timeout.as_millis()
                ));
                self.on_close().await
            }
        }
    }

    async fn on_open(&mut self, socket: Socket) -> PipelineResult<()> {
        self.logger.record(&format!("connected to {}", self.url));
        self.socket = Some(socket);
        self.backoff.reset();
        self.start_heartbeat();
        self.state = ConnectionState::Connected;
        self.endpoint.status(ConnectionStatus::Connected).await
    }

    async fn on_close(&mut self) -> PipelineResult<()> {
        self.socket = None;
        self.heartbeat = None;
        self.endpoint.status(ConnectionStatus::Disconnected).await?;
        self.schedule_reconnect().await
    }

    async fn schedule_reconnect(&mut self) -> PipelineResult<()> {
        let delay = self.backoff.next_delay();
        let attempt = self.backoff.attempt();
        self.reconnect = Some(Box::pin(time::sleep(delay)));
        self.state = ConnectionState::Reconnecting;
        self.pipeline.metrics().record_reconnect();
        self.logger.record(&format!(
            "socket closed, reconnect attempt {} in {} ms",
            attempt,
            delay.as_millis()
        ));
        self.endpoint
            .emit(HostEvent::ReconnectScheduled {
                attempt,
                delay_ms: delay.as_millis() as u64,
            })
            .await
    }

    fn start_heartbeat(&mut self) {
        let period = self.heartbeat_period;
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.heartbeat = Some(interval);
    }

    async fn send_heartbeat(&mut self) {
        if let Some(socket) = self.socket.as_mut() {
            if let Err(err) = socket.send(Message::Binary(HEARTBEAT_FRAME.to_vec())).await {
                self.logger.error(&format!("heartbeat send failed: {}", err));
            }
        }
    }

    fn save(&mut self) {
        match self.pipeline.trigger_save() {
            Some(SaveOutcome::Started(handle)) => {
                self.in_flight = Some(handle);
                self.save_pending = false;
            }
            Some(SaveOutcome::Skipped) => self.save_pending = true,
            None => self
                .logger
                .detail("no snapshot store configured, save ignored"),
        }
    }

    /// Honours commands the host queued before its event side went away.
    fn drain_commands(&mut self) {
        while let Some(command) = self.endpoint.try_recv() {
            if command == HostCommand::ForceSave {
                self.save();
            }
        }
    }

    /// Waits for the running write; rewrites once if a trigger was skipped meanwhile.
    async fn flush_saves(&mut self) {
        self.await_in_flight().await;
        if self.save_pending {
            self.save();
            self.await_in_flight().await;
        }
    }

    async fn await_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            if let Err(err) = handle.await {
                self.logger.error(&format!("snapshot write aborted: {}", err));
            }
        }
    }

    /// Closes the current socket without scheduling a reconnect.
    async fn close_socket(&mut self) {
        self.heartbeat = None;
        if let Some(mut socket) = self.socket.take() {
            if let Err(err) = socket.close(None).await {
                self.logger.detail(&format!("closing previous socket: {}", err));
            }
        }
    }

    async fn shutdown(&mut self) {
        self.reconnect = None;
        self.close_socket().await;
        self.flush_saves().await;
        self.state = ConnectionState::Stopped;
        self.endpoint.status(ConnectionStatus::Disconnected).await.ok();
        self.logger.record("pipeline stopped");
    }
}
