use crate::generator::{FeedConfig, FleetGenerator};
use anyhow::Context;
use fleetcore::wire::HEARTBEAT_FRAME;
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time;
use warp::ws::{Message, WebSocket, Ws};
use warp::Filter;

/// Binds the websocket feed at `/socket` and returns its address and server future.
pub fn bind_feed(
    config: FeedConfig,
) -> anyhow::Result<(SocketAddr, impl Future<Output = ()> + Send + 'static)> {
    config.validate()?;
    let bind = config.bind;
    let config_filter = warp::any().map(move || config.clone());

    let route = warp::path("socket")
        .and(warp::ws())
        .and(config_filter)
        .map(|ws: Ws, config: FeedConfig| {
            ws.on_upgrade(move |socket| stream_fleet(socket, config))
        });

    warp::serve(route)
        .try_bind_ephemeral(bind)
        .with_context(|| format!("binding feed on {}", bind))
}

async fn stream_fleet(socket: WebSocket, config: FeedConfig) {
    let mut generator = match FleetGenerator::new(config.clone()) {
        Ok(generator) => generator,
        Err(err) => {
            warn!("[feed] generator rejected config: {:#}", err);
            return;
        }
    };
    info!("[feed] client connected, streaming {} vehicles", config.vehicles);

    let (mut tx, mut rx) = socket.split();
    let mut ticker = time::interval(Duration::from_millis(config.interval_ms.max(1)));
    let mut sent = 0usize;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if config.close_after.map_or(false, |limit| sent >= limit) {
                    info!("[feed] dropping client after {} frames", sent);
                    break;
                }
                if tx.send(Message::binary(generator.next_frame())).await.is_err() {
                    break;
                }
                sent += 1;
            }
            incoming = rx.next() => match incoming {
                Some(Ok(message)) if message.is_close() => break,
                Some(Ok(message)) if message.as_bytes() == &HEARTBEAT_FRAME[..] => {
                    debug!("[feed] heartbeat received");
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!("[feed] client error: {}", err);
                    break;
                }
                None => break,
            },
        }
    }
    tx.close().await.ok();
    info!("[feed] client disconnected after {} frames", sent);
}
