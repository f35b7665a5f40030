// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The shared realtime connection and its room-scoped fan-out.
//!
//! One [`SocketManager`] owns the single WebSocket for the whole app.
//! Screens never touch the transport: they join rooms and get broadcast
//! receivers back, and must leave on teardown so listeners do not outlive
//! navigation. On connection loss the manager reconnects with a bounded
//! retry and re-emits the join for every room still held.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use oficio_config::RealtimeConfig;
use oficio_core::OficioError;
use oficio_core::traits::realtime::{EventReceiver, RealtimeChannel};
use oficio_core::types::{ChatId, RealtimeEvent};

use crate::events::{self, Frame, chat_room, emitted, professional_room};

/// Capacity of each room's broadcast channel. A lagged receiver loses the
/// oldest events instead of stalling the read loop.
const ROOM_CAPACITY: usize = 64;

/// Outbound frame queue depth while the connection is (re)establishing.
const OUTBOUND_CAPACITY: usize = 256;

/// Manager for the single realtime connection.
///
/// Cloning is cheap and shares the same connection and room table.
#[derive(Clone)]
pub struct SocketManager {
    inner: Arc<Inner>,
}

struct Inner {
    outbound_tx: mpsc::Sender<Frame>,
    rooms: DashMap<String, broadcast::Sender<RealtimeEvent>>,
    cancel: CancellationToken,
}

impl SocketManager {
    /// Connects to the realtime server and spawns the connection driver.
    ///
    /// The first connection attempt must succeed; later drops are retried
    /// up to `reconnect_attempts` times with `reconnect_delay_ms` between
    /// attempts, re-joining all held rooms on success.
    pub async fn connect(config: &RealtimeConfig) -> Result<Self, OficioError> {
        let (ws, _) = connect_async(config.url.as_str()).await.map_err(|e| {
            OficioError::Realtime {
                message: format!("connecting to {}", config.url),
                source: Some(Box::new(e)),
            }
        })?;
        info!(url = config.url.as_str(), "realtime connected");

        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let inner = Arc::new(Inner {
            outbound_tx,
            rooms: DashMap::new(),
            cancel: CancellationToken::new(),
        });

        tokio::spawn(drive(
            ws,
            outbound_rx,
            Arc::clone(&inner),
            config.clone(),
        ));

        Ok(Self { inner })
    }

    /// Shuts the connection down. Pending room receivers see a closed channel.
    pub fn close(&self) {
        self.inner.cancel.cancel();
    }

    /// Joins a room: registers the local fan-out sender and emits the join
    /// event. Re-joining returns a fresh receiver on the same sender.
    async fn join_room(&self, room: String, event: &str, id: &str) -> Result<EventReceiver, OficioError> {
        let rx = self
            .inner
            .rooms
            .entry(room.clone())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe();

        self.send_frame(Frame::emit(event, id)).await?;
        debug!(room = room.as_str(), "joined realtime room");
        Ok(rx)
    }

    async fn send_frame(&self, frame: Frame) -> Result<(), OficioError> {
        self.inner
            .outbound_tx
            .send(frame)
            .await
            .map_err(|_| OficioError::Realtime {
                message: "realtime connection closed".to_string(),
                source: None,
            })
    }
}

#[async_trait]
impl RealtimeChannel for SocketManager {
    async fn join_chat(&self, chat_id: &ChatId) -> Result<EventReceiver, OficioError> {
        self.join_room(chat_room(chat_id), emitted::JOIN_CHAT, &chat_id.0)
            .await
    }

    async fn leave_chat(&self, chat_id: &ChatId) -> Result<(), OficioError> {
        if self.inner.rooms.remove(&chat_room(chat_id)).is_some() {
            self.send_frame(Frame::emit(emitted::LEAVE_CHAT, &chat_id.0))
                .await?;
            debug!(chat_id = %chat_id, "left realtime room");
        }
        Ok(())
    }

    async fn join_professional(&self, user_id: &str) -> Result<EventReceiver, OficioError> {
        self.join_room(
            professional_room(user_id),
            emitted::JOIN_PROFESSIONAL,
            user_id,
        )
        .await
    }
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Connection driver: pumps frames both ways, reconnecting on drops.
async fn drive(
    mut ws: WsStream,
    mut outbound_rx: mpsc::Receiver<Frame>,
    inner: Arc<Inner>,
    config: RealtimeConfig,
) {
    loop {
        pump(&mut ws, &mut outbound_rx, &inner).await;

        if inner.cancel.is_cancelled() {
            let _ = ws.close(None).await;
            info!("realtime connection closed");
            return;
        }

        // Connection dropped: bounded reconnect with rejoin.
        warn!("realtime connection lost, reconnecting");
        let mut attempts = 0u32;
        ws = loop {
            attempts += 1;
            tokio::select! {
                _ = inner.cancel.cancelled() => return,
                _ = tokio::time::sleep(std::time::Duration::from_millis(config.reconnect_delay_ms)) => {}
            }

            match connect_async(config.url.as_str()).await {
                Ok((ws, _)) => {
                    info!(attempts, "realtime reconnected");
                    break ws;
                }
                Err(e) if attempts >= config.reconnect_attempts => {
                    error!(error = %e, attempts, "realtime reconnect attempts exhausted");
                    inner.cancel.cancel();
                    return;
                }
                Err(e) => {
                    warn!(error = %e, attempt = attempts, "realtime reconnect failed");
                }
            }
        };

        // Snapshot the room keys first: the map guard must not be held
        // across the sends.
        let rooms: Vec<String> = inner.rooms.iter().map(|e| e.key().clone()).collect();
        for room in rooms {
            if let Some(frame) = rejoin_frame(&room)
                && let Err(e) = send_text(&mut ws, &frame).await
            {
                warn!(room = room.as_str(), error = %e, "rejoin emit failed");
            }
        }
    }
}

/// Runs one connection until it drops or the manager is cancelled.
async fn pump(ws: &mut WsStream, outbound_rx: &mut mpsc::Receiver<Frame>, inner: &Inner) {
    loop {
        tokio::select! {
            _ = inner.cancel.cancelled() => return,

            frame = outbound_rx.recv() => {
                let Some(frame) = frame else { return };
                if let Err(e) = send_text(ws, &frame).await {
                    warn!(error = %e, "realtime send failed");
                    return;
                }
            }

            incoming = ws.next() => {
                match incoming {
                    Some(Ok(WsMessage::Text(text))) => handle_text(text.as_str(), inner),
                    Some(Ok(WsMessage::Close(_))) | None => return,
                    Some(Ok(_)) => {} // binary, ping/pong handled by tungstenite
                    Some(Err(e)) => {
                        warn!(error = %e, "realtime read error");
                        return;
                    }
                }
            }
        }
    }
}

/// Decodes one inbound text frame and fans it out to its room.
///
/// Unknown events, malformed payloads, and rooms nobody joined are all
/// dropped here; nothing propagates.
fn handle_text(text: &str, inner: &Inner) {
    let frame: Frame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            debug!(error = %e, "unparseable realtime frame, dropping");
            return;
        }
    };

    let Some(event) = events::decode(&frame) else {
        return;
    };
    let Some(room) = events::route(&frame, &event) else {
        debug!(event = frame.event.as_str(), "unroutable realtime event, dropping");
        return;
    };

    if let Some(sender) = inner.rooms.get(&room) {
        // Send only fails when every receiver is gone; the room entry is
        // then stale and harmless until leave removes it.
        let _ = sender.send(event);
    } else {
        debug!(room = room.as_str(), "event for unjoined room, dropping");
    }
}

async fn send_text(
    ws: &mut WsStream,
    frame: &Frame,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let text = match serde_json::to_string(frame) {
        Ok(text) => text,
        Err(e) => {
            warn!(event = frame.event.as_str(), error = %e, "frame encode failed, dropping");
            return Ok(());
        }
    };
    ws.send(WsMessage::Text(text.into())).await
}

/// Rebuilds the join emit for a held room key after a reconnect.
fn rejoin_frame(room: &str) -> Option<Frame> {
    if let Some(chat_id) = room.strip_prefix("chat:") {
        return Some(Frame::emit(emitted::JOIN_CHAT, chat_id));
    }
    if let Some(user_id) = room.strip_prefix("professional:") {
        return Some(Frame::emit(emitted::JOIN_PROFESSIONAL, user_id));
    }
    None
}
