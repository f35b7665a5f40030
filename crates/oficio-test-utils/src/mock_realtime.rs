// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock realtime channel for deterministic testing.
//!
//! `MockRealtime` implements `RealtimeChannel` with injectable events per
//! room and a record of every emitted join/leave for assertion in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast};

use oficio_core::OficioError;
use oficio_core::traits::realtime::{EventReceiver, RealtimeChannel};
use oficio_core::types::{ChatId, RealtimeEvent};

const ROOM_CAPACITY: usize = 64;

#[derive(Default)]
struct MockRooms {
    senders: HashMap<String, broadcast::Sender<RealtimeEvent>>,
    emitted: Vec<(String, String)>,
    fail_next: HashMap<String, usize>,
}

/// A scripted realtime channel for tests.
pub struct MockRealtime {
    rooms: Mutex<MockRooms>,
}

impl MockRealtime {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(MockRooms::default()),
        }
    }

    /// Makes the next call of `op` (`join_chat`, `leave_chat`,
    /// `join_professional`) fail. Stacks.
    pub async fn fail_next(&self, op: &str) {
        *self
            .rooms
            .lock()
            .await
            .fail_next
            .entry(op.to_string())
            .or_default() += 1;
    }

    /// Every (event, id) pair emitted so far, in order.
    pub async fn emitted(&self) -> Vec<(String, String)> {
        self.rooms.lock().await.emitted.clone()
    }

    /// Rooms currently joined.
    pub async fn joined_rooms(&self) -> Vec<String> {
        let rooms = self.rooms.lock().await;
        let mut keys: Vec<String> = rooms.senders.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Delivers an event into a chat room. Returns whether anyone was
    /// subscribed to receive it.
    pub async fn inject_chat_event(&self, chat_id: &ChatId, event: RealtimeEvent) -> bool {
        self.inject(&format!("chat:{chat_id}"), event).await
    }

    /// Delivers an event into a professional notification room.
    pub async fn inject_professional_event(&self, user_id: &str, event: RealtimeEvent) -> bool {
        self.inject(&format!("professional:{user_id}"), event).await
    }

    async fn inject(&self, room: &str, event: RealtimeEvent) -> bool {
        let rooms = self.rooms.lock().await;
        match rooms.senders.get(room) {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }

    async fn join(&self, op: &str, room: String, id: &str) -> Result<EventReceiver, OficioError> {
        let mut rooms = self.rooms.lock().await;
        check_failure(&mut rooms.fail_next, op)?;
        rooms.emitted.push((op.replace('_', "-"), id.to_string()));
        let rx = rooms
            .senders
            .entry(room)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe();
        Ok(rx)
    }
}

fn check_failure(fail_next: &mut HashMap<String, usize>, op: &str) -> Result<(), OficioError> {
    if let Some(remaining) = fail_next.get_mut(op) {
        if *remaining > 0 {
            *remaining -= 1;
            return Err(OficioError::Realtime {
                message: format!("mock {op} failure"),
                source: None,
            });
        }
    }
    Ok(())
}

impl Default for MockRealtime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeChannel for MockRealtime {
    async fn join_chat(&self, chat_id: &ChatId) -> Result<EventReceiver, OficioError> {
        self.join("join_chat", format!("chat:{chat_id}"), &chat_id.0)
            .await
    }

    async fn leave_chat(&self, chat_id: &ChatId) -> Result<(), OficioError> {
        let mut rooms = self.rooms.lock().await;
        check_failure(&mut rooms.fail_next, "leave_chat")?;
        rooms
            .emitted
            .push(("leave-chat".to_string(), chat_id.0.clone()));
        rooms.senders.remove(&format!("chat:{chat_id}"));
        Ok(())
    }

    async fn join_professional(&self, user_id: &str) -> Result<EventReceiver, OficioError> {
        self.join(
            "join_professional",
            format!("professional:{user_id}"),
            user_id,
        )
        .await
    }
}
