// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire frames and event decoding for the realtime channel.
//!
//! Frames are JSON text in both directions:
//!
//! ```json
//! {"event": "new-message", "room": "chat:chat-1", "data": { ... }}
//! ```
//!
//! Each event name is a tagged variant with a fixed payload shape. Frames
//! with unknown names or payloads that fail to decode are dropped with a
//! debug log rather than trusted; the channel is not allowed to crash a
//! session.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use oficio_api::wire::{WireBudget, WireChat, WireMessage};
use oficio_core::types::{ChatId, RealtimeEvent};

/// Event names consumed from the channel.
pub mod consumed {
    pub const NEW_MESSAGE: &str = "new-message";
    pub const MESSAGE_READ: &str = "message-read";
    pub const NEW_CHAT: &str = "new-chat";
    pub const NEW_BUDGET: &str = "new-budget";
    pub const CHAT_LIST_UPDATE: &str = "chat-list-update";
}

/// Event names emitted to the channel.
pub mod emitted {
    pub const JOIN_CHAT: &str = "join-chat";
    pub const LEAVE_CHAT: &str = "leave-chat";
    pub const JOIN_PROFESSIONAL: &str = "join-professional";
}

/// One wire frame, either direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    /// Room the server fanned this frame out to, when tagged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl Frame {
    /// An emit frame carrying a bare string payload (room joins and leaves).
    pub fn emit(event: &str, data: impl Into<String>) -> Self {
        Frame {
            event: event.to_string(),
            room: None,
            data: Value::String(data.into()),
        }
    }
}

/// Room key for a chat's fan-out room.
pub fn chat_room(chat_id: &ChatId) -> String {
    format!("chat:{chat_id}")
}

/// Room key for a professional's general notification room.
pub fn professional_room(user_id: &str) -> String {
    format!("professional:{user_id}")
}

/// Payload shape for `message-read`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageReadPayload {
    chat_id: String,
    user_id: String,
}

/// Payload shape for `new-budget` and `chat-list-update`.
///
/// The budget push identifies its chat by id or by service id and may embed
/// the budget itself; all fields are optional by design.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BudgetUpdatePayload {
    #[serde(default)]
    chat_id: Option<String>,
    #[serde(default)]
    service_id: Option<String>,
    #[serde(default)]
    budget: Option<WireBudget>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatListUpdatePayload {
    chat_id: String,
}

/// Decode a frame into a typed event.
///
/// Returns `None` for unknown event names and for payloads that do not
/// match the expected shape; both are dropped silently at this boundary.
pub fn decode(frame: &Frame) -> Option<RealtimeEvent> {
    let event = match frame.event.as_str() {
        consumed::NEW_MESSAGE => {
            let wire: WireMessage = from_value(&frame.data)?;
            RealtimeEvent::NewMessage(wire.into())
        }
        consumed::MESSAGE_READ => {
            let payload: MessageReadPayload = from_value(&frame.data)?;
            RealtimeEvent::MessageRead {
                chat_id: ChatId(payload.chat_id),
                user_id: payload.user_id,
            }
        }
        consumed::NEW_CHAT => {
            let wire: WireChat = from_value(&frame.data)?;
            RealtimeEvent::NewChat(wire.into())
        }
        consumed::NEW_BUDGET => {
            let payload: BudgetUpdatePayload = from_value(&frame.data)?;
            if payload.chat_id.is_none() && payload.service_id.is_none() {
                debug!("budget push names neither chat nor service, dropping");
                return None;
            }
            RealtimeEvent::BudgetUpdate {
                chat_id: payload.chat_id.map(ChatId),
                service_id: payload.service_id,
                budget: payload.budget.map(Into::into),
            }
        }
        consumed::CHAT_LIST_UPDATE => {
            let payload: ChatListUpdatePayload = from_value(&frame.data)?;
            RealtimeEvent::ChatListUpdate {
                chat_id: ChatId(payload.chat_id),
            }
        }
        other => {
            debug!(event = other, "ignoring unknown realtime event");
            return None;
        }
    };
    Some(event)
}

fn from_value<T: serde::de::DeserializeOwned>(value: &Value) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(error = %e, "realtime payload shape mismatch, dropping");
            None
        }
    }
}

/// The room a decoded event should be fanned out to locally.
///
/// Prefers the server's room tag; falls back to the chat room derived from
/// the payload. `None` means the frame cannot be routed and is dropped.
pub fn route(frame: &Frame, event: &RealtimeEvent) -> Option<String> {
    if let Some(room) = &frame.room {
        return Some(room.clone());
    }
    event.chat_id().map(chat_room)
}
