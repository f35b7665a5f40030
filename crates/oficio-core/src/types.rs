// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Oficio workspace.
//!
//! These are the client-side models: timestamps are epoch milliseconds
//! (`i64`), money stays in the decimal string form the backend sends, and
//! nothing here knows about wire casing; the API crate owns that mapping.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a chat between a client and a professional.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub String);

/// Unique identifier for a chat message.
///
/// Server-assigned on confirmation; client-assigned (temporary) before it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The payload kind of a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    Text,
    Image,
    Audio,
}

/// One chat utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub sender_id: String,
    pub kind: MessageKind,
    /// Text payload. Present for `Text`, optional caption otherwise.
    pub content: Option<String>,
    /// Opaque reference/URI to an image or audio payload. Required for
    /// `Image` and `Audio` kinds.
    pub media_ref: Option<String>,
    /// Recorded length in whole seconds. Present only for `Audio`.
    pub audio_duration_secs: Option<u32>,
    /// Sole ordering key for the timeline.
    pub created_at_ms: i64,
    pub is_read: bool,
}

impl Message {
    /// Whether this message was authored by the given user.
    ///
    /// Derived at read time; never stored.
    pub fn is_mine(&self, user_id: &str) -> bool {
        self.sender_id == user_id
    }
}

/// Lifecycle status of a budget (quote).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetStatus {
    Pending,
    Quoted,
    Accepted,
    Rejected,
    Expired,
}

impl BudgetStatus {
    /// Statuses under which a conversation is considered open for messaging
    /// by the stricter send policy.
    pub fn is_open(self) -> bool {
        matches!(self, BudgetStatus::Pending | BudgetStatus::Accepted)
    }
}

/// The single active quote for a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub chat_id: ChatId,
    pub service_id: String,
    /// Decimal price as the backend sends it (e.g. `"150.00"`). A value of
    /// exactly zero denotes a pending request placeholder, not a real offer.
    pub price: String,
    pub description: Option<String>,
    pub status: BudgetStatus,
    pub created_at_ms: i64,
    /// When the quote was last set. Timeline key once a price exists.
    pub updated_at_ms: i64,
    pub expires_at_ms: Option<i64>,
}

impl Budget {
    /// Numeric price. Unparseable strings read as zero, i.e. a placeholder.
    pub fn price_value(&self) -> f64 {
        self.price.trim().parse().unwrap_or(0.0)
    }

    /// True while no quote has been set yet (price of zero).
    pub fn is_placeholder(&self) -> bool {
        self.price_value() <= 0.0
    }

    /// Effective timeline position: `updated_at_ms` once the quote was set,
    /// `created_at_ms` while the request is still a placeholder.
    pub fn timeline_key(&self) -> i64 {
        if self.price_value() > 0.0 {
            self.updated_at_ms
        } else {
            self.created_at_ms
        }
    }
}

/// Display identity of one side of a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub id: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// Embedded service summary on a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub id: String,
    pub title: String,
}

/// A conversation between a client and a professional about a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub client_id: String,
    pub professional_id: String,
    pub service_id: Option<String>,
    pub last_message_at_ms: i64,
    /// Client display info, when the backend embeds it.
    pub client: Option<Party>,
    pub service: Option<ServiceSummary>,
    /// Messages not yet read by the local user.
    pub unread_count: u32,
}

/// Which side of the marketplace the caller acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatRole {
    Client,
    Pro,
}

/// A typed event delivered over the realtime channel.
///
/// Wire frames with unknown event names or payloads that do not match these
/// shapes are dropped at decode time and never reach a session.
#[derive(Debug, Clone)]
pub enum RealtimeEvent {
    /// A message was posted to a chat room the caller joined.
    NewMessage(Message),
    /// The counterpart read messages in a chat.
    MessageRead { chat_id: ChatId, user_id: String },
    /// A chat was created involving the professional.
    NewChat(Chat),
    /// The budget attached to a chat was created or changed.
    ///
    /// Wire event name `new-budget`. The payload identifies the chat by id
    /// or by service id, and may or may not carry the budget itself; the
    /// controller re-reads from the API either way.
    BudgetUpdate {
        chat_id: Option<ChatId>,
        service_id: Option<String>,
        budget: Option<Budget>,
    },
    /// A chat's list entry (ordering, unread count) changed.
    ChatListUpdate { chat_id: ChatId },
}

impl RealtimeEvent {
    /// The chat this event belongs to, when it names one.
    pub fn chat_id(&self) -> Option<&ChatId> {
        match self {
            RealtimeEvent::NewMessage(msg) => Some(&msg.chat_id),
            RealtimeEvent::MessageRead { chat_id, .. } => Some(chat_id),
            RealtimeEvent::NewChat(chat) => Some(&chat.id),
            RealtimeEvent::BudgetUpdate { chat_id, .. } => chat_id.as_ref(),
            RealtimeEvent::ChatListUpdate { chat_id } => Some(chat_id),
        }
    }
}
