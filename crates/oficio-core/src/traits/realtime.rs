// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime channel trait for room-scoped event delivery.
//!
//! One shared connection, many subscribers: implementations own the single
//! transport and fan events out per room. Sessions hold only the receivers
//! returned here and must leave their rooms on teardown so listeners do not
//! leak across screen navigations.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::OficioError;
use crate::types::{ChatId, RealtimeEvent};

/// Stream of decoded events for one room subscription.
///
/// Backed by a broadcast channel: a lagged receiver drops the oldest events
/// rather than blocking the connection's read loop.
pub type EventReceiver = broadcast::Receiver<RealtimeEvent>;

/// Interface to the realtime fan-out channel.
#[async_trait]
pub trait RealtimeChannel {
    /// Joins a chat room and returns its event stream.
    ///
    /// Joining a room already joined returns a fresh receiver on the same
    /// underlying subscription.
    async fn join_chat(&self, chat_id: &ChatId) -> Result<EventReceiver, OficioError>;

    /// Leaves a chat room. Idempotent; leaving an unjoined room is a no-op.
    async fn leave_chat(&self, chat_id: &ChatId) -> Result<(), OficioError>;

    /// Registers the professional's general notification room keyed by user
    /// id (new chats, booking offers, chat list updates).
    async fn join_professional(&self, user_id: &str) -> Result<EventReceiver, OficioError>;
}
