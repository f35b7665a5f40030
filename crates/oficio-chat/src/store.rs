// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optimistic message store: reconciles locally-originated messages with
//! server confirmations and realtime pushes without ever duplicating.
//!
//! Internal order is arrival order; display ordering is always the timeline
//! merge's job, keyed on `created_at_ms`. Correctness here is about
//! identity: within one chat no two confirmed entries share an id, and a
//! temporary entry is replaced, never duplicated, once its server echo
//! arrives, whichever of the HTTP confirmation and the realtime echo lands
//! first.

use std::collections::HashSet;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use oficio_core::traits::api::OutgoingMessage;
use oficio_core::types::{ChatId, Message, MessageId};

/// In-memory message list for one chat session.
#[derive(Debug)]
pub struct MessageStore {
    user_id: String,
    messages: Vec<Message>,
    /// Temporary ids appended optimistically and not yet confirmed,
    /// rolled back, or matched against a realtime echo.
    pending: HashSet<MessageId>,
}

impl MessageStore {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            messages: Vec::new(),
            pending: HashSet::new(),
        }
    }

    /// Replaces the whole list (history load / explicit reload).
    ///
    /// Outstanding temporary entries are dropped with it: a reload is a
    /// fresh start from server truth.
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.pending.clear();
    }

    /// Messages in arrival order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of temporary entries still awaiting reconciliation.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Appends an optimistic entry for an outgoing message and returns its
    /// temporary id for later reconciliation. No network is touched here.
    pub fn append_optimistic(&mut self, outgoing: &OutgoingMessage, chat_id: &ChatId) -> MessageId {
        let temp_id = MessageId(format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple()
        ));

        self.messages.push(Message {
            id: temp_id.clone(),
            chat_id: chat_id.clone(),
            sender_id: self.user_id.clone(),
            kind: outgoing.kind,
            content: outgoing.content.clone(),
            media_ref: outgoing.media_ref.clone(),
            audio_duration_secs: outgoing.audio_duration_secs,
            created_at_ms: Utc::now().timestamp_millis(),
            is_read: false,
        });
        self.pending.insert(temp_id.clone());
        temp_id
    }

    /// Replaces the temporary entry with the server-confirmed message,
    /// adopting the server id and timestamps.
    ///
    /// A no-op when the temporary id is unknown (already reconciled via the
    /// realtime echo, or rolled back). If the confirmed id is already
    /// present under another entry, the temporary one is simply removed:
    /// the echo won the race.
    pub fn confirm(&mut self, temp_id: &MessageId, confirmed: Message) {
        self.pending.remove(temp_id);

        let Some(pos) = self.messages.iter().position(|m| &m.id == temp_id) else {
            return;
        };

        if self
            .messages
            .iter()
            .any(|m| m.id == confirmed.id && &m.id != temp_id)
        {
            self.messages.remove(pos);
            return;
        }

        self.messages[pos] = confirmed;
    }

    /// Removes a temporary entry after a failed send. Idempotent.
    pub fn rollback(&mut self, temp_id: &MessageId) {
        self.pending.remove(temp_id);
        self.messages.retain(|m| &m.id != temp_id);
    }

    /// Applies a message pushed over the realtime channel.
    ///
    /// Echoes of our own sends must not append a duplicate: when exactly
    /// one temporary entry is outstanding the echo is matched against it;
    /// otherwise the echo (or a counterpart message) appends only if its id
    /// is not already stored.
    pub fn receive_remote(&mut self, message: Message) {
        if self.messages.iter().any(|m| m.id == message.id) {
            debug!(message_id = %message.id, "duplicate realtime message, dropping");
            return;
        }

        if message.sender_id == self.user_id
            && self.pending.len() == 1
            && let Some(temp_id) = self.pending.iter().next().cloned()
        {
            self.confirm(&temp_id, message);
            return;
        }

        self.messages.push(message);
    }

    /// Deletes an entry by id. Idempotent.
    pub fn remove(&mut self, id: &MessageId) {
        self.pending.remove(id);
        self.messages.retain(|m| &m.id != id);
    }

    /// Applies a read receipt: everything the reader received is now read.
    pub fn mark_read_by(&mut self, reader_id: &str) {
        for msg in &mut self.messages {
            if msg.sender_id != reader_id {
                msg.is_read = true;
            }
        }
    }
}
