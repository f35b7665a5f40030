// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Marketplace backend API trait.
//!
//! All status transitions, pricing rules, and fan-out are authoritative on
//! the server; this client only reads and requests. Failures never carry
//! retry semantics here; retry is a caller decision.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OficioError;
use crate::types::{
    Budget, BudgetStatus, Chat, ChatId, ChatRole, Message, MessageId, MessageKind,
};

/// Key for resolving a chat between a client and a professional.
///
/// The backend create-or-get on this key is idempotent: repeated calls
/// return the same chat, which is what keeps the at-most-one-chat-per-
/// counterpart invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatKey {
    pub client_id: String,
    pub professional_id: String,
    pub service_id: Option<String>,
}

/// A message the client wants to post to a chat.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub sender_id: String,
    pub kind: MessageKind,
    pub content: Option<String>,
    pub media_ref: Option<String>,
    pub audio_duration_secs: Option<u32>,
}

impl OutgoingMessage {
    pub fn text(sender_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            kind: MessageKind::Text,
            content: Some(content.into()),
            media_ref: None,
            audio_duration_secs: None,
        }
    }

    pub fn image(sender_id: impl Into<String>, media_ref: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            kind: MessageKind::Image,
            content: None,
            media_ref: Some(media_ref.into()),
            audio_duration_secs: None,
        }
    }

    pub fn audio(
        sender_id: impl Into<String>,
        media_ref: impl Into<String>,
        duration_secs: u32,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            kind: MessageKind::Audio,
            content: None,
            media_ref: Some(media_ref.into()),
            audio_duration_secs: Some(duration_secs),
        }
    }
}

/// A quote the professional wants to attach to a chat.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    pub chat_id: ChatId,
    pub service_id: String,
    pub price: f64,
    pub description: Option<String>,
}

/// Client interface to the marketplace HTTP backend.
#[async_trait]
pub trait MarketplaceApi {
    /// Looks up the chat for a key without creating one.
    ///
    /// A backend 404 is the legitimate "no chat yet" answer and maps to
    /// `Ok(None)`, never to an error.
    async fn check_chat(&self, key: &ChatKey) -> Result<Option<Chat>, OficioError>;

    /// Creates the chat for a key, or returns the existing one. Idempotent.
    async fn create_or_get_chat(&self, key: &ChatKey) -> Result<Chat, OficioError>;

    /// Lists the chats a user participates in, most recent first.
    async fn user_chats(&self, user_id: &str, role: ChatRole) -> Result<Vec<Chat>, OficioError>;

    /// Fetches a page of a chat's message history, oldest first.
    async fn messages(
        &self,
        chat_id: &ChatId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Message>, OficioError>;

    /// Posts a message and returns the server-confirmed form.
    async fn send_message(
        &self,
        chat_id: &ChatId,
        outgoing: &OutgoingMessage,
    ) -> Result<Message, OficioError>;

    /// Zeroes the unread count for a user in a chat.
    async fn mark_read(&self, chat_id: &ChatId, user_id: &str) -> Result<(), OficioError>;

    /// Deletes a message.
    async fn delete_message(&self, message_id: &MessageId) -> Result<(), OficioError>;

    /// Creates a budget (quote) on a chat.
    async fn create_budget(&self, budget: &NewBudget) -> Result<Budget, OficioError>;

    /// Lists a chat's budgets, most recently created first.
    async fn chat_budgets(
        &self,
        chat_id: &ChatId,
        status: Option<BudgetStatus>,
    ) -> Result<Vec<Budget>, OficioError>;
}
