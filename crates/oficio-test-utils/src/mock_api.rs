// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock marketplace API for deterministic testing.
//!
//! `MockApi` implements `MarketplaceApi` with scripted responses, recorded
//! calls, and per-operation failure injection.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use oficio_core::OficioError;
use oficio_core::traits::api::{ChatKey, MarketplaceApi, NewBudget, OutgoingMessage};
use oficio_core::types::{Budget, BudgetStatus, Chat, ChatId, ChatRole, Message, MessageId};

#[derive(Default)]
struct MockState {
    chat: Option<Chat>,
    chats: Vec<Chat>,
    history: Vec<Message>,
    budgets: Vec<Budget>,
    sent: Vec<OutgoingMessage>,
    deleted: Vec<MessageId>,
    calls: HashMap<String, usize>,
    fail_next: HashMap<String, usize>,
    sequence: u64,
}

impl MockState {
    fn record(&mut self, op: &str) -> Result<(), OficioError> {
        *self.calls.entry(op.to_string()).or_default() += 1;
        if let Some(remaining) = self.fail_next.get_mut(op) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(OficioError::Api {
                    message: format!("mock {op} failure"),
                    source: None,
                });
            }
        }
        Ok(())
    }

    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

/// A scripted marketplace backend for tests.
///
/// Responses are set with the `push_*`/`set_*` methods; every trait call is
/// counted and retrievable via [`MockApi::calls`], and `fail_next` makes
/// the next call of an operation fail with an API error.
pub struct MockApi {
    state: Mutex<MockState>,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    /// Sets the chat returned by `check_chat` and `create_or_get_chat`.
    pub async fn set_chat(&self, chat: Chat) {
        self.state.lock().await.chat = Some(chat);
    }

    /// Sets the list returned by `user_chats`.
    pub async fn push_chats(&self, chats: Vec<Chat>) {
        self.state.lock().await.chats = chats;
    }

    /// Sets the history returned by `messages`.
    pub async fn push_history(&self, history: Vec<Message>) {
        self.state.lock().await.history = history;
    }

    /// Sets the list returned by `chat_budgets` (newest first, as the
    /// backend sorts).
    pub async fn push_budgets(&self, budgets: Vec<Budget>) {
        self.state.lock().await.budgets = budgets;
    }

    /// Makes the next call of `op` fail. Stacks.
    pub async fn fail_next(&self, op: &str) {
        *self
            .state
            .lock()
            .await
            .fail_next
            .entry(op.to_string())
            .or_default() += 1;
    }

    /// Number of times `op` was called (including failed calls).
    pub async fn calls(&self, op: &str) -> usize {
        self.state.lock().await.calls.get(op).copied().unwrap_or(0)
    }

    /// Outgoing messages accepted by `send_message`.
    pub async fn sent_messages(&self) -> Vec<OutgoingMessage> {
        self.state.lock().await.sent.clone()
    }

    /// Ids passed to `delete_message`.
    pub async fn deleted_ids(&self) -> Vec<MessageId> {
        self.state.lock().await.deleted.clone()
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketplaceApi for MockApi {
    async fn check_chat(&self, _key: &ChatKey) -> Result<Option<Chat>, OficioError> {
        let mut state = self.state.lock().await;
        state.record("check_chat")?;
        Ok(state.chat.clone())
    }

    async fn create_or_get_chat(&self, key: &ChatKey) -> Result<Chat, OficioError> {
        let mut state = self.state.lock().await;
        state.record("create_or_get_chat")?;
        // Idempotent: the same key always resolves to the same chat.
        Ok(state.chat.clone().unwrap_or_else(|| Chat {
            id: ChatId(format!("chat-{}", key.client_id)),
            client_id: key.client_id.clone(),
            professional_id: key.professional_id.clone(),
            service_id: key.service_id.clone(),
            last_message_at_ms: 0,
            client: None,
            service: None,
            unread_count: 0,
        }))
    }

    async fn user_chats(&self, _user_id: &str, _role: ChatRole) -> Result<Vec<Chat>, OficioError> {
        let mut state = self.state.lock().await;
        state.record("user_chats")?;
        Ok(state.chats.clone())
    }

    async fn messages(
        &self,
        _chat_id: &ChatId,
        _limit: u32,
        _offset: u32,
    ) -> Result<Vec<Message>, OficioError> {
        let mut state = self.state.lock().await;
        state.record("messages")?;
        Ok(state.history.clone())
    }

    async fn send_message(
        &self,
        chat_id: &ChatId,
        outgoing: &OutgoingMessage,
    ) -> Result<Message, OficioError> {
        let mut state = self.state.lock().await;
        state.record("send_message")?;
        state.sent.push(outgoing.clone());
        let n = state.next_sequence();
        Ok(Message {
            id: MessageId(format!("srv-{n}")),
            chat_id: chat_id.clone(),
            sender_id: outgoing.sender_id.clone(),
            kind: outgoing.kind,
            content: outgoing.content.clone(),
            media_ref: outgoing.media_ref.clone(),
            audio_duration_secs: outgoing.audio_duration_secs,
            created_at_ms: (n as i64) * 1000,
            is_read: false,
        })
    }

    async fn mark_read(&self, _chat_id: &ChatId, _user_id: &str) -> Result<(), OficioError> {
        self.state.lock().await.record("mark_read")
    }

    async fn delete_message(&self, message_id: &MessageId) -> Result<(), OficioError> {
        let mut state = self.state.lock().await;
        // Recorded even when the call is scripted to fail.
        state.deleted.push(message_id.clone());
        state.record("delete_message")?;
        Ok(())
    }

    async fn create_budget(&self, budget: &NewBudget) -> Result<Budget, OficioError> {
        let mut state = self.state.lock().await;
        state.record("create_budget")?;
        let n = state.next_sequence();
        Ok(Budget {
            id: format!("budget-{n}"),
            chat_id: budget.chat_id.clone(),
            service_id: budget.service_id.clone(),
            price: format!("{:.2}", budget.price),
            description: budget.description.clone(),
            status: BudgetStatus::Quoted,
            created_at_ms: (n as i64) * 1000,
            updated_at_ms: (n as i64) * 1000,
            expires_at_ms: None,
        })
    }

    async fn chat_budgets(
        &self,
        _chat_id: &ChatId,
        status: Option<BudgetStatus>,
    ) -> Result<Vec<Budget>, OficioError> {
        let mut state = self.state.lock().await;
        state.record("chat_budgets")?;
        let budgets = match status {
            Some(status) => state
                .budgets
                .iter()
                .filter(|b| b.status == status)
                .cloned()
                .collect(),
            None => state.budgets.clone(),
        };
        Ok(budgets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_message_confirms_with_sequenced_ids() {
        let api = MockApi::new();
        let chat_id = ChatId("chat-1".into());

        let first = api
            .send_message(&chat_id, &OutgoingMessage::text("pro-1", "one"))
            .await
            .unwrap();
        let second = api
            .send_message(&chat_id, &OutgoingMessage::text("pro-1", "two"))
            .await
            .unwrap();

        assert_eq!(first.id, MessageId("srv-1".into()));
        assert_eq!(second.id, MessageId("srv-2".into()));
        assert_eq!(api.sent_messages().await.len(), 2);
        assert_eq!(api.calls("send_message").await, 2);
    }

    #[tokio::test]
    async fn fail_next_fails_exactly_once() {
        let api = MockApi::new();
        api.fail_next("mark_read").await;

        let chat_id = ChatId("chat-1".into());
        assert!(api.mark_read(&chat_id, "pro-1").await.is_err());
        assert!(api.mark_read(&chat_id, "pro-1").await.is_ok());
        assert_eq!(api.calls("mark_read").await, 2);
    }

    #[tokio::test]
    async fn create_or_get_chat_is_idempotent() {
        let api = MockApi::new();
        let key = ChatKey {
            client_id: "client-1".into(),
            professional_id: "pro-1".into(),
            service_id: None,
        };
        let first = api.create_or_get_chat(&key).await.unwrap();
        let second = api.create_or_get_chat(&key).await.unwrap();
        assert_eq!(first.id, second.id);
    }
}
