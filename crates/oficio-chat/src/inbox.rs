// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The professional's chat list (inbox) state.
//!
//! Maintains the list of conversations with unread counts, ordered by most
//! recent activity, and applies the realtime events the general
//! notification room delivers. Events naming unknown chats trigger a full
//! refresh rather than being trusted.

use std::sync::Arc;

use tracing::{debug, warn};

use oficio_core::OficioError;
use oficio_core::traits::api::MarketplaceApi;
use oficio_core::types::{Chat, ChatId, ChatRole, RealtimeEvent};

/// Chat list state for one professional.
pub struct ChatInbox {
    user_id: String,
    api: Arc<dyn MarketplaceApi + Send + Sync>,
    chats: Vec<Chat>,
}

impl ChatInbox {
    pub fn new(user_id: impl Into<String>, api: Arc<dyn MarketplaceApi + Send + Sync>) -> Self {
        Self {
            user_id: user_id.into(),
            api,
            chats: Vec::new(),
        }
    }

    /// Chats ordered by most recent activity first.
    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    /// Total unread messages across all chats.
    pub fn total_unread(&self) -> u32 {
        self.chats.iter().map(|c| c.unread_count).sum()
    }

    /// Replaces the list with the backend's view.
    pub async fn refresh(&mut self) -> Result<(), OficioError> {
        let chats = self.api.user_chats(&self.user_id, ChatRole::Pro).await?;
        self.chats = chats;
        self.sort();
        Ok(())
    }

    /// Applies a realtime event to the list.
    ///
    /// Refresh failures triggered from here are logged and leave the list
    /// stale; the inbox never propagates them.
    pub async fn apply_event(&mut self, event: &RealtimeEvent) {
        match event {
            RealtimeEvent::NewChat(chat) => {
                // Duplicate suppression by id, as everywhere else.
                if self.position(&chat.id).is_some() {
                    return;
                }
                self.chats.insert(0, chat.clone());
                self.sort();
            }
            RealtimeEvent::NewMessage(msg) => {
                let Some(pos) = self.position(&msg.chat_id) else {
                    debug!(chat_id = %msg.chat_id, "message for unknown chat, refreshing inbox");
                    self.refresh_logged().await;
                    return;
                };
                let chat = &mut self.chats[pos];
                chat.last_message_at_ms = chat.last_message_at_ms.max(msg.created_at_ms);
                if !msg.is_mine(&self.user_id) {
                    chat.unread_count += 1;
                }
                self.sort();
            }
            RealtimeEvent::MessageRead { chat_id, user_id } => {
                // Our own read receipt zeroes the badge.
                if user_id == &self.user_id
                    && let Some(pos) = self.position(chat_id)
                {
                    self.chats[pos].unread_count = 0;
                }
            }
            RealtimeEvent::ChatListUpdate { .. } => {
                self.refresh_logged().await;
            }
            // Session concern.
            RealtimeEvent::BudgetUpdate { .. } => {}
        }
    }

    async fn refresh_logged(&mut self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "inbox refresh failed");
        }
    }

    fn position(&self, chat_id: &ChatId) -> Option<usize> {
        self.chats.iter().position(|c| &c.id == chat_id)
    }

    fn sort(&mut self) {
        self.chats
            .sort_by_key(|c| std::cmp::Reverse(c.last_message_at_ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oficio_test_utils::{MockApi, fixtures};

    const USER: &str = "pro-1";

    async fn inbox_with(api: Arc<MockApi>, chats: Vec<Chat>) -> ChatInbox {
        api.push_chats(chats).await;
        let mut inbox = ChatInbox::new(USER, api);
        inbox.refresh().await.unwrap();
        inbox
    }

    #[tokio::test]
    async fn refresh_sorts_by_recency() {
        let api = Arc::new(MockApi::new());
        let mut inbox = inbox_with(
            Arc::clone(&api),
            vec![
                fixtures::chat("c-old", "client-1", USER, 1000),
                fixtures::chat("c-new", "client-2", USER, 5000),
            ],
        )
        .await;
        inbox.refresh().await.unwrap();

        let ids: Vec<&str> = inbox.chats().iter().map(|c| c.id.0.as_str()).collect();
        assert_eq!(ids, ["c-new", "c-old"]);
    }

    #[tokio::test]
    async fn new_chat_prepends_once() {
        let api = Arc::new(MockApi::new());
        let mut inbox = inbox_with(Arc::clone(&api), vec![]).await;

        let chat = fixtures::chat("c-1", "client-1", USER, 2000);
        inbox
            .apply_event(&RealtimeEvent::NewChat(chat.clone()))
            .await;
        inbox.apply_event(&RealtimeEvent::NewChat(chat)).await;

        assert_eq!(inbox.chats().len(), 1);
    }

    #[tokio::test]
    async fn counterpart_message_bumps_unread_and_reorders() {
        let api = Arc::new(MockApi::new());
        let mut inbox = inbox_with(
            Arc::clone(&api),
            vec![
                fixtures::chat("c-a", "client-1", USER, 4000),
                fixtures::chat("c-b", "client-2", USER, 1000),
            ],
        )
        .await;

        let msg = fixtures::message("m-1", "c-b", "client-2", "oi", 9000);
        inbox.apply_event(&RealtimeEvent::NewMessage(msg)).await;

        assert_eq!(inbox.chats()[0].id, ChatId("c-b".into()));
        assert_eq!(inbox.chats()[0].unread_count, 1);
        assert_eq!(inbox.total_unread(), 1);
    }

    #[tokio::test]
    async fn own_message_does_not_bump_unread() {
        let api = Arc::new(MockApi::new());
        let mut inbox = inbox_with(
            Arc::clone(&api),
            vec![fixtures::chat("c-a", "client-1", USER, 4000)],
        )
        .await;

        let msg = fixtures::message("m-1", "c-a", USER, "olá", 9000);
        inbox.apply_event(&RealtimeEvent::NewMessage(msg)).await;

        assert_eq!(inbox.chats()[0].unread_count, 0);
        assert_eq!(inbox.chats()[0].last_message_at_ms, 9000);
    }

    #[tokio::test]
    async fn own_read_receipt_zeroes_badge() {
        let api = Arc::new(MockApi::new());
        let mut chat = fixtures::chat("c-a", "client-1", USER, 4000);
        chat.unread_count = 3;
        let mut inbox = inbox_with(Arc::clone(&api), vec![chat]).await;
        assert_eq!(inbox.total_unread(), 3);

        inbox
            .apply_event(&RealtimeEvent::MessageRead {
                chat_id: ChatId("c-a".into()),
                user_id: USER.into(),
            })
            .await;
        assert_eq!(inbox.total_unread(), 0);
    }

    #[tokio::test]
    async fn message_for_unknown_chat_triggers_refresh() {
        let api = Arc::new(MockApi::new());
        let mut inbox = inbox_with(Arc::clone(&api), vec![]).await;
        let refreshes_before = api.calls("user_chats").await;

        api.push_chats(vec![fixtures::chat("c-x", "client-9", USER, 9000)])
            .await;
        let msg = fixtures::message("m-1", "c-x", "client-9", "oi", 9000);
        inbox.apply_event(&RealtimeEvent::NewMessage(msg)).await;

        assert_eq!(api.calls("user_chats").await, refreshes_before + 1);
        assert_eq!(inbox.chats().len(), 1);
    }

    #[tokio::test]
    async fn chat_list_update_refreshes() {
        let api = Arc::new(MockApi::new());
        let mut inbox = inbox_with(Arc::clone(&api), vec![]).await;

        api.push_chats(vec![fixtures::chat("c-1", "client-1", USER, 1000)])
            .await;
        inbox
            .apply_event(&RealtimeEvent::ChatListUpdate {
                chat_id: ChatId("c-1".into()),
            })
            .await;
        assert_eq!(inbox.chats().len(), 1);
    }

    #[tokio::test]
    async fn refresh_failure_leaves_list_stale() {
        let api = Arc::new(MockApi::new());
        let mut inbox = inbox_with(
            Arc::clone(&api),
            vec![fixtures::chat("c-a", "client-1", USER, 4000)],
        )
        .await;

        api.fail_next("user_chats").await;
        inbox
            .apply_event(&RealtimeEvent::ChatListUpdate {
                chat_id: ChatId("c-a".into()),
            })
            .await;
        // Still holds the previous view.
        assert_eq!(inbox.chats().len(), 1);
    }
}
