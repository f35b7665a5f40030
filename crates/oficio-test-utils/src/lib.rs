// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Oficio: mock collaborators and fixture builders.
//!
//! Everything here programs against the traits in `oficio-core`, so tests
//! can exercise the chat core without a backend, a socket server, or a
//! device.

pub mod mock_api;
pub mod mock_media;
pub mod mock_realtime;

pub use mock_api::MockApi;
pub use mock_media::{MockPicker, MockRecorder, PickOutcome};
pub use mock_realtime::MockRealtime;

/// Fixture builders for domain values with sensible defaults.
pub mod fixtures {
    use oficio_core::types::{
        Budget, BudgetStatus, Chat, ChatId, Message, MessageId, MessageKind,
    };

    /// A text message.
    pub fn message(
        id: &str,
        chat_id: &str,
        sender_id: &str,
        content: &str,
        created_at_ms: i64,
    ) -> Message {
        Message {
            id: MessageId(id.into()),
            chat_id: ChatId(chat_id.into()),
            sender_id: sender_id.into(),
            kind: MessageKind::Text,
            content: Some(content.into()),
            media_ref: None,
            audio_duration_secs: None,
            created_at_ms,
            is_read: false,
        }
    }

    /// A budget; zero-priced budgets read as Pending placeholders.
    pub fn budget(
        id: &str,
        chat_id: &str,
        price: &str,
        created_at_ms: i64,
        updated_at_ms: i64,
    ) -> Budget {
        let placeholder = price.trim().parse::<f64>().unwrap_or(0.0) <= 0.0;
        Budget {
            id: id.into(),
            chat_id: ChatId(chat_id.into()),
            service_id: "svc-1".into(),
            price: price.into(),
            description: None,
            status: if placeholder {
                BudgetStatus::Pending
            } else {
                BudgetStatus::Quoted
            },
            created_at_ms,
            updated_at_ms,
            expires_at_ms: None,
        }
    }

    /// A chat with no embedded display info.
    pub fn chat(id: &str, client_id: &str, professional_id: &str, last_message_at_ms: i64) -> Chat {
        Chat {
            id: ChatId(id.into()),
            client_id: client_id.into(),
            professional_id: professional_id.into(),
            service_id: Some("svc-1".into()),
            last_message_at_ms,
            client: None,
            service: None,
            unread_count: 0,
        }
    }
}
