// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the marketplace backend JSON API.
//!
//! The backend speaks camelCase with RFC3339 timestamps; the rest of the
//! workspace speaks snake_case with epoch milliseconds. Everything crossing
//! that boundary passes through here.

use serde::{Deserialize, Serialize};
use tracing::warn;

use oficio_core::types::{
    Budget, BudgetStatus, Chat, ChatId, Message, MessageId, MessageKind, Party, ServiceSummary,
};

/// Parse an RFC3339 timestamp into epoch milliseconds.
///
/// The backend occasionally omits or malforms timestamps on embedded
/// objects; those read as 0 rather than failing the whole response.
pub(crate) fn parse_epoch_ms(raw: &str) -> i64 {
    match chrono::DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.timestamp_millis(),
        Err(e) => {
            warn!(raw, error = %e, "unparseable timestamp from backend");
            0
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireParty {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl From<WireParty> for Party {
    fn from(w: WireParty) -> Self {
        Party {
            id: w.id,
            name: w.name,
            avatar_url: w.avatar_url,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireService {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    #[serde(default)]
    pub content: Option<String>,
    pub message_type: MessageKind,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub audio_duration: Option<u32>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: String,
}

impl From<WireMessage> for Message {
    fn from(w: WireMessage) -> Self {
        Message {
            id: MessageId(w.id),
            chat_id: ChatId(w.chat_id),
            sender_id: w.sender_id,
            kind: w.message_type,
            content: w.content,
            media_ref: w.media_url,
            audio_duration_secs: w.audio_duration,
            created_at_ms: parse_epoch_ms(&w.created_at),
            is_read: w.is_read,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBudget {
    pub id: String,
    pub chat_id: String,
    pub service_id: String,
    pub price: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: BudgetStatus,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl From<WireBudget> for Budget {
    fn from(w: WireBudget) -> Self {
        Budget {
            id: w.id,
            chat_id: ChatId(w.chat_id),
            service_id: w.service_id,
            price: w.price,
            description: w.description,
            status: w.status,
            created_at_ms: parse_epoch_ms(&w.created_at),
            updated_at_ms: parse_epoch_ms(&w.updated_at),
            expires_at_ms: w.expires_at.as_deref().map(parse_epoch_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessageCount {
    #[serde(default)]
    pub messages: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireChat {
    pub id: String,
    pub client_id: String,
    pub professional_id: String,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<String>,
    #[serde(default)]
    pub client: Option<WireParty>,
    #[serde(default)]
    pub service: Option<WireService>,
    #[serde(default, rename = "_count")]
    pub count: Option<WireMessageCount>,
}

impl From<WireChat> for Chat {
    fn from(w: WireChat) -> Self {
        Chat {
            id: ChatId(w.id),
            client_id: w.client_id,
            professional_id: w.professional_id,
            service_id: w.service_id,
            last_message_at_ms: w.last_message_at.as_deref().map(parse_epoch_ms).unwrap_or(0),
            client: w.client.map(Party::from),
            service: w.service.map(|s| ServiceSummary {
                id: s.id,
                title: s.title,
            }),
            unread_count: w.count.map(|c| c.messages).unwrap_or(0),
        }
    }
}

// --- Request bodies ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatBody<'a> {
    pub client_id: &'a str,
    pub professional_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageBody<'a> {
    pub sender_id: &'a str,
    pub message_type: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_duration: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadBody<'a> {
    pub user_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBudgetBody<'a> {
    pub chat_id: &'a str,
    pub service_id: &'a str,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_message_converts_timestamps() {
        let json = r#"{
            "id": "m1",
            "chatId": "c1",
            "senderId": "u1",
            "content": "hi",
            "messageType": "TEXT",
            "mediaUrl": null,
            "audioDuration": null,
            "isRead": false,
            "createdAt": "1970-01-01T00:00:01Z"
        }"#;
        let wire: WireMessage = serde_json::from_str(json).unwrap();
        let msg = Message::from(wire);
        assert_eq!(msg.id, MessageId("m1".into()));
        assert_eq!(msg.created_at_ms, 1000);
        assert_eq!(msg.kind, MessageKind::Text);
    }

    #[test]
    fn malformed_timestamp_reads_as_zero() {
        assert_eq!(parse_epoch_ms("yesterday"), 0);
    }

    #[test]
    fn wire_budget_keeps_decimal_string() {
        let json = r#"{
            "id": "b1",
            "chatId": "c1",
            "serviceId": "s1",
            "price": "150.00",
            "description": null,
            "status": "QUOTED",
            "createdAt": "1970-01-01T00:00:00.500Z",
            "updatedAt": "1970-01-01T00:00:01.500Z",
            "expiresAt": null
        }"#;
        let budget = Budget::from(serde_json::from_str::<WireBudget>(json).unwrap());
        assert_eq!(budget.price, "150.00");
        assert_eq!(budget.created_at_ms, 500);
        assert_eq!(budget.updated_at_ms, 1500);
        assert_eq!(budget.status, BudgetStatus::Quoted);
    }

    #[test]
    fn wire_chat_unread_from_count() {
        let json = r#"{
            "id": "c1",
            "clientId": "u1",
            "professionalId": "p1",
            "serviceId": "s1",
            "lastMessageAt": "1970-01-01T00:00:02Z",
            "client": {"id": "u1", "name": "Ana", "avatarUrl": null},
            "_count": {"messages": 3}
        }"#;
        let chat = Chat::from(serde_json::from_str::<WireChat>(json).unwrap());
        assert_eq!(chat.unread_count, 3);
        assert_eq!(chat.last_message_at_ms, 2000);
        assert_eq!(chat.client.as_ref().unwrap().name, "Ana");
    }

    #[test]
    fn send_body_omits_absent_fields() {
        let body = SendMessageBody {
            sender_id: "p1",
            message_type: MessageKind::Text,
            content: Some("olá"),
            media_url: None,
            audio_duration: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["senderId"], "p1");
        assert_eq!(json["messageType"], "TEXT");
        assert!(json.get("mediaUrl").is_none());
        assert!(json.get("audioDuration").is_none());
    }
}
