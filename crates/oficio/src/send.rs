// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `oficio send` command implementation.
//!
//! Runs one full session lifecycle against the real backend and realtime
//! server: initialize, send a text message, print the merged timeline,
//! tear down.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use oficio_api::ApiClient;
use oficio_chat::{ChatSession, SessionParams, TimelineKind};
use oficio_config::OficioConfig;
use oficio_core::OficioError;
use oficio_core::traits::media::{AudioRecorder, ImagePicker, ImageSource};
use oficio_core::types::ChatId;
use oficio_realtime::SocketManager;

/// A terminal has no microphone or photo library: every capture request
/// reads as a permission denial.
struct NoDevice;

#[async_trait]
impl AudioRecorder for NoDevice {
    async fn begin(&self) -> Result<(), OficioError> {
        Err(OficioError::PermissionDenied {
            capability: "microphone".into(),
        })
    }

    async fn finish(&self) -> Result<String, OficioError> {
        Err(OficioError::PermissionDenied {
            capability: "microphone".into(),
        })
    }

    async fn discard(&self) -> Result<(), OficioError> {
        Ok(())
    }
}

#[async_trait]
impl ImagePicker for NoDevice {
    async fn pick(&self, _source: ImageSource) -> Result<Option<String>, OficioError> {
        Err(OficioError::PermissionDenied {
            capability: "photo library".into(),
        })
    }
}

pub async fn run(
    config: &OficioConfig,
    user_id: String,
    client_id: String,
    service_id: Option<String>,
    chat_id: Option<String>,
    text: &str,
) -> Result<(), OficioError> {
    let api = Arc::new(ApiClient::new(&config.api)?);
    let realtime = Arc::new(SocketManager::connect(&config.realtime).await?);
    let device = Arc::new(NoDevice);

    let session = ChatSession::new(
        api,
        Arc::clone(&realtime) as _,
        Arc::clone(&device) as _,
        device as _,
        SessionParams {
            user_id,
            client_id,
            service_id,
            chat_id: chat_id.map(ChatId),
        },
        &config.chat,
        config.api.page_size,
    );

    session.initialize().await?;
    let chat_id = session.chat_id().await;
    info!(chat_id = ?chat_id, "session ready");

    session.send_text(text).await?;

    for item in session.timeline().await {
        match &item.kind {
            TimelineKind::Message(msg) => {
                let body = msg
                    .content
                    .as_deref()
                    .or(msg.media_ref.as_deref())
                    .unwrap_or("");
                println!("[{}] {}: {}", msg.created_at_ms, msg.sender_id, body);
            }
            TimelineKind::Budget(budget) => {
                println!(
                    "[{}] budget {} {} ({})",
                    item.sort_key, budget.id, budget.price, budget.status
                );
            }
        }
    }

    session.teardown().await?;
    realtime.close();
    Ok(())
}
