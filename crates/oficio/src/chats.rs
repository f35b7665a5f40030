// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `oficio chats` command implementation.

use oficio_api::ApiClient;
use oficio_config::OficioConfig;
use oficio_core::OficioError;
use oficio_core::traits::api::MarketplaceApi;
use oficio_core::types::ChatRole;
use tracing::info;

pub async fn run(config: &OficioConfig, user_id: &str) -> Result<(), OficioError> {
    let api = ApiClient::new(&config.api)?;
    let chats = api.user_chats(user_id, ChatRole::Pro).await?;
    info!(count = chats.len(), "chats fetched");

    if chats.is_empty() {
        println!("no chats");
        return Ok(());
    }

    for chat in &chats {
        let counterpart = chat
            .client
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or(chat.client_id.as_str());
        let service = chat
            .service
            .as_ref()
            .map(|s| s.title.as_str())
            .unwrap_or("-");
        println!(
            "{}  {}  service={}  unread={}",
            chat.id, counterpart, service, chat.unread_count
        );
    }
    Ok(())
}
