// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the marketplace backend.
//!
//! Provides [`ApiClient`], the [`MarketplaceApi`] implementation used by the
//! chat core. Requests are not retried here: send failures surface to the
//! coordinator, which rolls back optimistic state and leaves retry to the
//! caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::debug;

use oficio_config::ApiConfig;
use oficio_core::OficioError;
use oficio_core::traits::api::{ChatKey, MarketplaceApi, NewBudget, OutgoingMessage};
use oficio_core::types::{Budget, BudgetStatus, Chat, ChatId, ChatRole, Message, MessageId};

use crate::wire::{
    CreateBudgetBody, CreateChatBody, MarkReadBody, SendMessageBody, WireBudget, WireChat,
    WireMessage,
};

/// HTTP client for marketplace backend communication.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a new backend client from configuration.
    pub fn new(config: &ApiConfig) -> Result<Self, OficioError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.bearer_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| OficioError::Config(format!("invalid bearer token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OficioError::api("failed to build HTTP client", e))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Maps a non-success response into an [`OficioError`].
    ///
    /// 404 becomes `NotFound` so callers can distinguish "does not exist"
    /// from transport failure.
    async fn check_status(
        path: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, OficioError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(OficioError::NotFound {
                resource: path.to_string(),
            });
        }
        let body = response.text().await.unwrap_or_default();
        Err(OficioError::Api {
            message: format!("backend returned {status} for {path}: {body}"),
            source: None,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, OficioError> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| OficioError::api(format!("GET {path} failed"), e))?;

        debug!(path, status = %response.status(), "backend response");

        Self::check_status(path, response)
            .await?
            .json()
            .await
            .map_err(|e| OficioError::api(format!("decoding GET {path} response"), e))
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, OficioError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| OficioError::api(format!("POST {path} failed"), e))?;

        debug!(path, status = %response.status(), "backend response");

        Self::check_status(path, response)
            .await?
            .json()
            .await
            .map_err(|e| OficioError::api(format!("decoding POST {path} response"), e))
    }
}

#[async_trait]
impl MarketplaceApi for ApiClient {
    async fn check_chat(&self, key: &ChatKey) -> Result<Option<Chat>, OficioError> {
        let mut query = vec![
            ("clientId", key.client_id.clone()),
            ("professionalId", key.professional_id.clone()),
        ];
        if let Some(service_id) = &key.service_id {
            query.push(("serviceId", service_id.clone()));
        }

        match self.get_json::<WireChat>("/chats/check", &query).await {
            Ok(wire) => Ok(Some(wire.into())),
            // 404 is the expected answer when no chat exists yet.
            Err(OficioError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_or_get_chat(&self, key: &ChatKey) -> Result<Chat, OficioError> {
        let body = CreateChatBody {
            client_id: &key.client_id,
            professional_id: &key.professional_id,
            service_id: key.service_id.as_deref(),
        };
        let wire: WireChat = self.post_json("/chats", &body).await?;
        Ok(wire.into())
    }

    async fn user_chats(&self, user_id: &str, role: ChatRole) -> Result<Vec<Chat>, OficioError> {
        let path = format!("/chats/user/{user_id}");
        let wire: Vec<WireChat> = self
            .get_json(&path, &[("role", role.to_string())])
            .await?;
        Ok(wire.into_iter().map(Chat::from).collect())
    }

    async fn messages(
        &self,
        chat_id: &ChatId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Message>, OficioError> {
        let path = format!("/chats/{chat_id}/messages");
        let wire: Vec<WireMessage> = self
            .get_json(
                &path,
                &[("limit", limit.to_string()), ("offset", offset.to_string())],
            )
            .await?;
        Ok(wire.into_iter().map(Message::from).collect())
    }

    async fn send_message(
        &self,
        chat_id: &ChatId,
        outgoing: &OutgoingMessage,
    ) -> Result<Message, OficioError> {
        let path = format!("/chats/{chat_id}/messages");
        let body = SendMessageBody {
            sender_id: &outgoing.sender_id,
            message_type: outgoing.kind,
            content: outgoing.content.as_deref(),
            media_url: outgoing.media_ref.as_deref(),
            audio_duration: outgoing.audio_duration_secs,
        };
        let wire: WireMessage = self.post_json(&path, &body).await?;
        Ok(wire.into())
    }

    async fn mark_read(&self, chat_id: &ChatId, user_id: &str) -> Result<(), OficioError> {
        let path = format!("/chats/{chat_id}/messages/read");
        let response = self
            .client
            .patch(self.url(&path))
            .json(&MarkReadBody { user_id })
            .send()
            .await
            .map_err(|e| OficioError::api(format!("PATCH {path} failed"), e))?;
        Self::check_status(&path, response).await?;
        Ok(())
    }

    async fn delete_message(&self, message_id: &MessageId) -> Result<(), OficioError> {
        let path = format!("/messages/{message_id}");
        let response = self
            .client
            .delete(self.url(&path))
            .send()
            .await
            .map_err(|e| OficioError::api(format!("DELETE {path} failed"), e))?;
        Self::check_status(&path, response).await?;
        Ok(())
    }

    async fn create_budget(&self, budget: &NewBudget) -> Result<Budget, OficioError> {
        let body = CreateBudgetBody {
            chat_id: &budget.chat_id.0,
            service_id: &budget.service_id,
            price: budget.price,
            description: budget.description.as_deref(),
        };
        let wire: WireBudget = self.post_json("/budgets", &body).await?;
        Ok(wire.into())
    }

    async fn chat_budgets(
        &self,
        chat_id: &ChatId,
        status: Option<BudgetStatus>,
    ) -> Result<Vec<Budget>, OficioError> {
        let path = format!("/chats/{chat_id}/budgets");
        let query: Vec<(&str, String)> = status
            .map(|s| vec![("status", s.to_string())])
            .unwrap_or_default();
        let wire: Vec<WireBudget> = self.get_json(&path, &query).await?;
        Ok(wire.into_iter().map(Budget::from).collect())
    }
}
