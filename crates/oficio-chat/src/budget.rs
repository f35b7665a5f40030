// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Holds the single current budget for a chat and decides whether outbound
//! messaging is permitted.
//!
//! A chat shows at most one budget at a time; `load` always replaces the
//! held value with the head of the server-sorted list, never merges. Push
//! events trigger a delayed re-read: the delay lets the backend finish its
//! own write before we read back, a documented workaround for
//! read-after-write races, not a consistency guarantee.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use oficio_config::SendPolicy;
use oficio_core::OficioError;
use oficio_core::traits::api::{MarketplaceApi, NewBudget};
use oficio_core::types::{Budget, ChatId, RealtimeEvent};

/// Budget state for one chat session.
pub struct BudgetController {
    api: Arc<dyn MarketplaceApi + Send + Sync>,
    /// Bound on session initialization, once the chat id is resolved.
    chat_id: Option<ChatId>,
    service_id: Option<String>,
    reload_delay: Duration,
    policy: SendPolicy,
    current: Option<Budget>,
}

impl BudgetController {
    pub fn new(
        api: Arc<dyn MarketplaceApi + Send + Sync>,
        service_id: Option<String>,
        reload_delay: Duration,
        policy: SendPolicy,
    ) -> Self {
        Self {
            api,
            chat_id: None,
            service_id,
            reload_delay,
            policy,
            current: None,
        }
    }

    /// Binds the controller to its chat. Called once the session resolves
    /// the chat id; rebinding resets the held budget.
    pub fn bind(&mut self, chat_id: ChatId) {
        self.chat_id = Some(chat_id);
        self.current = None;
    }

    /// The budget currently attached to the chat, if any.
    pub fn current(&self) -> Option<&Budget> {
        self.current.as_ref()
    }

    /// Replaces the held budget with a server-provided value (e.g. the echo
    /// of a quote the professional just created).
    pub fn set_current(&mut self, budget: Budget) {
        self.current = Some(budget);
    }

    /// Fetches the most recent budget for the chat.
    ///
    /// The backend sorts newest-first, so index 0 is authoritative. Empty
    /// results and fetch failures both yield `None`; a failure is logged,
    /// never propagated, so the chat screen still opens.
    pub async fn load(&mut self) -> Option<&Budget> {
        let Some(chat_id) = self.chat_id.clone() else {
            debug!("budget load before bind, skipping");
            return None;
        };

        match self.api.chat_budgets(&chat_id, None).await {
            Ok(budgets) => {
                self.current = budgets.into_iter().next();
            }
            Err(e) => {
                warn!(chat_id = %chat_id, error = %e, "budget load failed");
                self.current = None;
            }
        }
        self.current.as_ref()
    }

    /// Applies a realtime budget push.
    ///
    /// If the event targets this chat (by chat id or service id), waits the
    /// configured reload delay and re-reads the budget from the API.
    /// Returns whether the event matched.
    pub async fn apply_remote_update(&mut self, event: &RealtimeEvent) -> bool {
        let RealtimeEvent::BudgetUpdate {
            chat_id,
            service_id,
            ..
        } = event
        else {
            return false;
        };

        let matches_chat = chat_id.is_some() && chat_id.as_ref() == self.chat_id.as_ref();
        let matches_service = service_id.is_some() && *service_id == self.service_id;
        if !matches_chat && !matches_service {
            return false;
        }

        debug!(delay_ms = self.reload_delay.as_millis() as u64, "budget push matched, re-reading");
        tokio::time::sleep(self.reload_delay).await;
        self.load().await;
        true
    }

    /// Creates a quote on the chat and adopts the server echo as current.
    pub async fn send_quote(
        &mut self,
        price: f64,
        description: Option<String>,
    ) -> Result<Budget, OficioError> {
        let chat_id = self
            .chat_id
            .clone()
            .ok_or_else(|| OficioError::Session("budget controller not bound to a chat".into()))?;
        let service_id = self.service_id.clone().ok_or_else(|| {
            OficioError::Session("cannot create a budget without a service".into())
        })?;

        let created = self
            .api
            .create_budget(&NewBudget {
                chat_id,
                service_id,
                price,
                description,
            })
            .await?;
        self.current = Some(created.clone());
        Ok(created)
    }

    /// Whether outbound messaging is currently permitted.
    ///
    /// The policy is injectable because two contradictory product behaviors
    /// have shipped; callers only ever see this predicate.
    pub fn can_send_messages(&self) -> bool {
        match self.policy {
            SendPolicy::Always => true,
            SendPolicy::OpenBudgetOnly => self
                .current
                .as_ref()
                .is_some_and(|b| b.status.is_open()),
        }
    }
}
