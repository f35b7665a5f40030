// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-chat session coordinator.
//!
//! Composes the optimistic store, budget controller, and recording machine
//! behind the single contract the presentation layer consumes. Lifecycle:
//! Uninitialized -> Loading -> Ready -> Closed, with Ready -> Loading only
//! for explicit reloads and Closed terminal.
//!
//! Every network call is async and unserialized: multiple sends may be in
//! flight, each reconciled by its own temporary id. Nothing is retried
//! automatically (retry is a caller decision), and teardown prevents any
//! in-flight response from mutating a closed session.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use oficio_config::ChatConfig;
use oficio_core::OficioError;
use oficio_core::traits::api::{ChatKey, MarketplaceApi, OutgoingMessage};
use oficio_core::traits::media::{AudioRecorder, ImagePicker, ImageSource};
use oficio_core::traits::realtime::{EventReceiver, RealtimeChannel};
use oficio_core::types::{Budget, ChatId, MessageId, RealtimeEvent};

use crate::budget::BudgetController;
use crate::recording::{RecordingState, VoiceRecorder};
use crate::store::MessageStore;
use crate::timeline::{TimelineItem, merge_timeline};

/// Coordinator lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created; no chat resolved yet.
    Uninitialized,
    /// Resolving the chat and fetching initial state.
    Loading,
    /// Initialized and receiving realtime events.
    Ready,
    /// Torn down. Terminal.
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Uninitialized => write!(f, "uninitialized"),
            SessionState::Loading => write!(f, "loading"),
            SessionState::Ready => write!(f, "ready"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// Identity of the conversation a session manages.
#[derive(Debug, Clone)]
pub struct SessionParams {
    /// The logged-in professional.
    pub user_id: String,
    /// The client counterpart.
    pub client_id: String,
    /// Service the conversation is about, when known.
    pub service_id: Option<String>,
    /// Chat id supplied by the caller (e.g. opened from the inbox). When
    /// absent the session resolves one via idempotent create-or-get.
    pub chat_id: Option<ChatId>,
}

/// One chat screen's session: owns its message list, budget, and recording
/// state, and the realtime room subscriptions that feed them.
pub struct ChatSession {
    api: Arc<dyn MarketplaceApi + Send + Sync>,
    realtime: Arc<dyn RealtimeChannel + Send + Sync>,
    picker: Arc<dyn ImagePicker + Send + Sync>,
    params: SessionParams,
    page_size: u32,

    state: Mutex<SessionState>,
    chat_id: Mutex<Option<ChatId>>,
    store: Arc<Mutex<MessageStore>>,
    budget: Arc<Mutex<BudgetController>>,
    recorder: Arc<Mutex<VoiceRecorder>>,
    draft: Mutex<String>,

    cancel: CancellationToken,
    pump: Mutex<Option<JoinHandle<()>>>,
    tick: Mutex<Option<JoinHandle<()>>>,
}

impl ChatSession {
    pub fn new(
        api: Arc<dyn MarketplaceApi + Send + Sync>,
        realtime: Arc<dyn RealtimeChannel + Send + Sync>,
        recorder_device: Arc<dyn AudioRecorder + Send + Sync>,
        picker: Arc<dyn ImagePicker + Send + Sync>,
        params: SessionParams,
        chat_config: &ChatConfig,
        page_size: u32,
    ) -> Self {
        let budget = BudgetController::new(
            Arc::clone(&api),
            params.service_id.clone(),
            Duration::from_millis(chat_config.budget_reload_delay_ms),
            chat_config.send_policy,
        );

        Self {
            store: Arc::new(Mutex::new(MessageStore::new(params.user_id.clone()))),
            budget: Arc::new(Mutex::new(budget)),
            recorder: Arc::new(Mutex::new(VoiceRecorder::new(recorder_device))),
            api,
            realtime,
            picker,
            params,
            page_size,
            state: Mutex::new(SessionState::Uninitialized),
            chat_id: Mutex::new(None),
            draft: Mutex::new(String::new()),
            cancel: CancellationToken::new(),
            pump: Mutex::new(None),
            tick: Mutex::new(None),
        }
    }

    pub async fn state(&self) -> SessionState {
        *self.state.lock().await
    }

    /// The resolved chat id, once initialized.
    pub async fn chat_id(&self) -> Option<ChatId> {
        self.chat_id.lock().await.clone()
    }

    /// Resolves the chat, loads history and budget, joins the realtime
    /// rooms, and starts the event pump.
    ///
    /// On failure the session is left uninitialized with no partial chat
    /// id, and may be initialized again.
    pub async fn initialize(&self) -> Result<(), OficioError> {
        {
            let mut state = self.state.lock().await;
            match *state {
                SessionState::Uninitialized => {}
                SessionState::Closed => {
                    return Err(OficioError::Session("session is closed".into()));
                }
                other => {
                    return Err(OficioError::Session(format!(
                        "session already {other}"
                    )));
                }
            }
            *state = SessionState::Loading;
        }

        match self.initialize_inner().await {
            Ok(()) => {
                *self.state.lock().await = SessionState::Ready;
                Ok(())
            }
            Err(e) => {
                *self.chat_id.lock().await = None;
                *self.state.lock().await = SessionState::Uninitialized;
                Err(e)
            }
        }
    }

    async fn initialize_inner(&self) -> Result<(), OficioError> {
        // Resolve the chat: caller-supplied id, else idempotent
        // create-or-get keyed on (client, professional, service).
        let chat_id = match &self.params.chat_id {
            Some(id) => {
                debug!(chat_id = %id, "using provided chat id");
                id.clone()
            }
            None => {
                let key = ChatKey {
                    client_id: self.params.client_id.clone(),
                    professional_id: self.params.user_id.clone(),
                    service_id: self.params.service_id.clone(),
                };
                self.api.create_or_get_chat(&key).await?.id
            }
        };

        let history = self.api.messages(&chat_id, self.page_size, 0).await?;
        self.store.lock().await.replace_all(history);

        {
            let mut budget = self.budget.lock().await;
            budget.bind(chat_id.clone());
            // Non-fatal by contract: the screen opens without a budget.
            budget.load().await;
        }

        // Fire-and-forget: zero unread counts elsewhere in the app.
        {
            let api = Arc::clone(&self.api);
            let chat_id = chat_id.clone();
            let user_id = self.params.user_id.clone();
            tokio::spawn(async move {
                if let Err(e) = api.mark_read(&chat_id, &user_id).await {
                    debug!(chat_id = %chat_id, error = %e, "mark read failed");
                }
            });
        }

        let chat_rx = self.realtime.join_chat(&chat_id).await?;
        let pro_rx = match self.realtime.join_professional(&self.params.user_id).await {
            Ok(rx) => rx,
            Err(e) => {
                let _ = self.realtime.leave_chat(&chat_id).await;
                return Err(e);
            }
        };

        let handle = tokio::spawn(pump(
            chat_rx,
            pro_rx,
            chat_id.clone(),
            Arc::clone(&self.store),
            Arc::clone(&self.budget),
            self.cancel.clone(),
        ));
        *self.pump.lock().await = Some(handle);
        *self.chat_id.lock().await = Some(chat_id.clone());

        info!(chat_id = %chat_id, "chat session ready");
        Ok(())
    }

    /// Re-fetches history and budget. Permitted only from Ready; the
    /// session returns to Ready even when the fetch fails.
    pub async fn reload(&self) -> Result<(), OficioError> {
        {
            let mut state = self.state.lock().await;
            if *state != SessionState::Ready {
                return Err(OficioError::Session(format!(
                    "cannot reload while {state}"
                )));
            }
            *state = SessionState::Loading;
        }

        let result = async {
            let chat_id = self.require_chat_id().await?;
            let history = self.api.messages(&chat_id, self.page_size, 0).await?;
            self.store.lock().await.replace_all(history);
            self.budget.lock().await.load().await;
            Ok(())
        }
        .await;

        *self.state.lock().await = SessionState::Ready;
        result
    }

    /// The merged, display-ready timeline.
    pub async fn timeline(&self) -> Vec<TimelineItem> {
        let store = self.store.lock().await;
        let budget = self.budget.lock().await;
        merge_timeline(store.messages(), budget.current())
    }

    /// Whether outbound messaging is currently permitted.
    pub async fn can_send_messages(&self) -> bool {
        self.budget.lock().await.can_send_messages()
    }

    pub async fn set_draft(&self, text: impl Into<String>) {
        *self.draft.lock().await = text.into();
    }

    pub async fn draft(&self) -> String {
        self.draft.lock().await.clone()
    }

    /// Sends a text message with optimistic local echo.
    ///
    /// Blank or whitespace-only input is a no-op. On failure the optimistic
    /// entry is rolled back and the error surfaces to the caller.
    pub async fn send_text(&self, text: &str) -> Result<(), OficioError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        self.ensure_send_allowed().await?;

        let outgoing = OutgoingMessage::text(&self.params.user_id, trimmed);
        self.draft.lock().await.clear();
        self.send_outgoing(outgoing).await
    }

    /// Picks or captures an image and sends it.
    ///
    /// User cancellation is a silent no-op; permission denial surfaces as
    /// an error with local state untouched.
    pub async fn send_image(&self, source: ImageSource) -> Result<(), OficioError> {
        self.ensure_send_allowed().await?;

        let Some(media_ref) = self.picker.pick(source).await? else {
            debug!("image pick cancelled");
            return Ok(());
        };
        let outgoing = OutgoingMessage::image(&self.params.user_id, media_ref);
        self.send_outgoing(outgoing).await
    }

    /// Sends a finished audio artifact.
    pub async fn send_audio(
        &self,
        media_ref: &str,
        duration_secs: u32,
    ) -> Result<(), OficioError> {
        self.ensure_send_allowed().await?;
        let outgoing = OutgoingMessage::audio(&self.params.user_id, media_ref, duration_secs);
        self.send_outgoing(outgoing).await
    }

    /// Starts voice recording and the 1-second elapsed tick.
    pub async fn start_recording(&self) -> Result<(), OficioError> {
        self.ensure_send_allowed().await?;
        self.recorder.lock().await.start().await?;

        let recorder = Arc::clone(&self.recorder);
        let cancel = self.cancel.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick of a tokio interval fires immediately.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        let mut rec = recorder.lock().await;
                        if rec.state() != RecordingState::Recording {
                            break;
                        }
                        rec.tick();
                    }
                }
            }
        });
        *self.tick.lock().await = Some(handle);
        Ok(())
    }

    /// Stops recording; a non-empty capture is sent as an audio message.
    pub async fn stop_recording(&self) -> Result<(), OficioError> {
        self.stop_tick().await;

        let finished = {
            let mut rec = self.recorder.lock().await;
            let finished = rec.stop().await?;
            rec.reset();
            finished
        };

        match finished {
            Some(finished) => {
                self.send_audio(&finished.media_ref, finished.duration_secs)
                    .await
            }
            // Zero seconds captured: nothing to send.
            None => Ok(()),
        }
    }

    /// Cancels recording, discarding the capture.
    pub async fn cancel_recording(&self) -> Result<(), OficioError> {
        self.stop_tick().await;
        let mut rec = self.recorder.lock().await;
        rec.cancel().await?;
        rec.reset();
        Ok(())
    }

    pub async fn recording_state(&self) -> RecordingState {
        self.recorder.lock().await.state()
    }

    pub async fn recording_elapsed_secs(&self) -> u32 {
        self.recorder.lock().await.elapsed_secs()
    }

    /// Deletes a message server-side, then locally.
    ///
    /// No optimistic removal: a failed delete leaves the message in place.
    pub async fn delete_message(&self, id: &MessageId) -> Result<(), OficioError> {
        self.ensure_ready().await?;
        self.api.delete_message(id).await?;
        if !self.cancel.is_cancelled() {
            self.store.lock().await.remove(id);
        }
        Ok(())
    }

    /// Creates a quote on the chat and adopts it as the current budget.
    pub async fn send_quote(
        &self,
        price: f64,
        description: Option<String>,
    ) -> Result<Budget, OficioError> {
        self.ensure_ready().await?;
        self.budget.lock().await.send_quote(price, description).await
    }

    /// Tears the session down: stops the event pump, leaves the chat room,
    /// and closes the lifecycle. Must be called exactly once per
    /// initialize; events arriving afterwards are dropped.
    pub async fn teardown(&self) -> Result<(), OficioError> {
        {
            let mut state = self.state.lock().await;
            if *state == SessionState::Closed {
                return Err(OficioError::Session("session already closed".into()));
            }
            *state = SessionState::Closed;
        }

        self.cancel.cancel();
        self.stop_tick().await;
        if let Some(handle) = self.pump.lock().await.take() {
            let _ = handle.await;
        }

        if let Some(chat_id) = self.chat_id.lock().await.clone()
            && let Err(e) = self.realtime.leave_chat(&chat_id).await
        {
            warn!(chat_id = %chat_id, error = %e, "leaving chat room failed");
        }

        info!("chat session closed");
        Ok(())
    }

    async fn stop_tick(&self) {
        if let Some(handle) = self.tick.lock().await.take() {
            handle.abort();
        }
    }

    async fn ensure_ready(&self) -> Result<(), OficioError> {
        let state = *self.state.lock().await;
        if state != SessionState::Ready {
            return Err(OficioError::Session(format!(
                "session is {state}, not ready"
            )));
        }
        Ok(())
    }

    async fn ensure_send_allowed(&self) -> Result<(), OficioError> {
        self.ensure_ready().await?;
        if !self.budget.lock().await.can_send_messages() {
            return Err(OficioError::Session(
                "messaging is closed for this chat's budget".into(),
            ));
        }
        Ok(())
    }

    async fn require_chat_id(&self) -> Result<ChatId, OficioError> {
        self.chat_id
            .lock()
            .await
            .clone()
            .ok_or_else(|| OficioError::Session("no chat resolved".into()))
    }

    /// The optimistic append / confirm / rollback send path, shared by all
    /// message kinds. Reconciliation is keyed strictly by the temporary id,
    /// so concurrent sends cannot cross-contaminate.
    async fn send_outgoing(&self, outgoing: OutgoingMessage) -> Result<(), OficioError> {
        let chat_id = self.require_chat_id().await?;
        let temp_id = self
            .store
            .lock()
            .await
            .append_optimistic(&outgoing, &chat_id);

        match self.api.send_message(&chat_id, &outgoing).await {
            Ok(confirmed) => {
                // A torn-down session must not be mutated by late responses.
                if !self.cancel.is_cancelled() {
                    self.store.lock().await.confirm(&temp_id, confirmed);
                }
                Ok(())
            }
            Err(e) => {
                if !self.cancel.is_cancelled() {
                    self.store.lock().await.rollback(&temp_id);
                }
                Err(e)
            }
        }
    }
}

/// Event pump: drains both room subscriptions into session state until
/// teardown cancels it.
async fn pump(
    mut chat_rx: EventReceiver,
    mut pro_rx: EventReceiver,
    chat_id: ChatId,
    store: Arc<Mutex<MessageStore>>,
    budget: Arc<Mutex<BudgetController>>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            ev = chat_rx.recv() => ev,
            ev = pro_rx.recv() => ev,
        };

        match event {
            Ok(event) => handle_event(event, &chat_id, &store, &budget).await,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(chat_id = %chat_id, skipped, "realtime receiver lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    debug!(chat_id = %chat_id, "event pump stopped");
}

async fn handle_event(
    event: RealtimeEvent,
    chat_id: &ChatId,
    store: &Arc<Mutex<MessageStore>>,
    budget: &Arc<Mutex<BudgetController>>,
) {
    match event {
        RealtimeEvent::NewMessage(msg) => {
            if msg.chat_id != *chat_id {
                // Race or misroute; not this session's business.
                debug!(message_chat = %msg.chat_id, "message for another chat, dropping");
                return;
            }
            store.lock().await.receive_remote(msg);
        }
        event @ RealtimeEvent::BudgetUpdate { .. } => {
            budget.lock().await.apply_remote_update(&event).await;
        }
        RealtimeEvent::MessageRead {
            chat_id: read_chat,
            user_id,
        } => {
            if read_chat == *chat_id {
                store.lock().await.mark_read_by(&user_id);
            }
        }
        // Inbox concerns; the session ignores them.
        RealtimeEvent::NewChat(_) | RealtimeEvent::ChatListUpdate { .. } => {}
    }
}
