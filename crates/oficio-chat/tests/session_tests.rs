// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the chat session coordinator against mock
//! collaborators: initialization, optimistic sends, realtime
//! reconciliation, budget sync, recording, and teardown.

use std::sync::Arc;
use std::time::Duration;

use oficio_chat::{ChatSession, RecordingState, SessionParams, SessionState, TimelineKind};
use oficio_config::{ChatConfig, SendPolicy};
use oficio_core::OficioError;
use oficio_core::traits::media::ImageSource;
use oficio_core::types::{ChatId, MessageId, MessageKind, RealtimeEvent};
use oficio_test_utils::{MockApi, MockPicker, MockRealtime, MockRecorder, PickOutcome, fixtures};

const USER: &str = "pro-1";
const CLIENT: &str = "client-1";

struct Harness {
    api: Arc<MockApi>,
    realtime: Arc<MockRealtime>,
    recorder: Arc<MockRecorder>,
    picker: Arc<MockPicker>,
    session: ChatSession,
}

fn harness_with(params: SessionParams, chat_config: ChatConfig) -> Harness {
    let api = Arc::new(MockApi::new());
    let realtime = Arc::new(MockRealtime::new());
    let recorder = Arc::new(MockRecorder::new());
    let picker = Arc::new(MockPicker::new());

    let session = ChatSession::new(
        Arc::clone(&api) as _,
        Arc::clone(&realtime) as _,
        Arc::clone(&recorder) as _,
        Arc::clone(&picker) as _,
        params,
        &chat_config,
        50,
    );

    Harness {
        api,
        realtime,
        recorder,
        picker,
        session,
    }
}

fn harness() -> Harness {
    harness_with(
        SessionParams {
            user_id: USER.into(),
            client_id: CLIENT.into(),
            service_id: Some("svc-1".into()),
            chat_id: Some(ChatId("chat-1".into())),
        },
        ChatConfig::default(),
    )
}

/// Lets spawned tasks (event pump, fire-and-forget calls) run.
async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn initialize_with_provided_chat_id() {
    let h = harness();
    h.api
        .push_history(vec![fixtures::message("m1", "chat-1", CLIENT, "oi", 1000)])
        .await;

    h.session.initialize().await.unwrap();

    assert_eq!(h.session.state().await, SessionState::Ready);
    assert_eq!(h.session.chat_id().await, Some(ChatId("chat-1".into())));
    // Provided id: no create-or-get round trip.
    assert_eq!(h.api.calls("create_or_get_chat").await, 0);

    let timeline = h.session.timeline().await;
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].display_id, "message:m1");

    // Both realtime rooms joined.
    let emitted = h.realtime.emitted().await;
    assert!(emitted.contains(&("join-chat".into(), "chat-1".into())));
    assert!(emitted.contains(&("join-professional".into(), USER.into())));

    // Mark-read fired and forgotten.
    settle().await;
    assert_eq!(h.api.calls("mark_read").await, 1);
}

#[tokio::test]
async fn initialize_resolves_chat_via_create_or_get() {
    let params = SessionParams {
        user_id: USER.into(),
        client_id: CLIENT.into(),
        service_id: Some("svc-1".into()),
        chat_id: None,
    };
    let h = harness_with(params, ChatConfig::default());
    h.api
        .set_chat(fixtures::chat("chat-42", CLIENT, USER, 0))
        .await;

    h.session.initialize().await.unwrap();

    assert_eq!(h.api.calls("create_or_get_chat").await, 1);
    assert_eq!(h.session.chat_id().await, Some(ChatId("chat-42".into())));
}

#[tokio::test]
async fn failed_initialize_leaves_no_partial_state() {
    let h = harness();
    h.api.fail_next("messages").await;

    let err = h.session.initialize().await.unwrap_err();
    assert!(matches!(err, OficioError::Api { .. }));
    assert_eq!(h.session.state().await, SessionState::Uninitialized);
    assert_eq!(h.session.chat_id().await, None);

    // A second attempt may succeed.
    h.session.initialize().await.unwrap();
    assert_eq!(h.session.state().await, SessionState::Ready);
}

#[tokio::test]
async fn failed_room_join_surfaces_and_resets() {
    let h = harness();
    h.realtime.fail_next("join_professional").await;

    assert!(h.session.initialize().await.is_err());
    assert_eq!(h.session.state().await, SessionState::Uninitialized);
    // The chat room joined before the failure was left again.
    let emitted = h.realtime.emitted().await;
    assert!(emitted.contains(&("leave-chat".into(), "chat-1".into())));
}

#[tokio::test]
async fn operations_require_ready_state() {
    let h = harness();
    let err = h.session.send_text("olá").await.unwrap_err();
    assert!(matches!(err, OficioError::Session(_)));
    assert_eq!(h.api.calls("send_message").await, 0);
}

#[tokio::test]
async fn send_text_confirms_optimistic_entry() {
    let h = harness();
    h.session.initialize().await.unwrap();

    h.session.set_draft("olá").await;
    h.session.send_text("olá").await.unwrap();

    assert_eq!(h.session.draft().await, "");
    let timeline = h.session.timeline().await;
    assert_eq!(timeline.len(), 1);
    match &timeline[0].kind {
        TimelineKind::Message(msg) => {
            assert_eq!(msg.id, MessageId("srv-1".into()));
            assert!(msg.is_mine(USER));
        }
        other => panic!("expected message, got {other:?}"),
    }
}

#[tokio::test]
async fn blank_input_is_a_noop() {
    let h = harness();
    h.session.initialize().await.unwrap();

    h.session.send_text("   \n\t ").await.unwrap();
    assert_eq!(h.api.calls("send_message").await, 0);
    assert!(h.session.timeline().await.is_empty());
}

#[tokio::test]
async fn offline_send_rolls_back_and_surfaces_error() {
    let h = harness();
    h.session.initialize().await.unwrap();
    h.api.fail_next("send_message").await;

    let err = h.session.send_text("olá").await.unwrap_err();
    assert!(matches!(err, OficioError::Api { .. }));
    // The optimistic entry was removed after the rejection.
    assert!(h.session.timeline().await.is_empty());
}

#[tokio::test]
async fn two_rapid_sends_confirm_independently() {
    let h = harness();
    h.session.initialize().await.unwrap();

    h.session.send_text("one").await.unwrap();
    h.session.send_text("two").await.unwrap();

    let timeline = h.session.timeline().await;
    let ids: Vec<&str> = timeline
        .iter()
        .map(|item| item.display_id.as_str())
        .collect();
    assert_eq!(ids, ["message:srv-1", "message:srv-2"]);
}

#[tokio::test]
async fn counterpart_message_arrives_via_realtime() {
    let h = harness();
    h.session.initialize().await.unwrap();

    let msg = fixtures::message("m-9", "chat-1", CLIENT, "oi", 5000);
    assert!(
        h.realtime
            .inject_chat_event(&ChatId("chat-1".into()), RealtimeEvent::NewMessage(msg))
            .await
    );
    settle().await;

    let timeline = h.session.timeline().await;
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].display_id, "message:m-9");
}

#[tokio::test]
async fn late_echo_of_own_send_does_not_duplicate() {
    let h = harness();
    h.session.initialize().await.unwrap();

    h.session.send_text("olá").await.unwrap();

    // The realtime echo of our confirmed send arrives afterwards.
    let echo = fixtures::message("srv-1", "chat-1", USER, "olá", 1000);
    h.realtime
        .inject_chat_event(&ChatId("chat-1".into()), RealtimeEvent::NewMessage(echo))
        .await;
    settle().await;

    assert_eq!(h.session.timeline().await.len(), 1);
}

#[tokio::test]
async fn message_for_another_chat_is_dropped() {
    let h = harness();
    h.session.initialize().await.unwrap();

    let foreign = fixtures::message("m-x", "chat-9", CLIENT, "oi", 5000);
    h.realtime
        .inject_chat_event(&ChatId("chat-1".into()), RealtimeEvent::NewMessage(foreign))
        .await;
    settle().await;

    assert!(h.session.timeline().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn budget_push_reloads_into_timeline() {
    let h = harness();
    h.session.initialize().await.unwrap();
    assert!(h.session.timeline().await.is_empty());

    h.api
        .push_budgets(vec![fixtures::budget("b-1", "chat-1", "150.00", 500, 1500)])
        .await;
    h.realtime
        .inject_chat_event(
            &ChatId("chat-1".into()),
            RealtimeEvent::BudgetUpdate {
                chat_id: Some(ChatId("chat-1".into())),
                service_id: None,
                budget: None,
            },
        )
        .await;

    // The controller waits its reload delay before re-reading.
    tokio::time::sleep(Duration::from_millis(600)).await;
    settle().await;

    let timeline = h.session.timeline().await;
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].display_id, "budget:b-1");
    assert_eq!(timeline[0].sort_key, 1500);
}

#[tokio::test]
async fn delete_message_is_not_optimistic() {
    let h = harness();
    h.api
        .push_history(vec![fixtures::message("m1", "chat-1", CLIENT, "oi", 1000)])
        .await;
    h.session.initialize().await.unwrap();

    // Failure leaves the message in place.
    h.api.fail_next("delete_message").await;
    assert!(
        h.session
            .delete_message(&MessageId("m1".into()))
            .await
            .is_err()
    );
    assert_eq!(h.session.timeline().await.len(), 1);

    // Success removes it locally.
    h.session
        .delete_message(&MessageId("m1".into()))
        .await
        .unwrap();
    assert!(h.session.timeline().await.is_empty());
    assert_eq!(h.api.deleted_ids().await.len(), 2);
}

#[tokio::test]
async fn image_pick_cancel_sends_nothing() {
    let h = harness();
    h.session.initialize().await.unwrap();

    // Queue empty: the picker reads as user cancellation.
    h.session.send_image(ImageSource::Library).await.unwrap();
    assert_eq!(h.api.calls("send_message").await, 0);
}

#[tokio::test]
async fn image_permission_denial_surfaces_without_state_change() {
    let h = harness();
    h.session.initialize().await.unwrap();
    h.picker.push(PickOutcome::Deny);

    let err = h.session.send_image(ImageSource::Camera).await.unwrap_err();
    assert!(err.is_permission_denied());
    assert!(h.session.timeline().await.is_empty());
}

#[tokio::test]
async fn picked_image_is_sent_as_image_message() {
    let h = harness();
    h.session.initialize().await.unwrap();
    h.picker
        .push(PickOutcome::Image("file:///photo.jpg".into()));

    h.session.send_image(ImageSource::Library).await.unwrap();

    let sent = h.api.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, MessageKind::Image);
    assert_eq!(sent[0].media_ref.as_deref(), Some("file:///photo.jpg"));
}

#[tokio::test]
async fn immediate_stop_recording_emits_no_message() {
    let h = harness();
    h.session.initialize().await.unwrap();

    h.session.start_recording().await.unwrap();
    assert_eq!(h.session.recording_state().await, RecordingState::Recording);

    // Stopped with zero seconds elapsed: no audio message.
    h.session.stop_recording().await.unwrap();
    assert_eq!(h.session.recording_state().await, RecordingState::Idle);
    assert_eq!(h.api.calls("send_message").await, 0);
    assert_eq!(h.recorder.discarded(), 1);
}

#[tokio::test(start_paused = true)]
async fn recording_ticks_and_sends_audio_on_stop() {
    let h = harness();
    h.session.initialize().await.unwrap();

    h.session.start_recording().await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    let elapsed = h.session.recording_elapsed_secs().await;
    assert!(elapsed >= 2, "tick task should have advanced elapsed time");

    h.session.stop_recording().await.unwrap();

    let sent = h.api.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, MessageKind::Audio);
    assert_eq!(sent[0].audio_duration_secs, Some(elapsed));
    assert_eq!(sent[0].media_ref.as_deref(), Some(h.recorder.artifact().as_str()));
    assert_eq!(h.session.recording_state().await, RecordingState::Idle);
}

#[tokio::test]
async fn cancel_recording_discards_capture() {
    let h = harness();
    h.session.initialize().await.unwrap();

    h.session.start_recording().await.unwrap();
    h.session.cancel_recording().await.unwrap();

    assert_eq!(h.session.recording_state().await, RecordingState::Idle);
    assert_eq!(h.api.calls("send_message").await, 0);
    assert_eq!(h.recorder.discarded(), 1);
}

#[tokio::test]
async fn microphone_denial_keeps_session_usable() {
    let h = harness();
    h.session.initialize().await.unwrap();
    h.recorder.deny_permission();

    let err = h.session.start_recording().await.unwrap_err();
    assert!(err.is_permission_denied());
    assert_eq!(h.session.recording_state().await, RecordingState::Idle);

    // Text messaging is unaffected.
    h.session.send_text("ainda funciona").await.unwrap();
    assert_eq!(h.api.calls("send_message").await, 1);
}

#[tokio::test]
async fn send_quote_places_budget_in_timeline() {
    let h = harness();
    h.session.initialize().await.unwrap();

    let created = h.session.send_quote(180.0, None).await.unwrap();
    assert_eq!(created.price, "180.00");

    let timeline = h.session.timeline().await;
    assert_eq!(timeline.len(), 1);
    match &timeline[0].kind {
        TimelineKind::Budget(budget) => assert_eq!(budget.id, created.id),
        other => panic!("expected budget, got {other:?}"),
    }
}

#[tokio::test]
async fn open_budget_policy_blocks_sends_without_budget() {
    let h = harness_with(
        SessionParams {
            user_id: USER.into(),
            client_id: CLIENT.into(),
            service_id: Some("svc-1".into()),
            chat_id: Some(ChatId("chat-1".into())),
        },
        ChatConfig {
            send_policy: SendPolicy::OpenBudgetOnly,
            ..ChatConfig::default()
        },
    );
    h.session.initialize().await.unwrap();

    assert!(!h.session.can_send_messages().await);
    let err = h.session.send_text("olá").await.unwrap_err();
    assert!(matches!(err, OficioError::Session(_)));
    assert_eq!(h.api.calls("send_message").await, 0);
}

#[tokio::test]
async fn reload_is_explicit_and_returns_to_ready() {
    let h = harness();
    h.session.initialize().await.unwrap();

    h.api
        .push_history(vec![fixtures::message("m1", "chat-1", CLIENT, "oi", 1000)])
        .await;
    h.session.reload().await.unwrap();
    assert_eq!(h.session.state().await, SessionState::Ready);
    assert_eq!(h.session.timeline().await.len(), 1);

    // A failed reload still lands back in Ready.
    h.api.fail_next("messages").await;
    assert!(h.session.reload().await.is_err());
    assert_eq!(h.session.state().await, SessionState::Ready);
}

#[tokio::test]
async fn teardown_leaves_room_and_is_terminal() {
    let h = harness();
    h.session.initialize().await.unwrap();
    h.session.teardown().await.unwrap();

    assert_eq!(h.session.state().await, SessionState::Closed);
    let emitted = h.realtime.emitted().await;
    assert!(emitted.contains(&("leave-chat".into(), "chat-1".into())));

    // Exactly once per initialize.
    assert!(h.session.teardown().await.is_err());
    // Closed is terminal: no re-initialize.
    assert!(h.session.initialize().await.is_err());
}

#[tokio::test]
async fn events_after_teardown_are_dropped() {
    let h = harness();
    h.session.initialize().await.unwrap();
    h.session.teardown().await.unwrap();

    // The professional room is still registered in the mock, but the pump
    // is cancelled: nothing may mutate the closed session.
    h.realtime
        .inject_professional_event(
            USER,
            RealtimeEvent::NewMessage(fixtures::message("m-z", "chat-1", CLIENT, "oi", 9000)),
        )
        .await;
    settle().await;

    assert!(h.session.timeline().await.is_empty());
}
