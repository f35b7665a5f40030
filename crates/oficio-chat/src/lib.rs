// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat session synchronization core for the Oficio marketplace client.
//!
//! Reconciles an optimistic local message list with server-confirmed
//! messages and a mutable budget delivered over the realtime channel,
//! producing a single chronologically ordered, duplicate-free timeline,
//! while coordinating the recording/attachment state machine.
//!
//! The [`session::ChatSession`] coordinator is the public contract the
//! presentation layer consumes; [`inbox::ChatInbox`] backs the chat list
//! screen. Everything stateful outside this process is reached through the
//! collaborator traits in `oficio-core`.

pub mod budget;
pub mod inbox;
pub mod recording;
pub mod session;
pub mod store;
pub mod timeline;

pub use budget::BudgetController;
pub use inbox::ChatInbox;
pub use recording::{FinishedRecording, RecordingState, VoiceRecorder};
pub use session::{ChatSession, SessionParams, SessionState};
pub use store::MessageStore;
pub use timeline::{TimelineItem, TimelineKind, merge_timeline};
