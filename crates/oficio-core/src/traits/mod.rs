// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! The chat core touches nothing stateful directly: the backend API, the
//! realtime channel, and device media capture are all reached through the
//! traits below, using `#[async_trait]` for dynamic dispatch compatibility.

pub mod api;
pub mod media;
pub mod realtime;

// Re-export all traits at the traits module level for convenience.
pub use api::MarketplaceApi;
pub use media::{AudioRecorder, ImagePicker};
pub use realtime::RealtimeChannel;
