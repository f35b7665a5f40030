// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Oficio marketplace client.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Oficio workspace. The chat core and the
//! concrete API/realtime/media adapters all program against what is defined
//! here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::OficioError;
pub use types::{
    Budget, BudgetStatus, Chat, ChatId, ChatRole, Message, MessageId, MessageKind, Party,
    RealtimeEvent, ServiceSummary,
};

// Re-export the collaborator traits at crate root.
pub use traits::api::{ChatKey, MarketplaceApi, NewBudget, OutgoingMessage};
pub use traits::media::{AudioRecorder, ImagePicker, ImageSource};
pub use traits::realtime::{EventReceiver, RealtimeChannel};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oficio_error_has_all_variants() {
        // Verify all 7 error variants exist and can be constructed.
        let _config = OficioError::Config("test".into());
        let _api = OficioError::Api {
            message: "test".into(),
            source: None,
        };
        let _not_found = OficioError::NotFound {
            resource: "chat".into(),
        };
        let _denied = OficioError::PermissionDenied {
            capability: "microphone".into(),
        };
        let _realtime = OficioError::Realtime {
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _session = OficioError::Session("test".into());
        let _internal = OficioError::Internal("test".into());
    }

    #[test]
    fn error_display_includes_context() {
        let err = OficioError::PermissionDenied {
            capability: "camera".into(),
        };
        assert_eq!(err.to_string(), "permission denied: camera");
        assert!(err.is_permission_denied());

        let err = OficioError::NotFound {
            resource: "chat for key".into(),
        };
        assert!(!err.is_permission_denied());
        assert!(err.to_string().contains("chat for key"));
    }

    #[test]
    fn outgoing_message_constructors() {
        let text = OutgoingMessage::text("pro-1", "hello");
        assert_eq!(text.kind, MessageKind::Text);
        assert_eq!(text.content.as_deref(), Some("hello"));
        assert!(text.media_ref.is_none());

        let image = OutgoingMessage::image("pro-1", "file:///photo.jpg");
        assert_eq!(image.kind, MessageKind::Image);
        assert_eq!(image.media_ref.as_deref(), Some("file:///photo.jpg"));

        let audio = OutgoingMessage::audio("pro-1", "file:///note.m4a", 12);
        assert_eq!(audio.kind, MessageKind::Audio);
        assert_eq!(audio.audio_duration_secs, Some(12));
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Compile-time check that the collaborator traits are accessible
        // through the public API.
        fn _assert_api<T: MarketplaceApi>() {}
        fn _assert_realtime<T: RealtimeChannel>() {}
        fn _assert_recorder<T: AudioRecorder>() {}
        fn _assert_picker<T: ImagePicker>() {}
    }
}
