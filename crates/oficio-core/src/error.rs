// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Oficio marketplace client.

use thiserror::Error;

/// The primary error type used across all Oficio collaborator traits and core operations.
///
/// Every failure path in the chat core maps onto one of these variants; nothing
/// here is fatal. Callers at the coordinator boundary turn these into
/// user-facing notifications and restore local state where applicable.
#[derive(Debug, Error)]
pub enum OficioError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Backend API errors (request failure, non-success status, decode failure).
    #[error("api error: {message}")]
    Api {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A requested resource does not exist server-side.
    ///
    /// For the chat check flow a 404 is a legitimate "no chat yet" result and
    /// is converted to `Ok(None)` before it ever reaches a caller.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// A device capability (microphone, photo library, camera) was refused.
    #[error("permission denied: {capability}")]
    PermissionDenied { capability: String },

    /// Realtime channel errors (connection failure, emit failure, closed room).
    #[error("realtime error: {message}")]
    Realtime {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Chat session lifecycle violations (operation on an uninitialized or closed session).
    #[error("session error: {0}")]
    Session(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OficioError {
    /// Wraps an arbitrary error source as an API failure.
    pub fn api(message: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        OficioError::Api {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// True if this error represents a device permission refusal.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, OficioError::PermissionDenied { .. })
    }
}
