// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device media capture traits (microphone, photo library, camera).

use async_trait::async_trait;

use crate::error::OficioError;

/// Interface to the device audio capture service.
///
/// Exactly one capture may be active at a time; the recording state machine
/// enforces that, so implementations may assume begin/finish/discard are
/// called in order.
#[async_trait]
pub trait AudioRecorder {
    /// Requests microphone permission and begins capture.
    ///
    /// Returns `PermissionDenied` on refusal, in which case no capture is
    /// active.
    async fn begin(&self) -> Result<(), OficioError>;

    /// Stops capture and returns the recorded artifact reference.
    async fn finish(&self) -> Result<String, OficioError>;

    /// Stops capture and discards the artifact.
    async fn discard(&self) -> Result<(), OficioError>;
}

/// Where an image attachment comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Library,
    Camera,
}

/// Interface to the device image pick/capture service.
#[async_trait]
pub trait ImagePicker {
    /// Requests the relevant permission, then picks or captures an image.
    ///
    /// `Ok(None)` means the user cancelled; `PermissionDenied` means access
    /// was refused. Either way no artifact is produced.
    async fn pick(&self, source: ImageSource) -> Result<Option<String>, OficioError>;
}
