// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice recording state machine.
//!
//! States: Idle -> Recording -> {Stopped, Cancelled} -> Idle. Elapsed time
//! advances only through [`VoiceRecorder::tick`], driven by the session's
//! 1-second interval, so tests control the clock. Image attachment is a
//! separate one-shot picker flow and never touches these states.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use oficio_core::OficioError;
use oficio_core::traits::media::AudioRecorder;

/// States of the recording machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    /// No capture active.
    Idle,
    /// Microphone capture in progress.
    Recording,
    /// Capture finalized with an artifact; awaiting reset.
    Stopped,
    /// Capture discarded; awaiting reset.
    Cancelled,
}

impl std::fmt::Display for RecordingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordingState::Idle => write!(f, "idle"),
            RecordingState::Recording => write!(f, "recording"),
            RecordingState::Stopped => write!(f, "stopped"),
            RecordingState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A finalized capture ready to be sent as an audio message.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedRecording {
    pub media_ref: String,
    pub duration_secs: u32,
}

/// Recording state machine over the device audio collaborator.
pub struct VoiceRecorder {
    device: Arc<dyn AudioRecorder + Send + Sync>,
    state: RecordingState,
    elapsed_secs: u32,
    started_at_ms: Option<i64>,
}

impl VoiceRecorder {
    pub fn new(device: Arc<dyn AudioRecorder + Send + Sync>) -> Self {
        Self {
            device,
            state: RecordingState::Idle,
            elapsed_secs: 0,
            started_at_ms: None,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    /// When the active capture began, while one is active.
    pub fn started_at_ms(&self) -> Option<i64> {
        self.started_at_ms
    }

    /// Requests microphone permission and begins capture.
    ///
    /// Permitted only from Idle. On permission denial the machine stays
    /// Idle and the error surfaces to the caller.
    pub async fn start(&mut self) -> Result<(), OficioError> {
        if self.state != RecordingState::Idle {
            return Err(OficioError::Session(format!(
                "cannot start recording while {}",
                self.state
            )));
        }

        self.device.begin().await?;

        self.state = RecordingState::Recording;
        self.elapsed_secs = 0;
        self.started_at_ms = Some(Utc::now().timestamp_millis());
        debug!("recording started");
        Ok(())
    }

    /// Advances elapsed time by one second. No-op outside Recording.
    pub fn tick(&mut self) {
        if self.state == RecordingState::Recording {
            self.elapsed_secs += 1;
        }
    }

    /// Stops capture. Permitted only from Recording.
    ///
    /// With zero elapsed seconds nothing was captured: the artifact is
    /// discarded and the machine returns straight to Idle with no message.
    /// Otherwise the artifact is finalized and returned for sending.
    pub async fn stop(&mut self) -> Result<Option<FinishedRecording>, OficioError> {
        if self.state != RecordingState::Recording {
            return Err(OficioError::Session(format!(
                "cannot stop recording while {}",
                self.state
            )));
        }

        if self.elapsed_secs == 0 {
            if let Err(e) = self.device.discard().await {
                warn!(error = %e, "discarding empty recording failed");
            }
            self.state = RecordingState::Idle;
            self.started_at_ms = None;
            debug!("recording stopped with no audio captured");
            return Ok(None);
        }

        let media_ref = match self.device.finish().await {
            Ok(media_ref) => media_ref,
            Err(e) => {
                // Finalization failed: abort to the pre-call state with
                // nothing produced.
                self.state = RecordingState::Idle;
                self.started_at_ms = None;
                self.elapsed_secs = 0;
                return Err(e);
            }
        };

        let duration_secs = self.elapsed_secs;
        self.state = RecordingState::Stopped;
        debug!(duration_secs, "recording finalized");
        Ok(Some(FinishedRecording {
            media_ref,
            duration_secs,
        }))
    }

    /// Discards the capture. Permitted only from Recording. Emits nothing.
    pub async fn cancel(&mut self) -> Result<(), OficioError> {
        if self.state != RecordingState::Recording {
            return Err(OficioError::Session(format!(
                "cannot cancel recording while {}",
                self.state
            )));
        }

        if let Err(e) = self.device.discard().await {
            warn!(error = %e, "discarding cancelled recording failed");
        }
        self.state = RecordingState::Cancelled;
        debug!("recording cancelled");
        Ok(())
    }

    /// Returns the machine to Idle from a terminal state. Called by the
    /// session once the stop/cancel outcome has been dispatched.
    pub fn reset(&mut self) {
        if matches!(
            self.state,
            RecordingState::Stopped | RecordingState::Cancelled
        ) {
            self.state = RecordingState::Idle;
            self.elapsed_secs = 0;
            self.started_at_ms = None;
        }
    }
}
