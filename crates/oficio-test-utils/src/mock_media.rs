// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock device media collaborators (microphone and image picker).

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use oficio_core::OficioError;
use oficio_core::traits::media::{AudioRecorder, ImagePicker, ImageSource};

/// A scripted microphone for tests.
pub struct MockRecorder {
    deny: AtomicBool,
    fail_finish: AtomicBool,
    begun: AtomicUsize,
    finished: AtomicUsize,
    discarded: AtomicUsize,
}

impl MockRecorder {
    pub fn new() -> Self {
        Self {
            deny: AtomicBool::new(false),
            fail_finish: AtomicBool::new(false),
            begun: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            discarded: AtomicUsize::new(0),
        }
    }

    /// Makes every subsequent `begin` report a permission denial.
    pub fn deny_permission(&self) {
        self.deny.store(true, Ordering::SeqCst);
    }

    /// Makes every subsequent `finish` fail.
    pub fn fail_finish(&self) {
        self.fail_finish.store(true, Ordering::SeqCst);
    }

    /// The artifact reference every successful `finish` returns.
    pub fn artifact(&self) -> String {
        "file:///mock/recording.m4a".to_string()
    }

    pub fn begun(&self) -> usize {
        self.begun.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn discarded(&self) -> usize {
        self.discarded.load(Ordering::SeqCst)
    }
}

impl Default for MockRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioRecorder for MockRecorder {
    async fn begin(&self) -> Result<(), OficioError> {
        if self.deny.load(Ordering::SeqCst) {
            return Err(OficioError::PermissionDenied {
                capability: "microphone".into(),
            });
        }
        self.begun.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn finish(&self) -> Result<String, OficioError> {
        if self.fail_finish.load(Ordering::SeqCst) {
            return Err(OficioError::Internal("mock finish failure".into()));
        }
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(self.artifact())
    }

    async fn discard(&self) -> Result<(), OficioError> {
        self.discarded.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// What one `pick` call should yield.
#[derive(Debug, Clone)]
pub enum PickOutcome {
    /// The user picked/captured an image with this reference.
    Image(String),
    /// The user cancelled.
    Cancel,
    /// The device refused permission.
    Deny,
}

/// A scripted image picker for tests.
///
/// Outcomes are consumed in push order; with the queue empty every pick
/// reads as a user cancellation.
pub struct MockPicker {
    outcomes: Mutex<VecDeque<PickOutcome>>,
    requests: Mutex<Vec<ImageSource>>,
}

impl MockPicker {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, outcome: PickOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    /// Sources requested so far, in order.
    pub fn requests(&self) -> Vec<ImageSource> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockPicker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImagePicker for MockPicker {
    async fn pick(&self, source: ImageSource) -> Result<Option<String>, OficioError> {
        self.requests.lock().unwrap().push(source);
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PickOutcome::Cancel);
        match outcome {
            PickOutcome::Image(media_ref) => Ok(Some(media_ref)),
            PickOutcome::Cancel => Ok(None),
            PickOutcome::Deny => Err(OficioError::PermissionDenied {
                capability: match source {
                    ImageSource::Library => "photo library".into(),
                    ImageSource::Camera => "camera".into(),
                },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recorder_denial_is_permission_error() {
        let recorder = MockRecorder::new();
        recorder.deny_permission();
        assert!(recorder.begin().await.unwrap_err().is_permission_denied());
        assert_eq!(recorder.begun(), 0);
    }

    #[tokio::test]
    async fn picker_consumes_outcomes_in_order() {
        let picker = MockPicker::new();
        picker.push(PickOutcome::Image("file:///a.jpg".into()));
        picker.push(PickOutcome::Deny);

        assert_eq!(
            picker.pick(ImageSource::Library).await.unwrap().as_deref(),
            Some("file:///a.jpg")
        );
        assert!(picker
            .pick(ImageSource::Camera)
            .await
            .unwrap_err()
            .is_permission_denied());
        // Queue exhausted: reads as cancel.
        assert!(picker.pick(ImageSource::Library).await.unwrap().is_none());
        assert_eq!(
            picker.requests(),
            vec![ImageSource::Library, ImageSource::Camera, ImageSource::Library]
        );
    }
}
