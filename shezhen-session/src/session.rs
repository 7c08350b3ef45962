//! Per-user analysis session.
//!
//! Mirrors what the page shows: the selected image, the current status, and
//! either the last result or a user-facing error message. At most one
//! analysis runs per session; a second request while one is outstanding is
//! refused rather than queued.

use std::sync::Arc;

use parking_lot::Mutex;
use shezhen_core::{EncodedImage, ImageBlob, InvalidInput, TcmAnalysis};
use shezhen_llm::{AnalysisClient, AnalysisFailure};
use thiserror::Error;
use tracing::{debug, warn};

use crate::entry;
use crate::messages;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisStatus {
    /// Nothing running; an image may or may not be selected.
    #[default]
    Idle,
    /// A request is outstanding.
    Analyzing,
    /// The last request produced a result.
    Success,
    /// The last request failed.
    Error,
}

/// Why a session operation was refused or failed.
#[derive(Debug, Error)]
pub enum SessionError {
    /// `request_analysis` was called before any image was selected.
    #[error("No image selected")]
    NoImage,

    /// An analysis is already running for this session.
    #[error("An analysis is already in progress")]
    Busy,

    /// The selected file was rejected.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    /// The analysis itself failed.
    #[error(transparent)]
    Analysis(#[from] AnalysisFailure),
}

#[derive(Debug, Default)]
struct SessionState {
    image: Option<EncodedImage>,
    status: AnalysisStatus,
    result: Option<TcmAnalysis>,
    error_message: Option<&'static str>,
}

/// Shared, cloneable session handle. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    client: AnalysisClient,
    state: Arc<Mutex<SessionState>>,
}

impl AnalysisSession {
    /// Create an idle session with no image.
    #[must_use]
    pub fn new(client: AnalysisClient) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    /// Encode and select a new image, clearing any previous result.
    ///
    /// On rejection the session is left exactly as it was.
    ///
    /// # Errors
    /// `Busy` while an analysis is running; `InvalidInput` for unusable files.
    pub fn select_image(&self, blob: &ImageBlob) -> Result<EncodedImage, SessionError> {
        if self.status() == AnalysisStatus::Analyzing {
            return Err(SessionError::Busy);
        }
        let image = entry::select_image(blob).inspect_err(|e| {
            warn!(name = ?blob.name, "image selection rejected: {e}");
        })?;

        let mut state = self.state.lock();
        if state.status == AnalysisStatus::Analyzing {
            return Err(SessionError::Busy);
        }
        state.image = Some(image.clone());
        state.result = None;
        state.error_message = None;
        state.status = AnalysisStatus::Idle;
        debug!(media_type = image.media_type(), "image selected");
        Ok(image)
    }

    /// Analyse the selected image.
    ///
    /// The image stays selected afterwards, so a failed attempt can be
    /// re-submitted by calling this again. Dropping the returned future
    /// before it completes (a timeout, an aborted task) leaves the session in
    /// `Error` with the generic message.
    ///
    /// # Errors
    /// `NoImage`, `Busy`, or the classified analysis failure.
    pub async fn request_analysis(&self) -> Result<TcmAnalysis, SessionError> {
        let image = {
            let mut state = self.state.lock();
            let Some(image) = state.image.clone() else {
                return Err(SessionError::NoImage);
            };
            if state.status == AnalysisStatus::Analyzing {
                return Err(SessionError::Busy);
            }
            state.status = AnalysisStatus::Analyzing;
            state.error_message = None;
            image
        };

        let in_flight = InFlight::new(&self.state);
        let outcome = entry::request_analysis(&self.client, &image).await;
        in_flight.finish();

        let mut state = self.state.lock();
        match outcome {
            Ok(analysis) => {
                state.status = AnalysisStatus::Success;
                state.result = Some(analysis.clone());
                Ok(analysis)
            }
            Err(e) => {
                state.status = AnalysisStatus::Error;
                state.result = None;
                state.error_message = Some(messages::user_message(e.kind()));
                Err(e.into())
            }
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> AnalysisStatus {
        self.state.lock().status
    }

    /// The last successful result, if the session is in `Success`.
    #[must_use]
    pub fn result(&self) -> Option<TcmAnalysis> {
        self.state.lock().result.clone()
    }

    /// The message to show, if the session is in `Error`.
    #[must_use]
    pub fn error_message(&self) -> Option<&'static str> {
        self.state.lock().error_message
    }

    /// The selected image, if any.
    #[must_use]
    pub fn current_image(&self) -> Option<EncodedImage> {
        self.state.lock().image.clone()
    }
}

/// Marks the session's outstanding call. If dropped before `finish`, the call
/// was cancelled and the session moves out of `Analyzing`.
struct InFlight<'a> {
    state: &'a Mutex<SessionState>,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a Mutex<SessionState>) -> Self {
        Self { state, armed: true }
    }

    fn finish(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock();
        if state.status == AnalysisStatus::Analyzing {
            state.status = AnalysisStatus::Error;
            state.result = None;
            state.error_message = Some(messages::GENERIC_FAILURE);
            warn!("analysis cancelled before completion");
        }
    }
}
