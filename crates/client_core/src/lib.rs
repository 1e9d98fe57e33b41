use std::path::Path;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

pub mod error;
pub mod input;
pub mod render;
pub mod state;
pub mod transport;

pub use error::ClientError;
pub use input::InputAcquirer;
pub use render::{render, NarrativeRenderer, Screen};
pub use state::{SubmitOutcome, UiState};
pub use transport::SubmissionController;

/// Input buffer, submission round trip and UI state behind one handle.
///
/// All methods take `&self`, so the workflow can be shared through an `Arc`.
/// A submission started while another is loading is ignored.
pub struct SummaryWorkflow {
    input: Mutex<InputAcquirer>,
    controller: SubmissionController,
    state: RwLock<UiState>,
    narrative: NarrativeRenderer,
}

impl SummaryWorkflow {
    pub fn new(server_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::with_parts(
            SubmissionController::new(server_url)?,
            NarrativeRenderer::default(),
        ))
    }

    pub fn with_parts(controller: SubmissionController, narrative: NarrativeRenderer) -> Self {
        Self {
            input: Mutex::new(InputAcquirer::new()),
            controller,
            state: RwLock::new(UiState::Idle),
            narrative,
        }
    }

    pub async fn buffer(&self) -> String {
        self.input.lock().await.buffer().to_string()
    }

    pub async fn state(&self) -> UiState {
        self.state.read().await.clone()
    }

    pub async fn screen(&self) -> Screen {
        render(&*self.state.read().await, &self.narrative)
    }

    pub async fn set_from_text(&self, text: impl Into<String>) {
        self.input.lock().await.set_from_text(text);
    }

    /// A failed load is shown on the error panel unless a submission is
    /// loading, in which case only the returned error reports it.
    pub async fn load_from_file(&self, path: impl AsRef<Path>) -> Result<(), ClientError> {
        let result = self.input.lock().await.load_from_file(path).await;
        if let Err(err) = &result {
            warn!(%err, "input file rejected");
            let mut state = self.state.write().await;
            if !state.is_loading() {
                *state = UiState::Error(err.clone());
            }
        }
        result
    }

    /// Clears the input and returns to Idle. A request already in flight is
    /// not cancelled and still sets its outcome when it completes.
    pub async fn reset(&self) {
        self.input.lock().await.reset();
        let mut state = self.state.write().await;
        if !state.is_loading() {
            *state = UiState::Idle;
        }
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let raw = self.buffer().await;

        let payload = {
            let mut state = self.state.write().await;
            if state.is_loading() {
                debug!("submission already in flight; ignoring");
                return SubmitOutcome::Ignored;
            }
            match transport::parse_payload(&raw) {
                Ok(payload) => {
                    *state = UiState::Loading;
                    payload
                }
                Err(err) => {
                    warn!(%err, "submission rejected before sending");
                    *state = UiState::Error(err);
                    return SubmitOutcome::Completed;
                }
            }
        };

        let next = match self.controller.send(&payload).await {
            Ok(response) => {
                info!(
                    hosts = response.metrics.total_hosts,
                    "summary received"
                );
                UiState::Success(response)
            }
            Err(err) => {
                warn!(%err, "submission failed");
                UiState::Error(err)
            }
        };
        debug!(state = next.label(), "submission finished");
        *self.state.write().await = next;
        SubmitOutcome::Completed
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
