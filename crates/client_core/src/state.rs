use shared::protocol::SummarizeResponse;

use crate::error::ClientError;

/// The one active phase of the submit workflow. Result and error payloads
/// live inside their variants, so a panel can never show without its data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UiState {
    #[default]
    Idle,
    Loading,
    Success(SummarizeResponse),
    Error(ClientError),
}

impl UiState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success(_) => "success",
            Self::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The submission ran to a terminal state (Success or Error).
    Completed,
    /// Another submission was in flight; nothing was sent and the state is
    /// unchanged.
    Ignored,
}
