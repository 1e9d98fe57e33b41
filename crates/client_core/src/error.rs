use thiserror::Error;

/// Shown when a failed response carries no usable `error` message.
pub const GENERIC_SERVER_FAILURE: &str = "Failed to generate summary. Please try again.";

/// Every way a submission or file load can fail. Each variant's display text
/// is what the error panel shows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Please provide JSON data to analyze.")]
    EmptyInput,
    #[error("Invalid JSON format: {0}")]
    MalformedInput(String),
    #[error("Please select a JSON file (got {0}).")]
    UnsupportedFileType(String),
    #[error("Could not read file: {0}")]
    FileRead(String),
    #[error("{0}")]
    NetworkFailure(String),
    #[error("{0}")]
    Server(String),
    #[error("Unexpected response from server: {0}")]
    MalformedResponse(String),
}
