use std::path::{Path, PathBuf};

use mime_guess::mime;
use serde_json::Value;
use tracing::debug;

use crate::error::ClientError;

/// Holds the text that the next submission will send, whether typed in or
/// loaded from a file.
#[derive(Debug, Default)]
pub struct InputAcquirer {
    buffer: String,
    selected_file: Option<PathBuf>,
}

impl InputAcquirer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn selected_file(&self) -> Option<&Path> {
        self.selected_file.as_deref()
    }

    /// Replaces the buffer verbatim. Validation waits for submission.
    pub fn set_from_text(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    /// Loads a `.json` file and stores its pretty-printed form. The buffer is
    /// left as it was on any failure, and non-JSON files are never opened.
    pub async fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<(), ClientError> {
        let path = path.as_ref();
        if !is_json_file(path) {
            let guessed = mime_guess::from_path(path)
                .first()
                .map(|m| m.essence_str().to_string())
                .unwrap_or_else(|| "unknown type".to_string());
            return Err(ClientError::UnsupportedFileType(guessed));
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| ClientError::FileRead(err.to_string()))?;
        let decoded: Value = serde_json::from_str(&contents)
            .map_err(|err| ClientError::MalformedInput(err.to_string()))?;
        let pretty = serde_json::to_string_pretty(&decoded)
            .map_err(|err| ClientError::MalformedInput(err.to_string()))?;

        debug!(path = %path.display(), bytes = pretty.len(), "loaded input file");
        self.buffer = pretty;
        self.selected_file = Some(path.to_path_buf());
        Ok(())
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.selected_file = None;
    }
}

pub fn is_json_file(path: &Path) -> bool {
    mime_guess::from_path(path)
        .iter()
        .any(|guess| guess == mime::APPLICATION_JSON)
}

#[cfg(test)]
#[path = "tests/input_tests.rs"]
mod tests;
