use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Upstream,
    Unavailable,
    Internal,
}

/// Failure envelope returned by the server on any non-2xx response.
///
/// Only `error` is part of the client contract; `code` is informational and
/// may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: Some(code),
        }
    }
}

/// Lenient view of an error response; every field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorProbe {
    #[serde(default)]
    pub error: Option<String>,
}
