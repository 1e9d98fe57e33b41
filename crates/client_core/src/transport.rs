use reqwest::Client;
use serde_json::Value;
use shared::{
    error::ErrorProbe,
    protocol::{SummarizeResponse, SUMMARIZE_ROUTE},
};
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, GENERIC_SERVER_FAILURE};

/// Decodes the buffer into the payload that will be posted. Blank input and
/// undecodable input are rejected here, before any request exists.
pub fn parse_payload(raw: &str) -> Result<Value, ClientError> {
    if raw.trim().is_empty() {
        return Err(ClientError::EmptyInput);
    }
    serde_json::from_str(raw).map_err(|err| ClientError::MalformedInput(err.to_string()))
}

/// Resolves `/summarize` under `server_url`, keeping any base path.
pub fn summarize_endpoint(server_url: &str) -> Result<Url, url::ParseError> {
    let mut base = Url::parse(server_url.trim())?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(SUMMARIZE_ROUTE.trim_start_matches('/'))
}

/// Message for a non-2xx reply: the body's `error` field when present,
/// otherwise a fixed fallback.
pub fn server_failure_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorProbe>(body)
        .ok()
        .and_then(|probe| probe.error)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| GENERIC_SERVER_FAILURE.to_string())
}

/// Performs the single summarize round trip. Holds no UI state.
#[derive(Debug, Clone)]
pub struct SubmissionController {
    http: Client,
    endpoint: Url,
}

impl SubmissionController {
    pub fn new(server_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            http: Client::new(),
            endpoint: summarize_endpoint(server_url)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Posts `payload` as the JSON body, unwrapped. One attempt, transport
    /// default timeouts.
    pub async fn send(&self, payload: &Value) -> Result<SummarizeResponse, ClientError> {
        debug!(endpoint = %self.endpoint, "posting summarize request");
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(|err| ClientError::NetworkFailure(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| ClientError::NetworkFailure(err.to_string()))?;

        if !status.is_success() {
            let message = server_failure_message(&body);
            warn!(status = status.as_u16(), %message, "summarize request failed");
            return Err(ClientError::Server(message));
        }

        serde_json::from_slice::<SummarizeResponse>(&body)
            .map_err(|err| ClientError::MalformedResponse(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_is_empty_not_malformed() {
        assert_eq!(parse_payload(""), Err(ClientError::EmptyInput));
        assert_eq!(parse_payload(" \n\t "), Err(ClientError::EmptyInput));
    }

    #[test]
    fn undecodable_input_is_malformed() {
        assert!(matches!(
            parse_payload("{\"hosts\": "),
            Err(ClientError::MalformedInput(_))
        ));
    }

    #[test]
    fn endpoint_keeps_base_path() {
        assert_eq!(
            summarize_endpoint("http://127.0.0.1:5000").expect("url").as_str(),
            "http://127.0.0.1:5000/summarize"
        );
        assert_eq!(
            summarize_endpoint("https://example.test/tools/").expect("url").as_str(),
            "https://example.test/tools/summarize"
        );
        assert_eq!(
            summarize_endpoint("https://example.test/tools").expect("url").as_str(),
            "https://example.test/tools/summarize"
        );
        assert!(summarize_endpoint("not a url").is_err());
    }

    #[test]
    fn failure_message_prefers_error_field() {
        assert_eq!(
            server_failure_message(br#"{"error": "rate limited"}"#),
            "rate limited"
        );
        assert_eq!(server_failure_message(b""), GENERIC_SERVER_FAILURE);
        assert_eq!(server_failure_message(b"<html>502</html>"), GENERIC_SERVER_FAILURE);
        assert_eq!(server_failure_message(br#"{"error": ""}"#), GENERIC_SERVER_FAILURE);
        assert_eq!(server_failure_message(br#"{"error": 42}"#), GENERIC_SERVER_FAILURE);
    }
}
