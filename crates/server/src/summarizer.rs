use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::Settings;

const SYSTEM_PROMPT: &str = "You are a cybersecurity analyst specializing in host data analysis.";

const ANALYST_INSTRUCTIONS: &str = r#"You are a security analyst summarizing Censys host data. Write a concise report that works for technical and non-technical readers.

STRUCTURE:
1. Executive Summary (2-3 plain-language sentences)
2. Quick Metrics (bulleted counts)
3. Overall Risk Assessment (concise, no repetition)
4. Key Vulnerabilities (markdown table)
5. Services and Security Issues (markdown table, one row per host)
6. Notable Observations (3-5 short bullets)
7. Recommended Next Actions (3-5 bullets)

EXECUTIVE SUMMARY:
- Open with a high-level overview in plain language.
- Lead with the most critical findings (malware, exploitable flaws) and avoid jargon.

ACCESSIBILITY:
- Explain technical terms briefly in parentheses, e.g. "Cobalt Strike (a remote-control hacking tool)".
- Keep CVE IDs and ports in the tables; summarize them simply in prose.

LENGTH:
- About 250-300 words excluding tables.
- Merge related points and detail each CVE only once, in its table.

OUTPUT FORMAT (Markdown):
- Executive Summary
- Quick Metrics (Total Hosts, Critical Risk, High Risk, Services, Unique Vulnerabilities, Countries)
- Overall Risk Assessment
- Key Vulnerabilities (CVE ID | Severity | CVSS | Affected Hosts | Service/Version | Brief Note)
- Services and Security Issues (Host IP | Services & Ports | Key Issues/Notes)
- Notable Observations
- Recommended Next Actions

TONE: professional and approachable."#;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("PERPLEXITY_API_KEY is not configured")]
    MissingApiKey,
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("{status} - {body}")]
    Status { status: u16, body: String },
    #[error("AI provider reply carried no message content")]
    MalformedReply,
}

/// Turns submitted host data into a markdown narrative.
#[async_trait]
pub trait SummaryProvider: Send + Sync {
    async fn summarize(&self, host_data: &Value) -> Result<String, SummaryError>;
}

pub fn build_prompt(host_data: &Value) -> String {
    let pretty = serde_json::to_string_pretty(host_data).unwrap_or_else(|_| host_data.to_string());
    format!("{ANALYST_INSTRUCTIONS}\n\nHost Data:\n{pretty}\n")
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// OpenAI-style `chat/completions` client; Perplexity by default.
pub struct ChatCompletionsProvider {
    http: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl ChatCompletionsProvider {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            http: Client::new(),
            api_url: settings.llm_api_url.clone(),
            api_key: settings.llm_api_key.clone(),
            model: settings.llm_model.clone(),
            max_tokens: settings.llm_max_tokens,
            temperature: settings.llm_temperature,
        }
    }
}

#[async_trait]
impl SummaryProvider for ChatCompletionsProvider {
    async fn summarize(&self, host_data: &Value) -> Result<String, SummaryError> {
        let api_key = self.api_key.as_deref().ok_or(SummaryError::MissingApiKey)?;
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: build_prompt(host_data),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        debug!(url = %self.api_url, model = %self.model, "requesting chat completion");
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummaryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatReply = response
            .json()
            .await
            .map_err(|_| SummaryError::MalformedReply)?;
        reply
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or(SummaryError::MalformedReply)
    }
}

#[cfg(test)]
#[path = "tests/summarizer_tests.rs"]
mod tests;
