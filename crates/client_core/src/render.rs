use std::panic::{catch_unwind, AssertUnwindSafe};

use pulldown_cmark::{html, Event, Options, Parser};
use shared::protocol::MetricsSummary;
use thiserror::Error;
use tracing::warn;

use crate::state::UiState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricRow {
    pub label: &'static str,
    pub value: String,
}

/// Formats server-computed metrics for display. No aggregation happens here:
/// the vulnerability row shows the set's size and countries are joined.
pub fn metric_rows(metrics: &MetricsSummary) -> Vec<MetricRow> {
    let row = |label, value: String| MetricRow { label, value };
    vec![
        row("Total Hosts", metrics.total_hosts.to_string()),
        row("Critical Risk", metrics.critical_risk.to_string()),
        row("High Risk", metrics.high_risk.to_string()),
        row("Services", metrics.services_count.to_string()),
        row(
            "Unique Vulnerabilities",
            metrics.unique_vulnerabilities.len().to_string(),
        ),
        row("Countries", metrics.countries.join(", ")),
    ]
}

#[derive(Debug, Error)]
#[error("markdown conversion failed: {0}")]
pub struct ConversionError(pub String);

pub trait MarkdownConverter: Send + Sync {
    fn to_markup(&self, markdown: &str) -> Result<String, ConversionError>;
}

/// CommonMark with the table and strikethrough extensions. Raw HTML in the
/// source is emitted as escaped text, never as markup.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommonMark;

impl MarkdownConverter for CommonMark {
    fn to_markup(&self, markdown: &str) -> Result<String, ConversionError> {
        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
        let events = Parser::new_ext(markdown, options).map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        });
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, events);
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrative {
    pub text: String,
    /// Converted markup; `None` means the raw text is shown unformatted.
    pub markup: Option<String>,
}

impl Narrative {
    pub fn is_formatted(&self) -> bool {
        self.markup.is_some()
    }
}

pub struct NarrativeRenderer {
    converter: Option<Box<dyn MarkdownConverter>>,
}

impl NarrativeRenderer {
    pub fn new(converter: Box<dyn MarkdownConverter>) -> Self {
        Self {
            converter: Some(converter),
        }
    }

    /// A renderer with no converter; every narrative falls back to raw text.
    pub fn plain() -> Self {
        Self { converter: None }
    }

    /// Never fails: a missing, erroring or panicking converter yields the raw
    /// text.
    pub fn render(&self, text: &str) -> Narrative {
        let markup = self.converter.as_ref().and_then(|converter| {
            match catch_unwind(AssertUnwindSafe(|| converter.to_markup(text))) {
                Ok(Ok(markup)) => Some(markup),
                Ok(Err(err)) => {
                    warn!(%err, "showing narrative as raw text");
                    None
                }
                Err(_) => {
                    warn!("markdown converter panicked; showing narrative as raw text");
                    None
                }
            }
        });
        Narrative {
            text: text.to_string(),
            markup,
        }
    }
}

impl Default for NarrativeRenderer {
    fn default() -> Self {
        Self::new(Box::new(CommonMark))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsPanel {
    pub metrics: Vec<MetricRow>,
    pub narrative: Narrative,
}

/// Panel visibility derived from a single `UiState`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
    pub loading: bool,
    pub results: Option<ResultsPanel>,
    pub error: Option<String>,
}

pub fn render(state: &UiState, narrative: &NarrativeRenderer) -> Screen {
    match state {
        UiState::Idle => Screen::default(),
        UiState::Loading => Screen {
            loading: true,
            ..Screen::default()
        },
        UiState::Success(response) => Screen {
            results: Some(ResultsPanel {
                metrics: metric_rows(&response.metrics),
                narrative: narrative.render(&response.summary),
            }),
            ..Screen::default()
        },
        UiState::Error(err) => Screen {
            error: Some(err.to_string()),
            ..Screen::default()
        },
    }
}

impl Screen {
    /// Standalone HTML page for the current screen.
    pub fn to_html(&self) -> String {
        let mut body = String::new();
        if self.loading {
            body.push_str("<div class=\"loading\">Analyzing host data&hellip;</div>\n");
        }
        if let Some(message) = &self.error {
            body.push_str(&format!(
                "<div class=\"error\" role=\"alert\">{}</div>\n",
                escape_html(message)
            ));
        }
        if let Some(results) = &self.results {
            body.push_str("<section class=\"metrics\">\n");
            for row in &results.metrics {
                body.push_str(&format!(
                    "  <div class=\"metric\"><span class=\"label\">{}</span><span class=\"value\">{}</span></div>\n",
                    escape_html(row.label),
                    escape_html(&row.value)
                ));
            }
            body.push_str("</section>\n<section class=\"summary\">\n");
            match &results.narrative.markup {
                Some(markup) => body.push_str(markup),
                None => body.push_str(&format!(
                    "<pre>{}</pre>\n",
                    escape_html(&results.narrative.text)
                )),
            }
            body.push_str("</section>\n");
        }

        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>Host Scan Summary</title>\n</head>\n<body>\n<h1>Host Scan Summary</h1>\n{body}</body>\n</html>\n"
        )
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Writing into a String cannot fail.
    let _ = pulldown_cmark_escape::escape_html(&mut out, text);
    out
}
