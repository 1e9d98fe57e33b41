use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{Screen, SummaryWorkflow};
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Sends host-scan JSON to a summarizer server and shows the metrics and
/// narrative it returns.
#[derive(Parser, Debug)]
#[command(name = "desktop", version)]
struct Args {
    /// Base URL of the summarizer server.
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    server_url: String,
    /// JSON file to submit.
    #[arg(long, conflicts_with = "text")]
    file: Option<PathBuf>,
    /// JSON text to submit. Reads stdin when neither this nor --file is given.
    #[arg(long)]
    text: Option<String>,
    /// Also write the rendered page as HTML to this path.
    #[arg(long)]
    html: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let workflow = SummaryWorkflow::new(&args.server_url)
        .with_context(|| format!("invalid server url '{}'", args.server_url))?;

    let input_ready = match (&args.file, args.text) {
        (Some(path), _) => workflow.load_from_file(path).await.is_ok(),
        (None, Some(text)) => {
            workflow.set_from_text(text).await;
            true
        }
        (None, None) => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("failed to read JSON from stdin")?;
            workflow.set_from_text(text).await;
            true
        }
    };

    if input_ready {
        info!(server = %args.server_url, "submitting host data");
        workflow.submit().await;
    }

    let screen = workflow.screen().await;
    print!("{}", format_screen(&screen));

    if let Some(path) = &args.html {
        tokio::fs::write(path, screen.to_html())
            .await
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        info!(path = %path.display(), "wrote html page");
    }

    Ok(if screen.error.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn format_screen(screen: &Screen) -> String {
    let mut out = String::new();
    if screen.loading {
        out.push_str("Analyzing host data...\n");
    }
    if let Some(message) = &screen.error {
        out.push_str(&format!("Error: {message}\n"));
    }
    if let Some(results) = &screen.results {
        let label_w = results
            .metrics
            .iter()
            .map(|row| row.label.len())
            .max()
            .unwrap_or(0);
        out.push_str("Quick Metrics\n");
        for row in &results.metrics {
            out.push_str(&format!(
                "  {:<label_w$}  {}\n",
                row.label,
                row.value,
                label_w = label_w
            ));
        }
        out.push('\n');
        out.push_str(results.narrative.text.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::{render, ClientError, NarrativeRenderer, UiState};

    #[test]
    fn error_screen_prints_message_only() {
        let screen = render(
            &UiState::Error(ClientError::Server("rate limited".into())),
            &NarrativeRenderer::plain(),
        );
        assert_eq!(format_screen(&screen), "Error: rate limited\n");
    }

    #[test]
    fn idle_screen_prints_nothing() {
        assert_eq!(format_screen(&Screen::default()), "");
    }

    #[test]
    fn cli_rejects_file_and_text_together() {
        let parsed = Args::try_parse_from(["desktop", "--file", "a.json", "--text", "{}"]);
        assert!(parsed.is_err());
    }
}
