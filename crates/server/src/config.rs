use std::{collections::HashMap, fs, io, path::Path};

use anyhow::Context;

pub const DEFAULT_LLM_API_URL: &str = "https://api.perplexity.ai/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "sonar";

#[derive(Clone)]
pub struct Settings {
    pub server_bind: String,
    pub llm_api_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_max_tokens: u32,
    pub llm_temperature: f32,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:5000".into(),
            llm_api_url: DEFAULT_LLM_API_URL.into(),
            llm_api_key: None,
            llm_model: DEFAULT_LLM_MODEL.into(),
            llm_max_tokens: 1000,
            llm_temperature: 0.3,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Defaults, then `server.toml` in the working directory, then the process
/// environment.
pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    apply_file_overrides(&mut settings, Path::new("server.toml"))?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

pub(crate) fn apply_file_overrides(settings: &mut Settings, path: &Path) -> anyhow::Result<()> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };
    let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(&raw)
        .with_context(|| format!("failed to parse '{}'", path.display()))?;
    let lookup = |key: &str| file_cfg.get(key).map(toml_scalar);

    if let Some(v) = lookup("bind_addr") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("llm_api_url") {
        settings.llm_api_url = v;
    }
    if let Some(v) = lookup("llm_api_key") {
        settings.llm_api_key = non_empty(v);
    }
    if let Some(v) = lookup("llm_model") {
        settings.llm_model = v;
    }
    apply_numeric_overrides(settings, lookup);
    Ok(())
}

pub(crate) fn apply_env_overrides(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(port) = env("PORT") {
        settings.server_bind = format!("127.0.0.1:{}", port.trim());
    }
    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("PERPLEXITY_API_KEY") {
        settings.llm_api_key = non_empty(v);
    }
    if let Some(v) = env("APP__LLM_API_KEY") {
        settings.llm_api_key = non_empty(v);
    }
    if let Some(v) = env("APP__LLM_API_URL") {
        settings.llm_api_url = v;
    }
    if let Some(v) = env("APP__LLM_MODEL") {
        settings.llm_model = v;
    }

    apply_numeric_overrides(settings, |key| {
        env(&format!("APP__{}", key.to_ascii_uppercase()))
    });
}

fn apply_numeric_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(parsed) = lookup("llm_max_tokens").and_then(|v| v.trim().parse().ok()) {
        settings.llm_max_tokens = parsed;
    }
    if let Some(parsed) = lookup("llm_temperature").and_then(|v| v.trim().parse().ok()) {
        settings.llm_temperature = parsed;
    }
    if let Some(parsed) = lookup("max_body_bytes").and_then(|v| v.trim().parse().ok()) {
        settings.max_body_bytes = parsed;
    }
}

fn toml_scalar(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
