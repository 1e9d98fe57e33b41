use super::*;

use std::{
    collections::HashMap,
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_config(contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("scan_summarizer_config_test_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("server.toml");
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn defaults_target_perplexity_sonar() {
    let settings = Settings::default();
    assert_eq!(settings.server_bind, "127.0.0.1:5000");
    assert_eq!(settings.llm_api_url, DEFAULT_LLM_API_URL);
    assert_eq!(settings.llm_model, "sonar");
    assert_eq!(settings.llm_max_tokens, 1000);
    assert!(settings.llm_api_key.is_none());
}

#[test]
fn missing_config_file_keeps_defaults() {
    let mut settings = Settings::default();
    apply_file_overrides(&mut settings, Path::new("/nonexistent/server.toml")).expect("ok");
    assert_eq!(settings.server_bind, "127.0.0.1:5000");
}

#[test]
fn config_file_overrides_strings_and_numbers() {
    let path = temp_config(
        r#"
bind_addr = "0.0.0.0:8080"
llm_model = "sonar-pro"
llm_max_tokens = 2048
llm_temperature = 0.7
"#,
    );
    let mut settings = Settings::default();
    apply_file_overrides(&mut settings, &path).expect("apply");
    assert_eq!(settings.server_bind, "0.0.0.0:8080");
    assert_eq!(settings.llm_model, "sonar-pro");
    assert_eq!(settings.llm_max_tokens, 2048);
    assert!((settings.llm_temperature - 0.7).abs() < f32::EPSILON);

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn malformed_config_file_is_an_error() {
    let path = temp_config("bind_addr = ");
    let mut settings = Settings::default();
    assert!(apply_file_overrides(&mut settings, &path).is_err());
    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn env_overrides_win_and_blank_key_is_unset() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("PORT", "6000"),
        ("PERPLEXITY_API_KEY", "   "),
        ("APP__LLM_MAX_TOKENS", "512"),
        ("APP__MAX_BODY_BYTES", "1024"),
    ]);
    let mut settings = Settings {
        llm_api_key: Some("from-file".into()),
        ..Settings::default()
    };
    apply_env_overrides(&mut settings, |key| vars.get(key).map(|v| v.to_string()));

    assert_eq!(settings.server_bind, "127.0.0.1:6000");
    assert!(settings.llm_api_key.is_none());
    assert_eq!(settings.llm_max_tokens, 512);
    assert_eq!(settings.max_body_bytes, 1024);
}

#[test]
fn explicit_bind_beats_port() {
    let vars: HashMap<&str, &str> =
        HashMap::from([("PORT", "6000"), ("APP__BIND_ADDR", "0.0.0.0:7000")]);
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings, |key| vars.get(key).map(|v| v.to_string()));
    assert_eq!(settings.server_bind, "0.0.0.0:7000");
}

#[test]
fn unparsable_numbers_are_ignored() {
    let vars: HashMap<&str, &str> = HashMap::from([("APP__LLM_TEMPERATURE", "warm")]);
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings, |key| vars.get(key).map(|v| v.to_string()));
    assert!((settings.llm_temperature - 0.3).abs() < f32::EPSILON);
}
