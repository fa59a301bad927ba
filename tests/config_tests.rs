use pretty_assertions::assert_eq;
use prediction_relay::{Error, config};
use std::time::Duration;

const SAMPLE_CONFIG_YAML: &str = r#"
server:
  host: "0.0.0.0"
  port: 5050
  read_timeout_ms: 15000
  logs:
    level: "debug"
llm:
  base_url: "http://gpu-box:11434/v1"
  model: "mistral:7b"
  timeout_ms: 60000
"#;

#[test]
fn test_defaults_match_reference_server() {
    let config = config::Config::default();

    assert_eq!(config.server.host, "localhost");
    assert_eq!(config.server.port, 5000);
    assert_eq!(config.server.read_timeout(), None);
    assert_eq!(config.server.logs.level, "info");
    assert_eq!(config.llm.base_url, "http://localhost:11434/v1");
    assert_eq!(config.llm.model, "llama3.2:latest");
    assert_eq!(config.llm.timeout(), None);
}

#[test]
fn test_parse_full_config() {
    let config = config::parse(SAMPLE_CONFIG_YAML).unwrap();

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 5050);
    assert_eq!(config.server.read_timeout(), Some(Duration::from_secs(15)));
    assert_eq!(config.server.logs.level, "debug");
    assert_eq!(config.llm.base_url, "http://gpu-box:11434/v1");
    assert_eq!(config.llm.api_key, "ollama");
    assert_eq!(config.llm.model, "mistral:7b");
    assert_eq!(config.llm.timeout(), Some(Duration::from_secs(60)));
}

#[test]
fn test_partial_config_keeps_defaults() {
    let config = config::parse("server:\n  port: 6000\n").unwrap();

    assert_eq!(config.server.port, 6000);
    assert_eq!(config.server.host, "localhost");
    assert_eq!(config.llm.model, "llama3.2:latest");
}

#[test]
fn test_empty_document_is_default() {
    let config = config::parse("   \n").unwrap();
    assert_eq!(config.server.port, 5000);
}

#[test]
fn test_invalid_yaml_is_rejected() {
    let err = config::parse("server:\n  port: not-a-port\n").unwrap_err();
    assert!(matches!(err, Error::Yaml(_)), "got {err:?}");
}

#[tokio::test]
async fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    tokio::fs::write(&path, SAMPLE_CONFIG_YAML).await.unwrap();

    let config = config::load_from(&path.to_string_lossy()).await.unwrap();

    assert_eq!(config.server.port, 5050);
    assert_eq!(config.llm.model, "mistral:7b");
}

#[tokio::test]
async fn test_load_from_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");

    let err = config::load_from(&path.to_string_lossy()).await.unwrap_err();

    assert!(matches!(err, Error::Config(_)), "got {err:?}");
}
