use super::*;
use std::io::Write;

#[test]
fn test_default_path_under_home_dir() {
    let path = get_config_path();
    assert!(path.ends_with(".chatrelay/config.json"));
}

#[test]
fn test_load_config_missing_file_returns_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.relay.command_prefix, "/");
    assert!(config.relay.require_activation);
}

#[test]
fn test_load_config_minimal_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(file, r#"{{"provider": {{"apiKey": "k", "model": "gemini-1.5-flash"}}}}"#).unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.provider.model.as_deref(), Some("gemini-1.5-flash"));
    assert_eq!(config.channels.twilio.webhook_path, "/twilio/webhook");
    assert!(!config.channels.discord.enabled);
}

#[test]
fn test_load_config_invalid_json_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = load_config(Some(&path)).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config JSON"));
}

#[test]
fn test_load_config_wrong_type_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"gateway": {"port": "eighty"}}"#).unwrap();
    assert!(load_config(Some(&path)).is_err());
}

#[test]
fn test_parse_config_empty_object() {
    let config = parse_config("{}").unwrap();
    assert_eq!(config.gateway.port, 5000);
    assert_eq!(config.provider.timeout_secs, 12);
    assert_eq!(config.provider.max_retries, 0);
}
