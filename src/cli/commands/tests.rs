use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use clap::CommandFactory;
use tower::ServiceExt;

fn valid_config() -> Config {
    let mut config = Config::default();
    config.provider.api_key = "secret-key".to_string();
    config
}

#[test]
fn test_cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn test_parse_serve_with_overrides() {
    let cli = Cli::try_parse_from(["chatrelay", "serve", "--config", "/tmp/c.json", "--port", "8081"])
        .unwrap();
    match cli.command {
        Commands::Serve { config, port } => {
            assert_eq!(config.as_deref(), Some(Path::new("/tmp/c.json")));
            assert_eq!(port, Some(8081));
        }
        Commands::Check { .. } => panic!("expected serve"),
    }
}

#[test]
fn test_parse_check() {
    let cli = Cli::try_parse_from(["chatrelay", "check"]).unwrap();
    assert!(matches!(cli.command, Commands::Check { config: None }));
}

#[test]
fn test_unknown_subcommand_rejected() {
    assert!(Cli::try_parse_from(["chatrelay", "gateway"]).is_err());
}

#[test]
fn test_summary_never_prints_secrets() {
    let mut config = valid_config();
    config.channels.discord.token = "discord-secret".to_string();
    let text = summary(&config).join("\n");
    assert!(!text.contains("secret-key"));
    assert!(!text.contains("discord-secret"));
    assert!(text.contains("credential discord-token: set"));
    assert!(text.contains("credential coc-api-token: not set"));
    assert!(text.contains("twilio: POST /twilio/webhook"));
}

#[test]
fn test_check_fails_on_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"gateway": {"port": 0}, "provider": {"apiKey": "k"}}"#).unwrap();
    let err = check(Some(&path)).unwrap_err();
    assert!(format!("{err:#}").contains("gateway.port"));
}

#[test]
fn test_check_accepts_valid_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"provider": {"apiKey": "k"}}"#).unwrap();
    check(Some(&path)).unwrap();
}

#[tokio::test]
async fn test_build_app_serves_twilio_and_health() {
    let (app, channels) = build_app(&valid_config());
    assert!(channels.enabled_channels().is_empty());

    let health = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(health).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let webhook = Request::builder()
        .method("POST")
        .uri("/twilio/webhook")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("From=%2B1555&Body=%2Fhelp"))
        .unwrap();
    let resp = app.oneshot(webhook).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), 1 << 20).await.unwrap();
    assert!(String::from_utf8_lossy(&body).contains("/toggle"));
}

#[tokio::test]
async fn test_build_app_without_twilio() {
    let mut config = valid_config();
    config.channels.twilio.enabled = false;
    let (app, _) = build_app(&config);
    let req = Request::builder()
        .method("POST")
        .uri("/twilio/webhook")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_build_pipeline_applies_activation_default() {
    let mut config = valid_config();
    config.relay.active_by_default = true;
    let pipeline = build_pipeline(&config);
    let key = crate::bus::ConversationKey::new(crate::bus::ChannelType::Discord, "1");
    assert!(pipeline.sessions().is_active(&key));
}
