use std::time::Duration;

use purge_relay::{config::GlobalConfig, AppError};

fn sample_toml() -> String {
    r#"
authorised_users = ["alice", "bob"]
http_port = 8080

[slack]
restricted_channels = ["cache-ops"]

[cloudflare]
zone = "example.com"
email = "ops@example.com"
api_base = "https://cf.test/client/v4"

[relay]
drain_interval_seconds = 2
queue_capacity = 4
max_uris = 10
pending_ttl_seconds = 120
purge_timeout_seconds = 15
expiry_sweep_seconds = 30
"#
    .to_owned()
}

fn minimal_toml() -> String {
    r#"
authorised_users = ["alice"]

[slack]
restricted_channels = ["cache-ops"]

[cloudflare]
zone = "example.com"
"#
    .to_owned()
}

#[test]
fn parses_valid_config() {
    let config = GlobalConfig::from_toml_str(&sample_toml()).expect("config parses");

    assert_eq!(config.http_port, 8080);
    assert_eq!(config.authorised_users, vec!["alice", "bob"]);
    assert_eq!(config.slack.restricted_channels, vec!["cache-ops"]);
    assert_eq!(config.cloudflare.email.as_deref(), Some("ops@example.com"));
    assert_eq!(config.cloudflare.api_base, "https://cf.test/client/v4");
    assert_eq!(config.relay.drain_interval(), Duration::from_secs(2));
    assert_eq!(config.relay.queue_capacity, 4);
    assert_eq!(config.relay.max_uris, 10);
    assert_eq!(config.relay.pending_ttl(), Some(Duration::from_secs(120)));
    assert_eq!(config.relay.purge_timeout(), Duration::from_secs(15));
    assert_eq!(config.relay.expiry_sweep_interval(), Duration::from_secs(30));
}

#[test]
fn credentials_are_not_read_from_toml() {
    let config = GlobalConfig::from_toml_str(&sample_toml()).expect("config parses");
    assert!(config.slack.bot_token.is_empty());
    assert!(config.slack.app_token.is_empty());
    assert!(config.cloudflare.api_key.is_empty());
}

#[test]
fn minimal_config_uses_defaults() {
    let config = GlobalConfig::from_toml_str(&minimal_toml()).expect("config parses");

    assert_eq!(config.http_port, 3000);
    assert_eq!(config.cloudflare.email, None);
    assert_eq!(
        config.cloudflare.api_base,
        "https://api.cloudflare.com/client/v4"
    );
    assert_eq!(config.relay.drain_interval(), Duration::from_secs(5));
    assert_eq!(config.relay.queue_capacity, 10);
    assert_eq!(config.relay.max_uris, 30);
    assert_eq!(config.relay.pending_ttl(), Some(Duration::from_secs(600)));
    assert_eq!(config.relay.purge_timeout(), Duration::from_secs(30));
}

#[test]
fn zero_ttl_disables_expiry() {
    let toml = format!("{}\n[relay]\npending_ttl_seconds = 0\n", minimal_toml());
    let config = GlobalConfig::from_toml_str(&toml).expect("config parses");
    assert_eq!(config.relay.pending_ttl(), None);
}

#[test]
fn rejects_empty_authorised_users() {
    let toml = minimal_toml().replace(r#"["alice"]"#, "[]");
    let err = GlobalConfig::from_toml_str(&toml).expect_err("validation fails");
    assert!(matches!(err, AppError::Config(ref msg) if msg.contains("authorised_users")));
}

#[test]
fn rejects_empty_restricted_channels() {
    let toml = minimal_toml().replace(r#"["cache-ops"]"#, "[]");
    let err = GlobalConfig::from_toml_str(&toml).expect_err("validation fails");
    assert!(matches!(err, AppError::Config(ref msg) if msg.contains("restricted_channels")));
}

#[test]
fn rejects_blank_zone() {
    let toml = minimal_toml().replace(r#""example.com""#, r#""  ""#);
    let err = GlobalConfig::from_toml_str(&toml).expect_err("validation fails");
    assert!(matches!(err, AppError::Config(ref msg) if msg.contains("cloudflare.zone")));
}

#[test]
fn rejects_zero_drain_interval() {
    let toml = format!("{}\n[relay]\ndrain_interval_seconds = 0\n", minimal_toml());
    let err = GlobalConfig::from_toml_str(&toml).expect_err("validation fails");
    assert!(matches!(err, AppError::Config(ref msg) if msg.contains("drain_interval_seconds")));
}

#[test]
fn rejects_zero_queue_capacity() {
    let toml = format!("{}\n[relay]\nqueue_capacity = 0\n", minimal_toml());
    assert!(GlobalConfig::from_toml_str(&toml).is_err());
}

#[test]
fn rejects_missing_cloudflare_section() {
    let toml = r#"
authorised_users = ["alice"]

[slack]
restricted_channels = ["cache-ops"]
"#;
    let err = GlobalConfig::from_toml_str(toml).expect_err("parse fails");
    assert!(err.to_string().starts_with("config: invalid config"));
}

#[test]
fn loads_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, minimal_toml()).expect("write config");

    let config = GlobalConfig::load_from_path(&path).expect("config loads");
    assert_eq!(config.cloudflare.zone, "example.com");
}

#[test]
fn missing_file_is_config_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = GlobalConfig::load_from_path(dir.path().join("absent.toml"))
        .expect_err("load fails");
    assert!(matches!(err, AppError::Config(ref msg) if msg.contains("failed to read config")));
}
