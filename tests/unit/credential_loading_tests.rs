//! Unit tests for credential loading.
//!
//! Validates the env-var fallback path, optional `CF_EMAIL` override, and
//! missing-credential error messages.
//!
//! NOTE: These tests mutate process-global env vars and must run serially.

use purge_relay::config::GlobalConfig;

const REQUIRED: [&str; 3] = ["SLACK_APP_TOKEN", "SLACK_BOT_TOKEN", "CF_TOKEN"];

fn make_config() -> GlobalConfig {
    GlobalConfig::from_toml_str(
        r#"
authorised_users = ["alice"]

[slack]
restricted_channels = ["cache-ops"]

[cloudflare]
zone = "example.com"
email = "file@example.com"
"#,
    )
    .expect("config parses")
}

fn clear_env() {
    for key in REQUIRED {
        std::env::remove_var(key);
    }
    std::env::remove_var("CF_EMAIL");
}

#[tokio::test]
#[serial_test::serial]
async fn env_var_credential_loading() {
    clear_env();
    let mut config = make_config();
    std::env::set_var("SLACK_APP_TOKEN", "xapp-test");
    std::env::set_var("SLACK_BOT_TOKEN", "xoxb-test");
    std::env::set_var("CF_TOKEN", "cf-key");

    config.load_credentials().await.expect("credentials load");

    assert_eq!(config.slack.app_token, "xapp-test");
    assert_eq!(config.slack.bot_token, "xoxb-test");
    assert_eq!(config.cloudflare.api_key, "cf-key");
    assert_eq!(config.cloudflare.email.as_deref(), Some("file@example.com"));
    clear_env();
}

#[tokio::test]
#[serial_test::serial]
async fn cf_email_env_overrides_file() {
    clear_env();
    let mut config = make_config();
    std::env::set_var("SLACK_APP_TOKEN", "xapp-test");
    std::env::set_var("SLACK_BOT_TOKEN", "xoxb-test");
    std::env::set_var("CF_TOKEN", "cf-key");
    std::env::set_var("CF_EMAIL", "env@example.com");

    config.load_credentials().await.expect("credentials load");

    assert_eq!(config.cloudflare.email.as_deref(), Some("env@example.com"));
    clear_env();
}

#[tokio::test]
#[serial_test::serial]
async fn missing_credential_names_env_var() {
    clear_env();
    let mut config = make_config();
    std::env::set_var("SLACK_APP_TOKEN", "xapp-test");
    std::env::set_var("SLACK_BOT_TOKEN", "xoxb-test");

    let err = config.load_credentials().await.expect_err("cf token missing");

    let msg = err.to_string();
    assert!(msg.contains("cf_token"), "got: {msg}");
    assert!(msg.contains("CF_TOKEN"), "got: {msg}");
    clear_env();
}

#[tokio::test]
#[serial_test::serial]
async fn empty_env_var_counts_as_missing() {
    clear_env();
    let mut config = make_config();
    std::env::set_var("SLACK_APP_TOKEN", "");

    let err = config.load_credentials().await.expect_err("empty token");
    assert!(err.to_string().contains("SLACK_APP_TOKEN"));
    clear_env();
}
