// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Tradechat configuration system.

use std::time::Duration;

use serial_test::serial;
use tradechat_config::diagnostic::{ConfigError, render_errors};
use tradechat_config::model::BackoffKind;
use tradechat_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Every known section and key deserializes.
#[test]
fn full_toml_deserializes_into_chat_config() {
    let toml = r#"
[server]
endpoint = "wss://chat.example.com/ws"
history_url = "https://api.example.com"
history_path = "/api/chat/conversations"

[session]
reconnect_delay_ms = 1000
backoff = "exponential"
max_reconnect_delay_ms = 8000
max_reconnect_attempts = 5
connect_timeout_ms = 2500
request_timeout_ms = 0
event_buffer = 64

[stomp]
topic_prefix = "/topic/chat"
send_prefix = "/app/chat.send"
heartbeat_outgoing_ms = 0
heartbeat_incoming_ms = 20000
write_timeout_ms = 750
host = "chat.example.com"

[auth]
token = "abc"

[logging]
level = "debug"
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should load");
    assert_eq!(config.server.endpoint, "wss://chat.example.com/ws");
    assert_eq!(
        config.server.history_url.as_deref(),
        Some("https://api.example.com")
    );
    assert_eq!(config.session.reconnect_delay(), Duration::from_secs(1));
    assert_eq!(config.session.backoff, BackoffKind::Exponential);
    assert_eq!(config.session.max_reconnect_attempts, Some(5));
    assert_eq!(
        config.session.connect_timeout(),
        Some(Duration::from_millis(2500))
    );
    assert_eq!(config.session.event_buffer, 64);
    assert!(config.session.request_timeout().is_none());
    assert_eq!(config.stomp.write_timeout_ms, 750);
    assert_eq!(config.stomp.topic_prefix, "/topic/chat");
    assert_eq!(config.stomp.heartbeat_outgoing_ms, 0);
    assert_eq!(config.stomp.host.as_deref(), Some("chat.example.com"));
    assert_eq!(config.auth.token.as_deref(), Some("abc"));
    assert_eq!(config.logging.level, "debug");
}

/// An empty file yields the compiled defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.server.endpoint, "ws://127.0.0.1:8080/ws");
    assert!(config.server.history_url.is_none());
    assert_eq!(config.session.reconnect_delay(), Duration::from_secs(3));
    assert_eq!(config.session.backoff, BackoffKind::Fixed);
    assert_eq!(config.logging.level, "info");
}

/// A misspelled key is rejected with a suggestion.
#[test]
fn unknown_key_gets_suggestion() {
    let toml = r#"
[session]
reconect_delay_ms = 1000
"#;

    let errors = load_and_validate_str(toml).expect_err("typo should be rejected");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            valid_keys,
            ..
        } => {
            assert_eq!(key, "reconect_delay_ms");
            assert_eq!(suggestion.as_deref(), Some("reconnect_delay_ms"));
            assert!(valid_keys.contains("connect_timeout_ms"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// An unknown top-level section is an error too.
#[test]
fn unknown_section_is_rejected() {
    let err = load_config_from_str("[storage]\npath = \"x\"\n").expect_err("should fail");
    assert!(format!("{err}").contains("storage"));
}

/// A string where a number belongs is an InvalidType error naming the key.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[session]
reconnect_delay_ms = "soon"
"#;

    let errors = load_and_validate_str(toml).expect_err("wrong type should be rejected");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("reconnect_delay_ms"))),
        "got {errors:?}"
    );
}

/// Semantic validation runs after a successful parse.
#[test]
fn validation_errors_surface_from_load() {
    let toml = r#"
[server]
endpoint = "http://chat.example.com"

[auth]
token = "a"
token_file = "/run/token"
"#;

    let errors = load_and_validate_str(toml).expect_err("invalid values should be rejected");
    assert_eq!(errors.len(), 2);
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

/// An explicit file is loaded and its typos are diagnosed.
#[test]
#[serial]
fn explicit_file_is_loaded_and_diagnosed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tradechat.toml");
    std::fs::write(&path, "[stomp]\ntopic_prefx = \"/t\"\n").unwrap();

    let errors = load_and_validate_path(&path).expect_err("typo should be rejected");
    match &errors[0] {
        ConfigError::UnknownKey { suggestion, .. } => {
            assert_eq!(suggestion.as_deref(), Some("topic_prefix"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }

    // Rendering must not panic.
    render_errors(&errors);

    std::fs::write(&path, "[stomp]\ntopic_prefix = \"/t\"\n").unwrap();
    let config = load_and_validate_path(&path).expect("fixed file should load");
    assert_eq!(config.stomp.topic_prefix, "/t");
}

/// `TRADECHAT_*` variables override an explicit file.
#[test]
#[serial]
fn env_overrides_explicit_file() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
[session]
reconnect_delay_ms = 1000
"#,
        )?;
        jail.set_env("TRADECHAT_SESSION_RECONNECT_DELAY_MS", "250");
        jail.set_env("TRADECHAT_AUTH_TOKEN_FILE", "/run/secrets/chat");

        let path = jail.directory().join("custom.toml");
        let config = load_and_validate_path(&path).expect("config should load");
        assert_eq!(config.session.reconnect_delay_ms, 250);
        assert_eq!(config.auth.token_file.as_deref(), Some("/run/secrets/chat"));
        Ok(())
    });
}
