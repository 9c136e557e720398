// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of silently falling back to a default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Tradechat configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Server endpoints.
    #[serde(default)]
    pub server: ServerConfig,

    /// Session lifecycle and reconnect behavior.
    #[serde(default)]
    pub session: SessionConfig,

    /// STOMP destinations and heart-beats.
    #[serde(default)]
    pub stomp: StompConfig,

    /// Bearer token source.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// STOMP WebSocket endpoint (`ws://` or `wss://`).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Base URL of the REST API serving conversation history.
    /// `None` disables history seeding.
    #[serde(default)]
    pub history_url: Option<String>,

    /// Path of the conversation list, appended to `history_url`.
    #[serde(default = "default_history_path")]
    pub history_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            history_url: None,
            history_path: default_history_path(),
        }
    }
}

fn default_endpoint() -> String {
    "ws://127.0.0.1:8080/ws".to_string()
}

fn default_history_path() -> String {
    "/api/chat/conversations".to_string()
}

/// Delay growth between consecutive reconnect attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    /// Every retry waits `reconnect_delay_ms`.
    #[default]
    Fixed,
    /// Each consecutive failure doubles the delay, capped at `max_reconnect_delay_ms`.
    Exponential,
}

/// Session lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Delay before retrying after a connect failure or transport drop.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Delay growth policy.
    #[serde(default)]
    pub backoff: BackoffKind,

    /// Upper bound for exponential backoff.
    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,

    /// Consecutive failed attempts before giving up. `None` retries forever.
    #[serde(default)]
    pub max_reconnect_attempts: Option<u32>,

    /// Bound on one connect + authenticate attempt. `0` disables the bound.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Bound on one subscribe or send on an established connection.
    /// Expiry counts as a transport drop. `0` disables the bound.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Capacity of the session event broadcast channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
            backoff: BackoffKind::default(),
            max_reconnect_delay_ms: default_max_reconnect_delay_ms(),
            max_reconnect_attempts: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl SessionConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn max_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.max_reconnect_delay_ms)
    }

    /// Returns `None` when the connect timeout is disabled.
    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_ms > 0).then(|| Duration::from_millis(self.connect_timeout_ms))
    }

    /// Returns `None` when the request timeout is disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }
}

fn default_reconnect_delay_ms() -> u64 {
    3000
}

fn default_max_reconnect_delay_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_event_buffer() -> usize {
    256
}

/// STOMP protocol configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StompConfig {
    /// Topic prefix; the conversation id is appended as the last segment.
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,

    /// Send destination prefix; the conversation id is appended as the last segment.
    #[serde(default = "default_send_prefix")]
    pub send_prefix: String,

    /// Interval at which the client offers to send heart-beats. `0` disables.
    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_outgoing_ms: u64,

    /// Interval at which the client wants to receive heart-beats. `0` disables.
    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_incoming_ms: u64,

    /// Bound on one WebSocket write. A write that does not finish in time
    /// closes the connection.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    /// Virtual host for the CONNECT `host` header. Defaults to the endpoint host.
    #[serde(default)]
    pub host: Option<String>,
}

impl Default for StompConfig {
    fn default() -> Self {
        Self {
            topic_prefix: default_topic_prefix(),
            send_prefix: default_send_prefix(),
            heartbeat_outgoing_ms: default_heartbeat_ms(),
            heartbeat_incoming_ms: default_heartbeat_ms(),
            write_timeout_ms: default_write_timeout_ms(),
            host: None,
        }
    }
}

fn default_topic_prefix() -> String {
    "/chat-trade".to_string()
}

fn default_send_prefix() -> String {
    "/app/chat.sendMessage".to_string()
}

fn default_heartbeat_ms() -> u64 {
    10_000
}

fn default_write_timeout_ms() -> u64 {
    10_000
}

/// Bearer token source. At most one of `token` and `token_file` may be set;
/// with neither the client connects anonymously.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Inline bearer token.
    #[serde(default)]
    pub token: Option<String>,

    /// File holding the bearer token, re-read on every connect.
    #[serde(default)]
    pub token_file: Option<String>,
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_client() {
        let config = ChatConfig::default();
        assert_eq!(config.session.reconnect_delay(), Duration::from_secs(3));
        assert_eq!(config.session.backoff, BackoffKind::Fixed);
        assert!(config.session.max_reconnect_attempts.is_none());
        assert_eq!(config.stomp.topic_prefix, "/chat-trade");
        assert_eq!(config.stomp.send_prefix, "/app/chat.sendMessage");
    }

    #[test]
    fn zero_connect_timeout_disables_it() {
        let session = SessionConfig {
            connect_timeout_ms: 0,
            ..SessionConfig::default()
        };
        assert!(session.connect_timeout().is_none());
        assert_eq!(
            SessionConfig::default().connect_timeout(),
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn backoff_kind_is_lowercase_in_toml() {
        let session: SessionConfig = toml::from_str("backoff = \"exponential\"").unwrap();
        assert_eq!(session.backoff, BackoffKind::Exponential);
        assert!(toml::from_str::<SessionConfig>("backoff = \"linear\"").is_err());
    }
}
