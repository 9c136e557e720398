// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::ChatConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validates semantic constraints serde cannot express.
///
/// Collects every problem instead of failing on the first.
pub fn validate_config(config: &ChatConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let endpoint = config.server.endpoint.trim();
    if !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://")) {
        errors.push(ConfigError::validation(format!(
            "server.endpoint `{endpoint}` must start with ws:// or wss://"
        )));
    }

    if let Some(url) = &config.server.history_url
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        errors.push(ConfigError::validation(format!(
            "server.history_url `{url}` must start with http:// or https://"
        )));
    }

    if !config.server.history_path.starts_with('/') {
        errors.push(ConfigError::validation(
            "server.history_path must start with `/`",
        ));
    }

    let session = &config.session;
    if session.reconnect_delay_ms == 0 {
        errors.push(ConfigError::validation(
            "session.reconnect_delay_ms must be greater than 0",
        ));
    }

    if session.max_reconnect_delay_ms < session.reconnect_delay_ms {
        errors.push(ConfigError::validation(format!(
            "session.max_reconnect_delay_ms ({}) must not be below session.reconnect_delay_ms ({})",
            session.max_reconnect_delay_ms, session.reconnect_delay_ms
        )));
    }

    if session.max_reconnect_attempts == Some(0) {
        errors.push(ConfigError::validation(
            "session.max_reconnect_attempts must be at least 1 (omit it to retry forever)",
        ));
    }

    if session.event_buffer == 0 {
        errors.push(ConfigError::validation(
            "session.event_buffer must be greater than 0",
        ));
    }

    if config.stomp.write_timeout_ms == 0 {
        errors.push(ConfigError::validation(
            "stomp.write_timeout_ms must be greater than 0",
        ));
    }

    for (key, prefix) in [
        ("stomp.topic_prefix", &config.stomp.topic_prefix),
        ("stomp.send_prefix", &config.stomp.send_prefix),
    ] {
        if !prefix.starts_with('/') || prefix.ends_with('/') {
            errors.push(ConfigError::validation(format!(
                "{key} `{prefix}` must start with `/` and not end with `/`"
            )));
        }
    }

    if config.auth.token.is_some() && config.auth.token_file.is_some() {
        errors.push(ConfigError::validation(
            "auth.token and auth.token_file are mutually exclusive",
        ));
    }

    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "logging.level `{}` must be one of: {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(errors: &[ConfigError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&ChatConfig::default()).is_ok());
    }

    #[test]
    fn http_endpoint_is_rejected() {
        let mut config = ChatConfig::default();
        config.server.endpoint = "http://localhost/ws".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors)[0].contains("server.endpoint"));
    }

    #[test]
    fn all_problems_are_collected() {
        let mut config = ChatConfig::default();
        config.session.reconnect_delay_ms = 0;
        config.session.event_buffer = 0;
        config.auth.token = Some("a".into());
        config.auth.token_file = Some("/tmp/t".into());
        config.logging.level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        let text = messages(&errors).join("\n");
        assert_eq!(errors.len(), 4, "{text}");
        assert!(text.contains("reconnect_delay_ms"));
        assert!(text.contains("event_buffer"));
        assert!(text.contains("mutually exclusive"));
        assert!(text.contains("logging.level"));
    }

    #[test]
    fn zero_write_timeout_fails() {
        let mut config = ChatConfig::default();
        config.stomp.write_timeout_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(messages(&errors)[0].contains("stomp.write_timeout_ms"));
    }

    #[test]
    fn max_delay_below_base_delay_fails() {
        let mut config = ChatConfig::default();
        config.session.reconnect_delay_ms = 5000;
        config.session.max_reconnect_delay_ms = 1000;
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors)[0].contains("max_reconnect_delay_ms"));
    }

    #[test]
    fn zero_attempt_cap_fails() {
        let mut config = ChatConfig::default();
        config.session.max_reconnect_attempts = Some(0);
        assert!(validate_config(&config).is_err());
        config.session.max_reconnect_attempts = Some(3);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn prefixes_need_leading_and_no_trailing_slash() {
        let mut config = ChatConfig::default();
        config.stomp.topic_prefix = "chat-trade".into();
        config.stomp.send_prefix = "/app/".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn history_url_scheme_is_checked() {
        let mut config = ChatConfig::default();
        config.server.history_url = Some("ftp://host".into());
        assert!(validate_config(&config).is_err());
        config.server.history_url = Some("https://api.example.com".into());
        assert!(validate_config(&config).is_ok());
    }
}
