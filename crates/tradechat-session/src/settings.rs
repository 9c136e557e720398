// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime settings for a session, derived from [`ChatConfig`].

use std::time::Duration;

use tradechat_config::ChatConfig;

use crate::destinations::Destinations;
use crate::reconnect::ReconnectPolicy;

/// Everything the session actor needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Transport endpoint passed to every connect.
    pub endpoint: String,
    pub destinations: Destinations,
    pub reconnect: ReconnectPolicy,
    /// Bound on one connect attempt. `None` waits for the transport.
    pub connect_timeout: Option<Duration>,
    /// Bound on one subscribe or send. Expiry drops the link.
    pub request_timeout: Option<Duration>,
    /// Capacity of the event broadcast channel.
    pub event_buffer: usize,
}

impl SessionSettings {
    /// Defaults for everything except the endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::from_config(&ChatConfig::default())
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        let session = &config.session;
        Self {
            endpoint: config.server.endpoint.clone(),
            destinations: Destinations::new(
                config.stomp.topic_prefix.clone(),
                config.stomp.send_prefix.clone(),
            ),
            reconnect: ReconnectPolicy {
                base_delay: session.reconnect_delay(),
                backoff: session.backoff,
                max_delay: session.max_reconnect_delay(),
                max_attempts: session.max_reconnect_attempts,
            },
            connect_timeout: session.connect_timeout(),
            request_timeout: session.request_timeout(),
            event_buffer: session.event_buffer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradechat_config::BackoffKind;
    use tradechat_core::ConversationId;

    #[test]
    fn settings_follow_config() {
        let mut config = ChatConfig::default();
        config.server.endpoint = "wss://chat.example.com/ws".into();
        config.session.backoff = BackoffKind::Exponential;
        config.session.max_reconnect_attempts = Some(4);
        config.session.connect_timeout_ms = 0;
        config.session.request_timeout_ms = 2500;
        config.stomp.topic_prefix = "/topic".into();

        let settings = SessionSettings::from_config(&config);
        assert_eq!(settings.endpoint, "wss://chat.example.com/ws");
        assert_eq!(settings.reconnect.backoff, BackoffKind::Exponential);
        assert_eq!(settings.reconnect.max_attempts, Some(4));
        assert!(settings.connect_timeout.is_none());
        assert_eq!(settings.request_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(
            settings.destinations.topic(&ConversationId::from("c1")),
            "/topic/c1"
        );
    }

    #[test]
    fn new_uses_defaults() {
        let settings = SessionSettings::new("ws://mock");
        assert_eq!(settings.endpoint, "ws://mock");
        assert_eq!(settings.reconnect, ReconnectPolicy::default());
        assert_eq!(settings.connect_timeout, Some(Duration::from_secs(10)));
        assert_eq!(settings.event_buffer, 256);
    }
}
