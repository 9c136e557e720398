// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tradechat session manager.

use thiserror::Error;

use crate::types::TransportState;

/// The primary error type used across all Tradechat crates.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Configuration errors (invalid values, unusable endpoints, unreadable files).
    #[error("configuration error: {0}")]
    Config(String),

    /// The transport failed to establish a connection or to authenticate.
    #[error("connect error: {message}")]
    Connect {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A received frame or response body could not be decoded.
    #[error("parse error: {message}")]
    Parse {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A send was attempted while the session was not subscribed.
    #[error("not connected (transport state is {state})")]
    NotConnected { state: TransportState },

    /// A frame or callback arrived for a subscription that is no longer bound.
    #[error("stale subscription: {detail}")]
    StaleSubscription { detail: String },

    /// Transport-level failure on an established connection.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Conversation history could not be fetched.
    #[error("history error: {message}")]
    History {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// The session actor has stopped and no longer accepts commands.
    #[error("session closed")]
    SessionClosed,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Returns true for conditions the session may still recover from on its
    /// own (a reconnect is pending or possible), as opposed to caller bugs or
    /// a stopped session.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ChatError::NotConnected { .. }
                | ChatError::Connect { .. }
                | ChatError::Transport { .. }
                | ChatError::Timeout { .. }
        )
    }

    /// Shorthand for a [`ChatError::Transport`] without a source.
    pub fn transport(message: impl Into<String>) -> Self {
        ChatError::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`ChatError::Connect`] without a source.
    pub fn connect(message: impl Into<String>) -> Self {
        ChatError::Connect {
            message: message.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_connected_is_transient() {
        let err = ChatError::NotConnected {
            state: TransportState::Connecting,
        };
        assert!(err.is_transient());
        assert_eq!(
            err.to_string(),
            "not connected (transport state is CONNECTING)"
        );
    }

    #[test]
    fn parse_and_closed_are_not_transient() {
        let parse = ChatError::Parse {
            message: "bad json".into(),
            source: None,
        };
        assert!(!parse.is_transient());
        assert!(!ChatError::SessionClosed.is_transient());
        assert!(!ChatError::Config("x".into()).is_transient());
    }

    #[test]
    fn timeout_message_includes_duration() {
        let err = ChatError::Timeout {
            duration: std::time::Duration::from_secs(10),
        };
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "operation timed out after 10s");
    }
}
