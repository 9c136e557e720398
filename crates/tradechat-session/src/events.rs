// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notifications published by the session to its observers.

use std::time::Duration;

use strum::Display;
use tradechat_core::{ConversationId, Message, TransportState};

/// Which part of the session an [`SessionEvent::Error`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ErrorKind {
    /// Connect or authentication failed (includes connect timeouts).
    Connect,
    /// A pushed frame could not be decoded.
    Parse,
    /// An established connection dropped or refused a subscription.
    Transport,
    /// Conversation history could not be fetched.
    History,
}

/// An observable change in the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    StateChanged {
        from: TransportState,
        to: TransportState,
    },
    MessageAppended {
        conversation: ConversationId,
        message: Message,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
    /// A retry is pending. `attempt` counts consecutive failures.
    ReconnectScheduled { attempt: u32, delay: Duration },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display_is_lowercase() {
        assert_eq!(ErrorKind::Connect.to_string(), "connect");
        assert_eq!(ErrorKind::History.to_string(), "history");
    }
}
