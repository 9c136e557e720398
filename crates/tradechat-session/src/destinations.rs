// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Topic and send-destination naming for a conversation.

use tradechat_core::ConversationId;

/// Derives broker destinations from a conversation id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destinations {
    topic_prefix: String,
    send_prefix: String,
}

impl Destinations {
    pub fn new(topic_prefix: impl Into<String>, send_prefix: impl Into<String>) -> Self {
        Self {
            topic_prefix: topic_prefix.into(),
            send_prefix: send_prefix.into(),
        }
    }

    /// Topic carrying the conversation's pushed messages.
    pub fn topic(&self, conversation: &ConversationId) -> String {
        format!("{}/{}", self.topic_prefix, conversation)
    }

    /// Destination that accepts messages for the conversation.
    pub fn send_destination(&self, conversation: &ConversationId) -> String {
        format!("{}/{}", self.send_prefix, conversation)
    }
}

impl Default for Destinations {
    fn default() -> Self {
        Self::new("/chat-trade", "/app/chat.sendMessage")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_naming() {
        let d = Destinations::default();
        let id = ConversationId::from(17i64);
        assert_eq!(d.topic(&id), "/chat-trade/17");
        assert_eq!(d.send_destination(&id), "/app/chat.sendMessage/17");
    }

    #[test]
    fn custom_prefixes() {
        let d = Destinations::new("/topic/rooms", "/app/rooms.post");
        let id = ConversationId::from("c1");
        assert_eq!(d.topic(&id), "/topic/rooms/c1");
        assert_eq!(d.send_destination(&id), "/app/rooms.post/c1");
    }
}
