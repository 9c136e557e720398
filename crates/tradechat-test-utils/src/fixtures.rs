// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for messages, conversations, and server frame bodies.

use tradechat_core::{Conversation, ConversationId, Message, Timestamp, UserId};

/// A message as the server would echo it.
pub fn message(sender: impl Into<UserId>, content: &str, timestamp: &str) -> Message {
    Message {
        sender_id: sender.into(),
        content: content.to_string(),
        timestamp: Some(Timestamp::from(timestamp)),
        temp_id: None,
    }
}

/// A conversation holding `messages` in order.
pub fn conversation(id: impl Into<ConversationId>, messages: Vec<Message>) -> Conversation {
    Conversation {
        id: id.into(),
        messages,
    }
}

/// JSON frame body for a broadcast message.
pub fn frame_body(sender: i64, content: &str, timestamp: &str) -> String {
    serde_json::json!({
        "senderId": sender,
        "content": content,
        "timestamp": timestamp,
    })
    .to_string()
}
