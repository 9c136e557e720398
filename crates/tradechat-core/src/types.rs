// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the session manager, transports, and collaborators.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

/// An identifier the server may encode either as a JSON string or a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Number(n) => write!(f, "{n}"),
            RawId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RawId {
    /// Canonical integer text becomes [`RawId::Number`]; anything else stays text.
    fn from(value: &str) -> Self {
        match value.parse::<i64>() {
            Ok(n) if n.to_string() == value => RawId::Number(n),
            _ => RawId::Text(value.to_string()),
        }
    }
}

/// Identifier of one chat room.
///
/// Kept in canonical string form so that `42` and `"42"` from different
/// endpoints name the same conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for ConversationId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for ConversationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ConversationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(RawId::deserialize(deserializer)?.to_string()))
    }
}

/// Identifier of a chat participant. Serialized back in the form it was given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub RawId);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(RawId::from(value))
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(RawId::Number(value))
    }
}

/// Server-assigned message timestamp, treated as opaque text.
///
/// Servers differ in how they encode times (ISO strings, epoch numbers,
/// date arrays); non-string JSON values are kept as their JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Timestamp(pub String);

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Ok(Self(s)),
            serde_json::Value::Null => Err(serde::de::Error::custom("timestamp must not be null")),
            other => Ok(Self(other.to_string())),
        }
    }
}

/// One chat message as confirmed by the server. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub sender_id: UserId,
    pub content: String,
    /// Absent or `null` when the server did not stamp the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    /// Client-local id correlating an in-flight send with its echo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<String>,
}

/// A conversation and its message log in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Creates a conversation with an empty log.
    pub fn new(id: ConversationId) -> Self {
        Self {
            id,
            messages: Vec::new(),
        }
    }
}

/// Outbound wire body: `{"senderId": .., "content": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    pub sender_id: UserId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<String>,
}

impl ChatPayload {
    pub fn new(sender_id: UserId, content: impl Into<String>) -> Self {
        Self {
            sender_id,
            content: content.into(),
            temp_id: None,
        }
    }
}

/// Lifecycle state of the session's transport connection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportState {
    Disconnected,
    Connecting,
    Connected,
    Subscribed,
    Failed,
}

/// Transport-assigned identifier of a live subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub String);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered header list; the first occurrence of a name wins on lookup.
pub type FrameHeaders = Vec<(String, String)>;

/// Parameters for opening one transport connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub endpoint: String,
    pub headers: FrameHeaders,
}

impl ConnectRequest {
    /// Returns the first header value with the given name (case-sensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Something the transport pushed on an open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A message frame delivered on a subscription.
    Frame {
        subscription: SubscriptionId,
        body: String,
    },
    /// The connection is gone (socket closed, server error, missed heart-beats).
    Closed { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_id_accepts_number_or_string() {
        let from_num: ConversationId = serde_json::from_str("42").unwrap();
        let from_str: ConversationId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(from_num, from_str);
        assert_eq!(from_num.as_str(), "42");
    }

    #[test]
    fn user_id_keeps_wire_form() {
        let payload = ChatPayload::new(UserId::from(7i64), "hi");
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"senderId":7,"content":"hi"}"#
        );

        let payload = ChatPayload::new(UserId::from("alice"), "hi");
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"senderId":"alice","content":"hi"}"#
        );
    }

    #[test]
    fn raw_id_from_digits_is_number() {
        assert_eq!(RawId::from("12"), RawId::Number(12));
        assert_eq!(RawId::from("-3"), RawId::Number(-3));
        assert_eq!(RawId::from("+3"), RawId::Text("+3".into()));
        assert_eq!(RawId::from("007"), RawId::Text("007".into()));
        assert_eq!(RawId::from("u-12"), RawId::Text("u-12".into()));
    }

    #[test]
    fn message_parses_server_echo() {
        let json = r#"{"senderId":2,"content":"hi","timestamp":"2026-01-02T03:04:05","chatId":9}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.sender_id, UserId::from(2i64));
        assert_eq!(msg.content, "hi");
        assert_eq!(msg.timestamp, Some(Timestamp::from("2026-01-02T03:04:05")));
        assert!(msg.temp_id.is_none());
    }

    #[test]
    fn message_timestamp_accepts_non_string_forms() {
        let msg: Message =
            serde_json::from_str(r#"{"senderId":"a","content":"x","timestamp":1700000000000}"#)
                .unwrap();
        assert_eq!(msg.timestamp.unwrap().0, "1700000000000");

        let msg: Message = serde_json::from_str(
            r#"{"senderId":"a","content":"x","timestamp":[2026,1,2,3,4,5]}"#,
        )
        .unwrap();
        assert_eq!(msg.timestamp.unwrap().0, "[2026,1,2,3,4,5]");
    }

    #[test]
    fn message_without_timestamp_is_kept() {
        let missing: Message = serde_json::from_str(r#"{"senderId":1,"content":"x"}"#).unwrap();
        assert_eq!(missing.timestamp, None);
        let null: Message =
            serde_json::from_str(r#"{"senderId":1,"content":"x","timestamp":null}"#).unwrap();
        assert_eq!(null, missing);
        assert_eq!(
            serde_json::to_string(&null).unwrap(),
            r#"{"senderId":1,"content":"x"}"#
        );
    }

    #[test]
    fn message_still_requires_sender_and_content() {
        assert!(serde_json::from_str::<Message>(r#"{"content":"x","timestamp":"t"}"#).is_err());
        assert!(serde_json::from_str::<Message>(r#"{"senderId":1,"timestamp":"t"}"#).is_err());
    }

    #[test]
    fn conversation_without_messages_defaults_to_empty() {
        let conv: Conversation = serde_json::from_str(r#"{"id":5}"#).unwrap();
        assert_eq!(conv.id, ConversationId::from(5i64));
        assert!(conv.messages.is_empty());
    }

    #[test]
    fn transport_state_display_and_parse() {
        use std::str::FromStr;

        let states = [
            TransportState::Disconnected,
            TransportState::Connecting,
            TransportState::Connected,
            TransportState::Subscribed,
            TransportState::Failed,
        ];
        for state in states {
            let parsed = TransportState::from_str(&state.to_string()).unwrap();
            assert_eq!(parsed, state);
        }
        assert_eq!(TransportState::Subscribed.to_string(), "SUBSCRIBED");
    }

    proptest::proptest! {
        #[test]
        fn numeric_conversation_ids_normalize(n in proptest::prelude::any::<i64>()) {
            let from_num: ConversationId = serde_json::from_str(&n.to_string()).unwrap();
            let from_str: ConversationId = serde_json::from_str(&format!("\"{n}\"")).unwrap();
            proptest::prop_assert_eq!(from_num, from_str);
        }

        #[test]
        fn user_id_text_round_trips(n in proptest::prelude::any::<i64>()) {
            proptest::prop_assert_eq!(UserId::from(n.to_string().as_str()), UserId::from(n));
        }
    }

    #[test]
    fn connect_request_header_lookup() {
        let req = ConnectRequest {
            endpoint: "ws://x".into(),
            headers: vec![
                ("Authorization".into(), "Bearer a".into()),
                ("Authorization".into(), "Bearer b".into()),
            ],
        };
        assert_eq!(req.header("Authorization"), Some("Bearer a"));
        assert_eq!(req.header("host"), None);
    }
}
