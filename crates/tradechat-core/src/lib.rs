// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tradechat session manager.
//!
//! This crate provides the shared error type, the chat domain types, and the
//! collaborator traits ([`Transport`], [`TokenProvider`], [`HistoryProvider`])
//! that the session manager is written against.

pub mod error;
pub mod tokens;
pub mod traits;
pub mod types;

pub use error::ChatError;
pub use types::{
    ChatPayload, ConnectRequest, Conversation, ConversationId, FrameHeaders, Message, RawId,
    SubscriptionId, Timestamp, TransportEvent, TransportState, UserId,
};

pub use traits::{Connection, HistoryProvider, TokenProvider, Transport, TransportLink};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_collaborator_traits_are_exported() {
        fn _assert_transport<T: Transport>() {}
        fn _assert_connection<T: Connection>() {}
        fn _assert_token_provider<T: TokenProvider>() {}
        fn _assert_history_provider<T: HistoryProvider>() {}

        _assert_token_provider::<tokens::Anonymous>();
        _assert_token_provider::<tokens::StaticToken>();
        _assert_token_provider::<tokens::FileToken>();
    }

    #[test]
    fn collaborator_traits_are_object_safe() {
        fn _transport(_: &dyn Transport) {}
        fn _connection(_: &dyn Connection) {}
        fn _tokens(_: &dyn TokenProvider) {}
        fn _history(_: &dyn HistoryProvider) {}
    }
}
