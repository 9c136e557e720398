// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound message routing into per-conversation logs.
//!
//! Frames are accepted only when they carry the attempt id and subscription
//! of the current binding. Accepted frames are appended in arrival order;
//! there is no reordering and no content deduplication.

use std::collections::HashMap;

use tradechat_core::{ChatError, Conversation, ConversationId, Message, SubscriptionId};

/// The subscription frames are currently accepted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub attempt: u64,
    pub subscription: SubscriptionId,
    pub conversation: ConversationId,
}

/// Owner of every conversation log the session has seen.
#[derive(Debug, Default)]
pub struct InboundRouter {
    logs: HashMap<ConversationId, Vec<Message>>,
}

impl InboundRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes one frame body.
    ///
    /// Returns [`ChatError::StaleSubscription`] when the frame does not come
    /// from `bound`, and [`ChatError::Parse`] when the body is not a message.
    /// In both cases no log changes.
    pub fn route(
        &mut self,
        bound: Option<&Binding>,
        attempt: u64,
        subscription: &SubscriptionId,
        body: &str,
    ) -> Result<Message, ChatError> {
        let Some(binding) =
            bound.filter(|b| b.attempt == attempt && &b.subscription == subscription)
        else {
            return Err(ChatError::StaleSubscription {
                detail: format!("frame from attempt {attempt} on {subscription}"),
            });
        };

        let message: Message = serde_json::from_str(body).map_err(|e| ChatError::Parse {
            message: format!("malformed chat frame: {e}"),
            source: Some(Box::new(e)),
        })?;

        self.logs
            .entry(binding.conversation.clone())
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    /// Replaces the log of `conversation` with history, starting a new
    /// session lifetime for it.
    pub fn seed(&mut self, conversation: ConversationId, messages: Vec<Message>) {
        self.logs.insert(conversation, messages);
    }

    pub fn log(&self, conversation: &ConversationId) -> &[Message] {
        self.logs
            .get(conversation)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Snapshot of one conversation, if anything was seeded or received for it.
    pub fn conversation(&self, conversation: &ConversationId) -> Option<Conversation> {
        self.logs.get(conversation).map(|messages| Conversation {
            id: conversation.clone(),
            messages: messages.clone(),
        })
    }
}
