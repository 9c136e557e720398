// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation history collaborator.

use async_trait::async_trait;

use crate::error::ChatError;
use crate::types::Conversation;

/// Fetches the user's conversations with their existing messages.
#[async_trait]
pub trait HistoryProvider: Send + Sync + 'static {
    async fn fetch_conversations(&self) -> Result<Vec<Conversation>, ChatError>;
}
