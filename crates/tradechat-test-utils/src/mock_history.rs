// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock history provider returning canned conversations.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use tradechat_core::{ChatError, Conversation, HistoryProvider};

/// A [`HistoryProvider`] that always returns the same result.
#[derive(Clone)]
pub struct MockHistory {
    result: Result<Vec<Conversation>, String>,
    calls: Arc<AtomicUsize>,
}

impl MockHistory {
    /// History that returns `conversations` on every fetch.
    pub fn with_conversations(conversations: Vec<Conversation>) -> Self {
        Self {
            result: Ok(conversations),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// History whose every fetch fails with [`ChatError::History`].
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Err(message.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of fetches so far.
    pub fn fetch_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistoryProvider for MockHistory {
    async fn fetch_conversations(&self) -> Result<Vec<Conversation>, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(|message| ChatError::History {
            message,
            source: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradechat_core::ConversationId;

    #[tokio::test]
    async fn returns_canned_conversations_and_counts_calls() {
        let history =
            MockHistory::with_conversations(vec![Conversation::new(ConversationId::from(1i64))]);
        assert_eq!(history.fetch_conversations().await.unwrap().len(), 1);
        assert_eq!(history.fetch_conversations().await.unwrap().len(), 1);
        assert_eq!(history.fetch_count(), 2);
    }

    #[tokio::test]
    async fn failing_history_is_a_history_error() {
        let history = MockHistory::failing("503");
        assert!(matches!(
            history.fetch_conversations().await,
            Err(ChatError::History { .. })
        ));
    }
}
