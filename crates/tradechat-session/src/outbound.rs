// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound send path: turns user input into a payload for the session.

use tradechat_core::{ChatError, ChatPayload, UserId};

use crate::handle::SessionHandle;

/// Result of [`SessionHandle::compose_and_send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// The input was blank; nothing was sent.
    Skipped,
}

/// Builds the wire payload for `text`, or `None` when it is blank.
pub fn compose(text: &str, sender: UserId) -> Option<ChatPayload> {
    let content = text.trim();
    (!content.is_empty()).then(|| ChatPayload::new(sender, content))
}

impl SessionHandle {
    /// Trims `text` and sends it as `sender`. Blank input is skipped silently.
    ///
    /// A [`ChatError::NotConnected`] here is transient: the session may be
    /// reconnecting. Check [`ChatError::is_transient`].
    pub async fn compose_and_send(
        &self,
        text: &str,
        sender: UserId,
    ) -> Result<SendOutcome, ChatError> {
        match compose(text, sender) {
            Some(payload) => self.send(payload).await.map(|()| SendOutcome::Sent),
            None => Ok(SendOutcome::Skipped),
        }
    }
}
