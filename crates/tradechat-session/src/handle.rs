// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The owning handle of a session and the builder that spawns it.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{Instrument, debug, info_span, warn};

use tradechat_core::tokens::Anonymous;
use tradechat_core::{
    ChatError, ChatPayload, Conversation, ConversationId, HistoryProvider, TokenProvider,
    Transport, TransportState,
};

use crate::controller::{Command, SessionActor, SessionSnapshot};
use crate::events::{ErrorKind, SessionEvent};
use crate::settings::SessionSettings;

const COMMAND_BUFFER: usize = 32;

/// Collects a session's collaborators before spawning it.
pub struct SessionBuilder {
    settings: SessionSettings,
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenProvider>,
    history: Option<Arc<dyn HistoryProvider>>,
}

impl SessionBuilder {
    /// Anonymous, without history, until configured otherwise.
    pub fn new(settings: SessionSettings, transport: Arc<dyn Transport>) -> Self {
        Self {
            settings,
            transport,
            tokens: Arc::new(Anonymous),
            history: None,
        }
    }

    pub fn tokens(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn history(mut self, history: Arc<dyn HistoryProvider>) -> Self {
        self.history = Some(history);
        self
    }

    /// Spawns the session actor on the current tokio runtime.
    pub fn spawn(self) -> SessionHandle {
        let (events, _) = broadcast::channel(self.settings.event_buffer.max(1));
        let (state_tx, state) = watch::channel(TransportState::Disconnected);
        let (commands, commands_rx) = mpsc::channel(COMMAND_BUFFER);

        let actor = SessionActor::new(
            self.settings,
            self.transport,
            self.tokens,
            events.clone(),
            state_tx,
        );
        tokio::spawn(actor.run(commands_rx).instrument(info_span!("session")));

        SessionHandle {
            commands,
            events,
            state,
            history: self.history,
        }
    }
}

/// Exclusive owner of one session.
///
/// Dropping the handle tears the session down.
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<SessionEvent>,
    state: watch::Receiver<TransportState>,
    history: Option<Arc<dyn HistoryProvider>>,
}

impl SessionHandle {
    /// Binds the session to `conversation`, or to nothing with `None`.
    ///
    /// Returns once the previous connection is torn down and the new connect
    /// attempt has started; watch [`SessionHandle::state_watch`] for progress.
    pub async fn bind_conversation(
        &self,
        conversation: Option<ConversationId>,
    ) -> Result<(), ChatError> {
        self.request(|reply| Command::Bind {
            conversation,
            seed: None,
            reply,
        })
        .await
    }

    /// Seeds the conversation's log from history, then binds to it.
    ///
    /// A history failure is logged and published as an error event; the bind
    /// still happens without seeding.
    pub async fn open_conversation(&self, id: ConversationId) -> Result<(), ChatError> {
        let seed = match &self.history {
            Some(history) => match history.fetch_conversations().await {
                Ok(conversations) => Some(
                    conversations
                        .into_iter()
                        .find(|c| c.id == id)
                        .map(|c| c.messages)
                        .unwrap_or_default(),
                ),
                Err(e) => {
                    warn!(conversation = %id, error = %e, "history fetch failed, opening without it");
                    let _ = self.events.send(SessionEvent::Error {
                        kind: ErrorKind::History,
                        message: e.to_string(),
                    });
                    None
                }
            },
            None => None,
        };

        self.request(|reply| Command::Bind {
            conversation: Some(id),
            seed,
            reply,
        })
        .await
    }

    /// Publishes `payload` to the bound conversation.
    ///
    /// Fails with [`ChatError::NotConnected`] unless the session is subscribed.
    /// Never retried and never appended locally; the server echo is.
    pub async fn send(&self, payload: ChatPayload) -> Result<(), ChatError> {
        self.request(|reply| Command::Send { payload, reply })
            .await?
    }

    /// Tears the session down and stops it. Calling it again is a no-op.
    pub async fn shutdown(&self) -> Result<(), ChatError> {
        match self.request(|reply| Command::Shutdown { reply }).await {
            Err(ChatError::SessionClosed) => {
                debug!("shutdown on a stopped session");
                Ok(())
            }
            other => other,
        }
    }

    /// Current transport state.
    pub fn state(&self) -> TransportState {
        *self.state.borrow()
    }

    pub fn state_watch(&self) -> watch::Receiver<TransportState> {
        self.state.clone()
    }

    /// Subscribes to session events from now on.
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Snapshot of a conversation's log.
    pub async fn conversation(&self, id: ConversationId) -> Result<Option<Conversation>, ChatError> {
        self.request(|reply| Command::Conversation { id, reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, ChatError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ChatError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| ChatError::SessionClosed)?;
        rx.await.map_err(|_| ChatError::SessionClosed)
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("state", &self.state())
            .field("history", &self.history.is_some())
            .finish_non_exhaustive()
    }
}
