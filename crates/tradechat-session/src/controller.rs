// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The session actor: one task that owns the transport connection, the single
//! subscription, and the conversation logs.
//!
//! Commands from the handle, connect results, and pushed transport events are
//! all processed on this task, one at a time. Every connect attempt gets a
//! fresh attempt id, and every teardown bumps it, so results and frames from
//! an abandoned attempt are recognized and dropped.

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use tradechat_core::tokens::bearer_header;
use tradechat_core::{
    ChatError, ChatPayload, ConnectRequest, Connection, Conversation, ConversationId,
    FrameHeaders, Message, SubscriptionId, TokenProvider, Transport, TransportEvent,
    TransportLink, TransportState,
};

use crate::events::{ErrorKind, SessionEvent};
use crate::router::{Binding, InboundRouter};
use crate::settings::SessionSettings;

/// Upper bound on best-effort unsubscribe + disconnect during teardown.
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Capacity of the channel carrying connect results and pumped events.
const INTERNAL_BUFFER: usize = 64;

/// A point-in-time view of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: TransportState,
    /// The conversation the session is bound to, or becoming bound to.
    pub target: Option<ConversationId>,
    /// Consecutive failed attempts since the last successful subscribe.
    pub retry_count: u32,
    /// Time until the pending reconnect, if one is scheduled.
    pub next_retry_in: Option<Duration>,
}

pub(crate) enum Command {
    Bind {
        conversation: Option<ConversationId>,
        seed: Option<Vec<Message>>,
        reply: oneshot::Sender<()>,
    },
    Send {
        payload: ChatPayload,
        reply: oneshot::Sender<Result<(), ChatError>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Conversation {
        id: ConversationId,
        reply: oneshot::Sender<Option<Conversation>>,
    },
}

enum Internal {
    Connected {
        attempt: u64,
        conversation: ConversationId,
        result: Result<TransportLink, ChatError>,
    },
    /// `None` means the link's event stream ended.
    Transport {
        attempt: u64,
        event: Option<TransportEvent>,
    },
}

struct ActiveLink {
    binding: Binding,
    connection: Box<dyn Connection>,
    pump: JoinHandle<()>,
}

pub(crate) struct SessionActor {
    settings: SessionSettings,
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenProvider>,
    router: InboundRouter,
    state: TransportState,
    target: Option<ConversationId>,
    attempt: u64,
    link: Option<ActiveLink>,
    retry_count: u32,
    retry_at: Option<Instant>,
    events: broadcast::Sender<SessionEvent>,
    state_tx: watch::Sender<TransportState>,
    internal_tx: mpsc::Sender<Internal>,
    internal_rx: mpsc::Receiver<Internal>,
}

impl SessionActor {
    pub(crate) fn new(
        settings: SessionSettings,
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenProvider>,
        events: broadcast::Sender<SessionEvent>,
        state_tx: watch::Sender<TransportState>,
    ) -> Self {
        let (internal_tx, internal_rx) = mpsc::channel(INTERNAL_BUFFER);
        Self {
            settings,
            transport,
            tokens,
            router: InboundRouter::new(),
            state: TransportState::Disconnected,
            target: None,
            attempt: 0,
            link: None,
            retry_count: 0,
            retry_at: None,
            events,
            state_tx,
            internal_tx,
            internal_rx,
        }
    }

    /// Runs until a shutdown command is processed or every handle is dropped.
    pub(crate) async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        debug!("session actor started");
        loop {
            let retry_at = self.retry_at;
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        debug!("session handle dropped");
                        self.shutdown().await;
                        break;
                    };
                    if self.handle_command(command).await.is_break() {
                        break;
                    }
                }
                Some(internal) = self.internal_rx.recv() => self.handle_internal(internal).await,
                _ = tokio::time::sleep_until(retry_at.unwrap_or_else(Instant::now)), if retry_at.is_some() => {
                    self.fire_reconnect();
                }
            }
        }
        debug!("session actor stopped");
    }

    async fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Bind {
                conversation,
                seed,
                reply,
            } => {
                self.bind(conversation, seed).await;
                let _ = reply.send(());
            }
            Command::Send { payload, reply } => {
                let _ = reply.send(self.send(payload).await);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::Conversation { id, reply } => {
                let _ = reply.send(self.router.conversation(&id));
            }
            Command::Shutdown { reply } => {
                self.shutdown().await;
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    async fn handle_internal(&mut self, internal: Internal) {
        match internal {
            Internal::Connected {
                attempt,
                conversation,
                result,
            } => self.on_connect_finished(attempt, conversation, result).await,
            Internal::Transport { attempt, event } => self.on_transport_event(attempt, event),
        }
    }

    async fn bind(&mut self, conversation: Option<ConversationId>, seed: Option<Vec<Message>>) {
        if let Some(id) = &conversation
            && self.target.as_ref() == Some(id)
            && self.state == TransportState::Subscribed
        {
            debug!(conversation = %id, "already bound and subscribed");
            return;
        }

        self.teardown().await;
        self.retry_count = 0;
        self.target = conversation;

        let Some(id) = self.target.clone() else {
            info!("unbound from conversation");
            return;
        };
        if let Some(messages) = seed {
            debug!(conversation = %id, count = messages.len(), "seeding conversation from history");
            self.router.seed(id.clone(), messages);
        }
        self.start_connect(id);
    }

    async fn send(&mut self, payload: ChatPayload) -> Result<(), ChatError> {
        let state = self.state;
        let link = match self.link.as_mut() {
            Some(link) if state == TransportState::Subscribed => link,
            _ => {
                debug!(%state, "send rejected: not subscribed");
                return Err(ChatError::NotConnected { state });
            }
        };

        let destination = self
            .settings
            .destinations
            .send_destination(&link.binding.conversation);
        let body = serde_json::to_string(&payload)
            .map_err(|e| ChatError::Internal(format!("failed to encode chat payload: {e}")))?;
        let headers: FrameHeaders = vec![("content-type".into(), "application/json".into())];

        let sent = bounded(
            self.settings.request_timeout,
            link.connection.send(&destination, &headers, &body),
        )
        .await;
        match sent {
            Ok(()) => {
                debug!(%destination, "message sent");
                Ok(())
            }
            Err(e @ ChatError::Timeout { .. }) => {
                warn!(%destination, error = %e, "send stalled, dropping connection");
                self.on_dropped(format!("send stalled: {e}"));
                Err(e)
            }
            Err(e) => {
                warn!(%destination, error = %e, "send failed");
                Err(e)
            }
        }
    }

    async fn shutdown(&mut self) {
        self.teardown().await;
        self.target = None;
        self.retry_count = 0;
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            target: self.target.clone(),
            retry_count: self.retry_count,
            next_retry_in: self
                .retry_at
                .map(|at| at.saturating_duration_since(Instant::now())),
        }
    }

    /// Cancels the pending retry, invalidates in-flight work, and closes the
    /// current link. Unsubscribe and disconnect errors are logged only.
    async fn teardown(&mut self) {
        self.retry_at = None;
        self.attempt += 1;

        if let Some(mut link) = self.link.take() {
            link.pump.abort();
            let binding = link.binding;
            let close = async {
                if let Err(e) = link.connection.unsubscribe(&binding.subscription).await {
                    warn!(conversation = %binding.conversation, error = %e, "unsubscribe failed");
                }
                if let Err(e) = link.connection.disconnect().await {
                    warn!(conversation = %binding.conversation, error = %e, "disconnect failed");
                }
            };
            if tokio::time::timeout(TEARDOWN_TIMEOUT, close).await.is_err() {
                warn!(conversation = %binding.conversation, "teardown timed out");
            }
            info!(conversation = %binding.conversation, "closed conversation transport");
        }

        self.set_state(TransportState::Disconnected);
    }

    fn start_connect(&mut self, conversation: ConversationId) {
        self.attempt += 1;
        let attempt = self.attempt;
        self.set_state(TransportState::Connecting);
        info!(conversation = %conversation, attempt, "connecting");

        let transport = Arc::clone(&self.transport);
        let tokens = Arc::clone(&self.tokens);
        let endpoint = self.settings.endpoint.clone();
        let timeout = self.settings.connect_timeout;
        let tx = self.internal_tx.clone();

        tokio::spawn(async move {
            let result = connect_once(transport.as_ref(), tokens.as_ref(), endpoint, timeout).await;
            let _ = tx
                .send(Internal::Connected {
                    attempt,
                    conversation,
                    result,
                })
                .await;
        });
    }

    async fn on_connect_finished(
        &mut self,
        attempt: u64,
        conversation: ConversationId,
        result: Result<TransportLink, ChatError>,
    ) {
        if attempt != self.attempt {
            debug!(attempt, current = self.attempt, conversation = %conversation, "discarding stale connect result");
            if let Ok(orphan) = result {
                close_detached(orphan.connection, "orphaned connection");
            }
            return;
        }

        let TransportLink {
            mut connection,
            events,
        } = match result {
            Ok(link) => link,
            Err(e) => {
                warn!(conversation = %conversation, attempt, error = %e, "connect failed");
                self.emit(SessionEvent::Error {
                    kind: ErrorKind::Connect,
                    message: e.to_string(),
                });
                self.connection_lost();
                return;
            }
        };

        self.set_state(TransportState::Connected);

        let topic = self.settings.destinations.topic(&conversation);
        match bounded(self.settings.request_timeout, connection.subscribe(&topic)).await {
            Ok(subscription) => {
                info!(conversation = %conversation, attempt, %subscription, "subscribed");
                let pump = spawn_pump(attempt, events, self.internal_tx.clone());
                self.link = Some(ActiveLink {
                    binding: Binding {
                        attempt,
                        subscription,
                        conversation,
                    },
                    connection,
                    pump,
                });
                self.retry_count = 0;
                self.set_state(TransportState::Subscribed);
            }
            Err(e) => {
                warn!(conversation = %conversation, %topic, error = %e, "subscribe failed");
                close_detached(connection, "connection after subscribe failure");
                self.emit(SessionEvent::Error {
                    kind: ErrorKind::Transport,
                    message: e.to_string(),
                });
                self.connection_lost();
            }
        }
    }

    fn on_transport_event(&mut self, attempt: u64, event: Option<TransportEvent>) {
        if attempt != self.attempt || self.link.is_none() {
            debug!(attempt, current = self.attempt, "discarding event from stale connection");
            return;
        }

        match event {
            Some(TransportEvent::Frame { subscription, body }) => {
                self.on_frame(attempt, &subscription, &body);
            }
            Some(TransportEvent::Closed { reason }) => self.on_dropped(reason),
            None => self.on_dropped("transport event stream ended".to_string()),
        }
    }

    fn on_frame(&mut self, attempt: u64, subscription: &SubscriptionId, body: &str) {
        let bound = self.link.as_ref().map(|link| &link.binding);
        match self.router.route(bound, attempt, subscription, body) {
            Ok(message) => {
                if let Some(conversation) = bound.map(|b| b.conversation.clone()) {
                    debug!(conversation = %conversation, sender = %message.sender_id, "message appended");
                    self.emit(SessionEvent::MessageAppended {
                        conversation,
                        message,
                    });
                }
            }
            Err(e @ ChatError::StaleSubscription { .. }) => {
                debug!(error = %e, "discarding stale frame");
            }
            Err(e) => {
                warn!(error = %e, body_len = body.len(), "dropping malformed frame");
                self.emit(SessionEvent::Error {
                    kind: ErrorKind::Parse,
                    message: e.to_string(),
                });
            }
        }
    }

    fn on_dropped(&mut self, reason: String) {
        if let Some(link) = self.link.take() {
            link.pump.abort();
            warn!(conversation = %link.binding.conversation, %reason, "transport dropped");
        }
        self.emit(SessionEvent::Error {
            kind: ErrorKind::Transport,
            message: reason,
        });
        self.connection_lost();
    }

    /// Marks the session failed and schedules the next retry, if the policy allows one.
    fn connection_lost(&mut self) {
        self.set_state(TransportState::Failed);
        if self.target.is_none() {
            return;
        }

        self.retry_count += 1;
        match self.settings.reconnect.delay_for(self.retry_count) {
            Some(delay) => {
                self.retry_at = Some(Instant::now() + delay);
                info!(attempt = self.retry_count, ?delay, "reconnect scheduled");
                self.emit(SessionEvent::ReconnectScheduled {
                    attempt: self.retry_count,
                    delay,
                });
            }
            None => {
                self.retry_at = None;
                warn!(
                    failures = self.retry_count,
                    "giving up on reconnect; rebind to try again"
                );
            }
        }
    }

    fn fire_reconnect(&mut self) {
        self.retry_at = None;
        if let Some(conversation) = self.target.clone() {
            info!(conversation = %conversation, attempt = self.retry_count, "reconnecting");
            self.start_connect(conversation);
        }
    }

    fn set_state(&mut self, to: TransportState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        debug!(%from, %to, "transport state changed");
        // Event first, so a watcher woken by the new state finds it published.
        self.emit(SessionEvent::StateChanged { from, to });
        self.state_tx.send_replace(to);
    }

    fn emit(&self, event: SessionEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }
}

async fn connect_once(
    transport: &dyn Transport,
    tokens: &dyn TokenProvider,
    endpoint: String,
    timeout: Option<Duration>,
) -> Result<TransportLink, ChatError> {
    let mut headers = FrameHeaders::new();
    match tokens.bearer_token().await {
        Ok(Some(token)) => headers.push(("Authorization".into(), bearer_header(&token))),
        Ok(None) => debug!("no bearer token, connecting anonymously"),
        Err(e) => warn!(error = %e, "token provider failed, connecting anonymously"),
    }

    let request = ConnectRequest { endpoint, headers };
    bounded(timeout, transport.connect(request)).await
}

/// Awaits `call`, failing with [`ChatError::Timeout`] once `limit` passes.
async fn bounded<T>(
    limit: Option<Duration>,
    call: impl Future<Output = Result<T, ChatError>>,
) -> Result<T, ChatError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| ChatError::Timeout { duration: limit })?,
        None => call.await,
    }
}

/// Disconnects a connection the actor no longer tracks, off the actor task.
fn close_detached(mut connection: Box<dyn Connection>, what: &'static str) {
    tokio::spawn(async move {
        match tokio::time::timeout(TEARDOWN_TIMEOUT, connection.disconnect()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "failed to close {what}"),
            Err(_) => debug!("closing {what} timed out"),
        }
    });
}

/// Forwards a link's events to the actor, tagged with its attempt id.
fn spawn_pump(
    attempt: u64,
    mut events: mpsc::Receiver<TransportEvent>,
    tx: mpsc::Sender<Internal>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let closed = matches!(event, TransportEvent::Closed { .. });
            if tx
                .send(Internal::Transport {
                    attempt,
                    event: Some(event),
                })
                .await
                .is_err()
                || closed
            {
                return;
            }
        }
        let _ = tx.send(Internal::Transport { attempt, event: None }).await;
    })
}
