// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publish/subscribe transport abstraction (STOMP over WebSocket in production).

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::ChatError;
use crate::types::{ConnectRequest, FrameHeaders, SubscriptionId, TransportEvent};

/// Factory for transport connections.
///
/// `connect` resolves once the connection is open and authenticated, or fails
/// with [`ChatError::Connect`]. It never resolves to a half-open connection.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn connect(&self, request: ConnectRequest) -> Result<TransportLink, ChatError>;
}

/// One established connection.
///
/// The owner holds the `Connection` exclusively; pushed frames and the close
/// notification arrive on the paired [`TransportLink::events`] receiver.
#[async_trait]
pub trait Connection: Send + 'static {
    /// Registers for frames on `topic`, returning the subscription handle.
    async fn subscribe(&mut self, topic: &str) -> Result<SubscriptionId, ChatError>;

    /// Cancels a subscription previously returned by [`Connection::subscribe`].
    async fn unsubscribe(&mut self, subscription: &SubscriptionId) -> Result<(), ChatError>;

    /// Publishes `body` to `destination`.
    async fn send(
        &mut self,
        destination: &str,
        headers: &FrameHeaders,
        body: &str,
    ) -> Result<(), ChatError>;

    /// Closes the connection. Calling it on an already closed connection is a no-op.
    async fn disconnect(&mut self) -> Result<(), ChatError>;
}

/// An open connection together with its inbound event stream.
pub struct TransportLink {
    pub connection: Box<dyn Connection>,
    pub events: mpsc::Receiver<TransportEvent>,
}

impl std::fmt::Debug for TransportLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportLink").finish_non_exhaustive()
    }
}
