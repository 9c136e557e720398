// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport for deterministic session tests.
//!
//! `MockTransport` implements [`Transport`] with a FIFO script of connect
//! outcomes. Every successful connect creates a numbered link (0, 1, 2, ...)
//! whose subscribes, sends, and disconnects are recorded, and into which tests
//! can push frames or a close notification.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc, oneshot, watch};

use tradechat_core::{
    ChatError, ConnectRequest, Connection, FrameHeaders, SubscriptionId, Transport,
    TransportEvent, TransportLink,
};

const LINK_EVENT_BUFFER: usize = 64;

/// What the next `connect` call does.
pub enum ConnectScript {
    /// Resolve immediately with a new link.
    Succeed,
    /// Fail immediately with [`ChatError::Connect`].
    Fail(String),
    /// Wait until the paired [`ConnectGate`] is opened or failed.
    Gated(oneshot::Receiver<Result<(), String>>),
    /// Never resolve.
    Hang,
}

/// Test-side control of a [`ConnectScript::Gated`] connect.
pub struct ConnectGate {
    tx: oneshot::Sender<Result<(), String>>,
}

impl ConnectGate {
    /// Let the gated connect succeed.
    pub fn open(self) {
        let _ = self.tx.send(Ok(()));
    }

    /// Let the gated connect fail with `message`.
    pub fn fail(self, message: impl Into<String>) {
        let _ = self.tx.send(Err(message.into()));
    }
}

/// One frame published through a mock connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub destination: String,
    pub headers: FrameHeaders,
    pub body: String,
}

#[derive(Default)]
struct LinkRecord {
    events: Option<mpsc::Sender<TransportEvent>>,
    subscriptions: Vec<(SubscriptionId, String)>,
    unsubscribed: Vec<SubscriptionId>,
    sent: Vec<SentFrame>,
    disconnects: usize,
}

#[derive(Default)]
struct State {
    script: VecDeque<ConnectScript>,
    requests: Vec<ConnectRequest>,
    links: Vec<LinkRecord>,
    fail_subscribes: usize,
    fail_sends: bool,
    hang_subscribes: bool,
    hang_sends: bool,
}

struct Shared {
    state: Mutex<State>,
    connects: watch::Sender<usize>,
    next_subscription: AtomicU64,
}

/// A scripted [`Transport`]. Clones share the same script and records.
///
/// When the script is empty, `connect` succeeds.
#[derive(Clone)]
pub struct MockTransport {
    shared: Arc<Shared>,
}

impl MockTransport {
    pub fn new() -> Self {
        let (connects, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                connects,
                next_subscription: AtomicU64::new(1),
            }),
        }
    }

    /// Queue the outcome of a future `connect` call.
    pub async fn script(&self, outcome: ConnectScript) {
        self.shared.state.lock().await.script.push_back(outcome);
    }

    /// Queue a gated connect and return its control handle.
    pub async fn gate_next(&self) -> ConnectGate {
        let (tx, rx) = oneshot::channel();
        self.script(ConnectScript::Gated(rx)).await;
        ConnectGate { tx }
    }

    /// Make the next `n` subscribe calls fail.
    pub async fn fail_next_subscribes(&self, n: usize) {
        self.shared.state.lock().await.fail_subscribes = n;
    }

    /// Make every send fail (or succeed again) from now on.
    pub async fn fail_sends(&self, fail: bool) {
        self.shared.state.lock().await.fail_sends = fail;
    }

    /// Make every subscribe (or stop making it) block forever, like a peer
    /// that stopped reading.
    pub async fn hang_subscribes(&self, hang: bool) {
        self.shared.state.lock().await.hang_subscribes = hang;
    }

    /// Make every send (or stop making it) block forever.
    pub async fn hang_sends(&self, hang: bool) {
        self.shared.state.lock().await.hang_sends = hang;
    }

    /// Number of `connect` calls so far, including failed and pending ones.
    pub fn connect_count(&self) -> usize {
        *self.shared.connects.borrow()
    }

    /// Wait until at least `n` connect calls have been made.
    pub async fn wait_for_connects(&self, n: usize) {
        let mut rx = self.shared.connects.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    /// Every connect request received, in order.
    pub async fn connect_requests(&self) -> Vec<ConnectRequest> {
        self.shared.state.lock().await.requests.clone()
    }

    /// Number of links handed out by successful connects.
    pub async fn link_count(&self) -> usize {
        self.shared.state.lock().await.links.len()
    }

    /// Topics subscribed on `link`, in order.
    pub async fn subscribed_topics(&self, link: usize) -> Vec<String> {
        self.with_link(link, |l| {
            l.subscriptions.iter().map(|(_, t)| t.clone()).collect()
        })
        .await
    }

    /// Subscription ids unsubscribed on `link`.
    pub async fn unsubscribed(&self, link: usize) -> Vec<SubscriptionId> {
        self.with_link(link, |l| l.unsubscribed.clone()).await
    }

    /// Frames sent on `link`.
    pub async fn sent(&self, link: usize) -> Vec<SentFrame> {
        self.with_link(link, |l| l.sent.clone()).await
    }

    /// Frames sent across all links, in link order.
    pub async fn all_sent(&self) -> Vec<SentFrame> {
        let state = self.shared.state.lock().await;
        state.links.iter().flat_map(|l| l.sent.clone()).collect()
    }

    /// How many times `disconnect` was called on `link`.
    pub async fn disconnects(&self, link: usize) -> usize {
        self.with_link(link, |l| l.disconnects).await
    }

    /// Deliver `body` on the most recent subscription of `link`.
    ///
    /// Returns false if the link has no subscription or its receiver is gone.
    pub async fn inject_frame(&self, link: usize, body: impl Into<String>) -> bool {
        let target = {
            let state = self.shared.state.lock().await;
            state.links.get(link).and_then(|l| {
                let subscription = l.subscriptions.last()?.0.clone();
                Some((l.events.clone()?, subscription))
            })
        };
        match target {
            Some((tx, subscription)) => tx
                .send(TransportEvent::Frame {
                    subscription,
                    body: body.into(),
                })
                .await
                .is_ok(),
            None => false,
        }
    }

    /// Deliver `body` tagged with an arbitrary subscription id.
    pub async fn inject_frame_on(
        &self,
        link: usize,
        subscription: SubscriptionId,
        body: impl Into<String>,
    ) -> bool {
        let tx = {
            let state = self.shared.state.lock().await;
            state.links.get(link).and_then(|l| l.events.clone())
        };
        match tx {
            Some(tx) => tx
                .send(TransportEvent::Frame {
                    subscription,
                    body: body.into(),
                })
                .await
                .is_ok(),
            None => false,
        }
    }

    /// Simulate the server dropping `link` with a close notification.
    pub async fn drop_link(&self, link: usize, reason: impl Into<String>) {
        let tx = {
            let mut state = self.shared.state.lock().await;
            state.links.get_mut(link).and_then(|l| l.events.take())
        };
        if let Some(tx) = tx {
            let _ = tx
                .send(TransportEvent::Closed {
                    reason: reason.into(),
                })
                .await;
        }
    }

    /// Simulate `link`'s event stream ending without a close notification.
    pub async fn end_stream(&self, link: usize) {
        let mut state = self.shared.state.lock().await;
        if let Some(l) = state.links.get_mut(link) {
            l.events = None;
        }
    }

    async fn with_link<T: Default>(&self, link: usize, f: impl FnOnce(&LinkRecord) -> T) -> T {
        let state = self.shared.state.lock().await;
        state.links.get(link).map(f).unwrap_or_default()
    }

    async fn open_link(&self) -> TransportLink {
        let (tx, rx) = mpsc::channel(LINK_EVENT_BUFFER);
        let mut state = self.shared.state.lock().await;
        let index = state.links.len();
        state.links.push(LinkRecord {
            events: Some(tx),
            ..LinkRecord::default()
        });
        TransportLink {
            connection: Box::new(MockConnection {
                shared: Arc::clone(&self.shared),
                index,
                closed: false,
            }),
            events: rx,
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, request: ConnectRequest) -> Result<TransportLink, ChatError> {
        let outcome = {
            let mut state = self.shared.state.lock().await;
            state.requests.push(request);
            state.script.pop_front().unwrap_or(ConnectScript::Succeed)
        };
        self.shared.connects.send_modify(|count| *count += 1);

        match outcome {
            ConnectScript::Succeed => Ok(self.open_link().await),
            ConnectScript::Fail(message) => Err(ChatError::connect(message)),
            ConnectScript::Gated(rx) => match rx.await {
                Ok(Ok(())) => Ok(self.open_link().await),
                Ok(Err(message)) => Err(ChatError::connect(message)),
                Err(_) => Err(ChatError::connect("connect gate dropped")),
            },
            ConnectScript::Hang => std::future::pending().await,
        }
    }
}

struct MockConnection {
    shared: Arc<Shared>,
    index: usize,
    closed: bool,
}

impl MockConnection {
    fn ensure_open(&self) -> Result<(), ChatError> {
        if self.closed {
            Err(ChatError::transport("connection is closed"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn subscribe(&mut self, topic: &str) -> Result<SubscriptionId, ChatError> {
        self.ensure_open()?;
        let mut state = self.shared.state.lock().await;
        if state.hang_subscribes {
            drop(state);
            return std::future::pending().await;
        }
        if state.fail_subscribes > 0 {
            state.fail_subscribes -= 1;
            return Err(ChatError::transport(format!("subscribe to {topic} refused")));
        }
        let n = self.shared.next_subscription.fetch_add(1, Ordering::Relaxed);
        let id = SubscriptionId(format!("mock-sub-{n}"));
        state.links[self.index]
            .subscriptions
            .push((id.clone(), topic.to_string()));
        Ok(id)
    }

    async fn unsubscribe(&mut self, subscription: &SubscriptionId) -> Result<(), ChatError> {
        self.ensure_open()?;
        let mut state = self.shared.state.lock().await;
        state.links[self.index]
            .unsubscribed
            .push(subscription.clone());
        Ok(())
    }

    async fn send(
        &mut self,
        destination: &str,
        headers: &FrameHeaders,
        body: &str,
    ) -> Result<(), ChatError> {
        self.ensure_open()?;
        let mut state = self.shared.state.lock().await;
        if state.hang_sends {
            drop(state);
            return std::future::pending().await;
        }
        if state.fail_sends {
            return Err(ChatError::transport("send refused"));
        }
        state.links[self.index].sent.push(SentFrame {
            destination: destination.to_string(),
            headers: headers.clone(),
            body: body.to_string(),
        });
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), ChatError> {
        let mut state = self.shared.state.lock().await;
        state.links[self.index].disconnects += 1;
        self.closed = true;
        Ok(())
    }
}
