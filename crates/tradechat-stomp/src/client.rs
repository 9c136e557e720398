// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! STOMP client over a WebSocket.
//!
//! Each connection is served by one task that owns the socket. The task
//! multiplexes outbound requests from the [`StompConnection`] handle, inbound
//! WebSocket messages, outgoing heart-beats and the incoming heart-beat
//! deadline. Frames and the final close notification are forwarded on the
//! link's event channel.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use tradechat_config::StompConfig;
use tradechat_core::{
    ChatError, ConnectRequest, Connection, FrameHeaders, SubscriptionId, Transport,
    TransportEvent, TransportLink,
};

use crate::frame::{Command, Frame, decode_all};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const ACCEPT_VERSION: &str = "1.2,1.1";
const REQUEST_BUFFER: usize = 32;
const DEFAULT_EVENT_BUFFER: usize = 256;

/// Server heart-beats may be late by this factor before the link is declared dead.
const HEARTBEAT_GRACE: u32 = 2;

/// Connection options for [`StompTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompOptions {
    /// Virtual host for the CONNECT frame. Falls back to the endpoint host.
    pub host: Option<String>,
    /// Offered outgoing heart-beat interval. Zero disables.
    pub heartbeat_outgoing: Duration,
    /// Requested incoming heart-beat interval. Zero disables.
    pub heartbeat_incoming: Duration,
    /// Bound on one socket write. Expiry closes the connection.
    pub write_timeout: Duration,
    /// Capacity of each link's event channel.
    pub event_buffer: usize,
}

impl Default for StompOptions {
    fn default() -> Self {
        Self::from_config(&StompConfig::default())
    }
}

impl StompOptions {
    pub fn from_config(config: &StompConfig) -> Self {
        Self {
            host: config.host.clone(),
            heartbeat_outgoing: Duration::from_millis(config.heartbeat_outgoing_ms),
            heartbeat_incoming: Duration::from_millis(config.heartbeat_incoming_ms),
            write_timeout: Duration::from_millis(config.write_timeout_ms),
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

/// Heart-beat intervals agreed in the CONNECT/CONNECTED exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeats {
    /// How often the client must send something.
    pub send_every: Option<Duration>,
    /// How often the server promised to send something.
    pub expect_every: Option<Duration>,
}

impl Heartbeats {
    /// Negotiates from the client offer `(cx, cy)` and the server's
    /// `heart-beat` header `sx,sy`. A missing or malformed header disables both.
    pub fn negotiate(outgoing: Duration, incoming: Duration, server: Option<&str>) -> Self {
        let Some((sx, sy)) = server.and_then(parse_heartbeat) else {
            return Self {
                send_every: None,
                expect_every: None,
            };
        };
        let agree = |ours: Duration, theirs: Duration| {
            (!ours.is_zero() && !theirs.is_zero()).then(|| ours.max(theirs))
        };
        Self {
            send_every: agree(outgoing, sy),
            expect_every: agree(incoming, sx),
        }
    }
}

fn parse_heartbeat(value: &str) -> Option<(Duration, Duration)> {
    let (x, y) = value.split_once(',')?;
    let x = x.trim().parse().ok()?;
    let y = y.trim().parse().ok()?;
    Some((Duration::from_millis(x), Duration::from_millis(y)))
}

/// Host part of a `ws://` / `wss://` URL, without credentials or port.
pub fn endpoint_host(endpoint: &str) -> Option<&str> {
    let rest = endpoint.split_once("://").map_or(endpoint, |(_, r)| r);
    let authority = rest.split(['/', '?', '#']).next()?;
    let authority = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = match authority.strip_prefix('[') {
        Some(v6) => v6.split(']').next()?,
        None => authority.split(':').next()?,
    };
    (!host.is_empty()).then_some(host)
}

/// [`Transport`] speaking STOMP 1.2 over a WebSocket.
#[derive(Debug, Clone, Default)]
pub struct StompTransport {
    options: StompOptions,
}

impl StompTransport {
    pub fn new(options: StompOptions) -> Self {
        Self { options }
    }

    fn connect_frame(&self, request: &ConnectRequest) -> Frame {
        let host = self
            .options
            .host
            .as_deref()
            .or_else(|| endpoint_host(&request.endpoint))
            .unwrap_or("localhost");
        let mut frame = Frame::new(Command::Connect)
            .header("accept-version", ACCEPT_VERSION)
            .header("host", host)
            .header(
                "heart-beat",
                format!(
                    "{},{}",
                    self.options.heartbeat_outgoing.as_millis(),
                    self.options.heartbeat_incoming.as_millis()
                ),
            );
        frame.headers.extend(request.headers.iter().cloned());
        frame
    }
}

#[async_trait]
impl Transport for StompTransport {
    async fn connect(&self, request: ConnectRequest) -> Result<TransportLink, ChatError> {
        debug!(endpoint = %request.endpoint, "opening websocket");
        let (mut ws, _response) = tokio_tungstenite::connect_async(request.endpoint.as_str())
            .await
            .map_err(|e| ChatError::Connect {
                message: format!("websocket connect to {} failed: {e}", request.endpoint),
                source: Some(Box::new(e)),
            })?;

        let connect = self.connect_frame(&request);
        ws.send(WsMessage::text(connect.encode()))
            .await
            .map_err(|e| ChatError::Connect {
                message: format!("failed to send CONNECT: {e}"),
                source: Some(Box::new(e)),
            })?;

        let connected = await_connected(&mut ws).await?;
        let heartbeats = Heartbeats::negotiate(
            self.options.heartbeat_outgoing,
            self.options.heartbeat_incoming,
            connected.get("heart-beat"),
        );
        info!(
            endpoint = %request.endpoint,
            version = connected.get("version").unwrap_or("1.0"),
            ?heartbeats,
            "stomp session established"
        );

        let (request_tx, request_rx) = mpsc::channel(REQUEST_BUFFER);
        let (event_tx, event_rx) = mpsc::channel(self.options.event_buffer.max(1));
        tokio::spawn(run_connection(
            ws,
            request_rx,
            event_tx,
            heartbeats,
            self.options.write_timeout,
        ));

        Ok(TransportLink {
            connection: Box::new(StompConnection {
                requests: request_tx,
                next_subscription: 0,
                closed: false,
            }),
            events: event_rx,
        })
    }
}

/// Reads until the server answers CONNECT.
async fn await_connected(ws: &mut WsStream) -> Result<Frame, ChatError> {
    while let Some(message) = ws.next().await {
        let text = match message {
            Ok(WsMessage::Text(text)) => text.as_str().to_owned(),
            Ok(WsMessage::Binary(data)) => String::from_utf8_lossy(&data).into_owned(),
            Ok(WsMessage::Close(frame)) => {
                return Err(ChatError::connect(format!(
                    "server closed the socket during handshake: {frame:?}"
                )));
            }
            Ok(_) => continue,
            Err(e) => {
                return Err(ChatError::Connect {
                    message: format!("websocket error during handshake: {e}"),
                    source: Some(Box::new(e)),
                });
            }
        };

        let frames = decode_all(&text).map_err(|e| ChatError::Connect {
            message: format!("malformed handshake frame: {e}"),
            source: Some(Box::new(e)),
        })?;
        if let Some(frame) = frames.into_iter().next() {
            return match frame.command {
                Command::Connected => Ok(frame),
                Command::Error => Err(ChatError::connect(format!(
                    "server rejected CONNECT: {}",
                    error_summary(&frame)
                ))),
                other => Err(ChatError::connect(format!(
                    "expected CONNECTED, got {other}"
                ))),
            };
        }
    }
    Err(ChatError::connect("socket ended before CONNECTED"))
}

fn error_summary(frame: &Frame) -> String {
    match (frame.get("message"), frame.body.trim()) {
        (Some(message), "") => message.to_string(),
        (Some(message), body) => format!("{message}: {body}"),
        (None, "") => "no details".to_string(),
        (None, body) => body.to_string(),
    }
}

enum Request {
    Frame {
        frame: Frame,
        reply: oneshot::Sender<Result<(), ChatError>>,
    },
    Disconnect {
        reply: oneshot::Sender<()>,
    },
}

/// Why the connection task stopped.
enum Exit {
    /// The client asked to disconnect; no close event is emitted.
    Requested,
    Lost(String),
}

async fn run_connection(
    mut ws: WsStream,
    mut requests: mpsc::Receiver<Request>,
    events: mpsc::Sender<TransportEvent>,
    heartbeats: Heartbeats,
    write_timeout: Duration,
) {
    let mut heartbeat = heartbeats.send_every.map(|every| {
        let mut interval = tokio::time::interval_at(Instant::now() + every, every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });
    let read_timeout = heartbeats.expect_every.map(|every| every * HEARTBEAT_GRACE);
    let mut last_read = Instant::now();

    let exit = loop {
        let read_deadline = read_timeout.map(|timeout| last_read + timeout);

        tokio::select! {
            request = requests.recv() => match request {
                Some(Request::Frame { frame, reply }) => {
                    match write(&mut ws, WsMessage::text(frame.encode()), write_timeout).await {
                        Ok(()) => {
                            let _ = reply.send(Ok(()));
                        }
                        Err(e) => {
                            let reason = format!("write failed: {e}");
                            let _ = reply.send(Err(ChatError::transport(reason.clone())));
                            break Exit::Lost(reason);
                        }
                    }
                }
                Some(Request::Disconnect { reply }) => {
                    let disconnect = WsMessage::text(Frame::new(Command::Disconnect).encode());
                    if write(&mut ws, disconnect, write_timeout).await.is_ok() {
                        close(&mut ws, write_timeout).await;
                    }
                    let _ = reply.send(());
                    break Exit::Requested;
                }
                None => {
                    close(&mut ws, write_timeout).await;
                    break Exit::Requested;
                }
            },

            message = ws.next() => {
                last_read = Instant::now();
                let text = match message {
                    Some(Ok(WsMessage::Text(text))) => text.as_str().to_owned(),
                    Some(Ok(WsMessage::Binary(data))) => String::from_utf8_lossy(&data).into_owned(),
                    Some(Ok(WsMessage::Close(frame))) => {
                        break Exit::Lost(match frame {
                            Some(frame) => format!("closed by server: {} {}", u16::from(frame.code), frame.reason.as_str()),
                            None => "closed by server".to_string(),
                        });
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => break Exit::Lost(format!("websocket error: {e}")),
                    None => break Exit::Lost("websocket stream ended".to_string()),
                };
                if let Some(reason) = dispatch(&text, &events).await {
                    break Exit::Lost(reason);
                }
            }

            _ = tick(&mut heartbeat) => {
                if let Err(e) = write(&mut ws, WsMessage::text("\n"), write_timeout).await {
                    break Exit::Lost(format!("heart-beat write failed: {e}"));
                }
            }

            _ = deadline(read_deadline) => {
                break Exit::Lost("missed server heart-beats".to_string());
            }
        }
    };

    if let Exit::Lost(reason) = exit {
        warn!(%reason, "stomp connection lost");
        let _ = events.send(TransportEvent::Closed { reason }).await;
    } else {
        debug!("stomp connection closed");
    }
}

/// Forwards the frames in one WebSocket message. Returns a close reason
/// when the server sent ERROR.
async fn dispatch(text: &str, events: &mpsc::Sender<TransportEvent>) -> Option<String> {
    let frames = match decode_all(text) {
        Ok(frames) => frames,
        Err(e) => {
            warn!(error = %e, "discarding undecodable websocket message");
            return None;
        }
    };

    for frame in frames {
        match frame.command {
            Command::Message => {
                let Some(subscription) = frame.get("subscription").map(str::to_string) else {
                    warn!("MESSAGE frame without subscription header");
                    continue;
                };
                let event = TransportEvent::Frame {
                    subscription: SubscriptionId(subscription),
                    body: frame.body,
                };
                if events.send(event).await.is_err() {
                    debug!("event receiver dropped, discarding frame");
                }
            }
            Command::Error => return Some(format!("server error: {}", error_summary(&frame))),
            other => debug!(command = %other, "ignoring server frame"),
        }
    }
    None
}

/// Sends one message, giving up once `limit` passes without completion.
async fn write(ws: &mut WsStream, message: WsMessage, limit: Duration) -> Result<(), String> {
    match tokio::time::timeout(limit, ws.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("peer accepted nothing for {limit:?}")),
    }
}

async fn close(ws: &mut WsStream, limit: Duration) {
    if tokio::time::timeout(limit, ws.close(None)).await.is_err() {
        debug!("websocket close handshake timed out");
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn deadline(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Handle to one STOMP connection.
pub struct StompConnection {
    requests: mpsc::Sender<Request>,
    next_subscription: u64,
    closed: bool,
}

impl std::fmt::Debug for StompConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StompConnection")
            .field("next_subscription", &self.next_subscription)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl StompConnection {
    async fn request(&mut self, frame: Frame) -> Result<(), ChatError> {
        if self.closed {
            return Err(ChatError::transport("connection is closed"));
        }
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(Request::Frame { frame, reply })
            .await
            .map_err(|_| ChatError::transport("connection is closed"))?;
        rx.await
            .map_err(|_| ChatError::transport("connection closed before the frame was written"))?
    }
}

#[async_trait]
impl Connection for StompConnection {
    async fn subscribe(&mut self, topic: &str) -> Result<SubscriptionId, ChatError> {
        self.next_subscription += 1;
        let id = format!("sub-{}", self.next_subscription);
        let frame = Frame::new(Command::Subscribe)
            .header("id", id.as_str())
            .header("destination", topic)
            .header("ack", "auto");
        self.request(frame).await?;
        debug!(%topic, subscription = %id, "subscribed");
        Ok(SubscriptionId(id))
    }

    async fn unsubscribe(&mut self, subscription: &SubscriptionId) -> Result<(), ChatError> {
        let frame = Frame::new(Command::Unsubscribe).header("id", subscription.0.as_str());
        self.request(frame).await
    }

    async fn send(
        &mut self,
        destination: &str,
        headers: &FrameHeaders,
        body: &str,
    ) -> Result<(), ChatError> {
        let mut frame = Frame::new(Command::Send).header("destination", destination);
        frame.headers.extend(
            headers
                .iter()
                .filter(|(name, _)| name != "destination" && name != "content-length")
                .cloned(),
        );
        let frame = frame
            .header("content-length", body.len().to_string())
            .body(body);
        self.request(frame).await
    }

    async fn disconnect(&mut self) -> Result<(), ChatError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let (reply, rx) = oneshot::channel();
        if self.requests.send(Request::Disconnect { reply }).await.is_ok() {
            let _ = rx.await;
        }
        Ok(())
    }
}
