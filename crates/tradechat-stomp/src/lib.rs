// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! STOMP 1.2 over WebSocket transport.
//!
//! [`StompTransport`] implements [`tradechat_core::Transport`]: it opens the
//! socket, performs the CONNECT/CONNECTED handshake with the caller's
//! `Authorization` header, negotiates heart-beats, and hands back a
//! [`tradechat_core::TransportLink`] whose event channel carries MESSAGE
//! bodies and the final close notification.

pub mod client;
pub mod frame;

pub use client::{Heartbeats, StompConnection, StompOptions, StompTransport, endpoint_host};
pub use frame::{Command, Frame, FrameError, decode_all};
