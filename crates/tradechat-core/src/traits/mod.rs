// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! The session manager talks to the outside world only through these traits:
//! a pub/sub [`Transport`], a bearer [`TokenProvider`], and a conversation
//! [`HistoryProvider`]. All use `#[async_trait]` for dynamic dispatch.

pub mod auth;
pub mod history;
pub mod transport;

pub use auth::TokenProvider;
pub use history::HistoryProvider;
pub use transport::{Connection, Transport, TransportLink};
