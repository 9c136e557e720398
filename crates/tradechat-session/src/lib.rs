// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconnecting publish/subscribe session manager for one chat conversation
//! at a time.
//!
//! A session is an actor task owning the transport connection and the single
//! active subscription. [`SessionHandle`] is its owning handle:
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use tradechat_core::{ConversationId, Transport, UserId};
//! # use tradechat_session::{SessionBuilder, SessionSettings};
//! # async fn demo(transport: Arc<dyn Transport>) -> Result<(), tradechat_core::ChatError> {
//! let session = SessionBuilder::new(SessionSettings::new("ws://127.0.0.1:8080/ws"), transport).spawn();
//! session.bind_conversation(Some(ConversationId::from("c1"))).await?;
//! session.compose_and_send("hello", UserId::from(2i64)).await?;
//! session.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod destinations;
pub mod events;
pub mod handle;
pub mod outbound;
pub mod reconnect;
pub mod router;
pub mod settings;

pub use controller::SessionSnapshot;
pub use destinations::Destinations;
pub use events::{ErrorKind, SessionEvent};
pub use handle::{SessionBuilder, SessionHandle};
pub use outbound::{SendOutcome, compose};
pub use reconnect::ReconnectPolicy;
pub use router::{Binding, InboundRouter};
pub use settings::SessionSettings;
