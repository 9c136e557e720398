// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tradechat integration tests.
//!
//! Provides scripted collaborators so session behavior can be tested
//! deterministically without a broker or a REST API.
//!
//! # Components
//!
//! - [`MockTransport`] - Scripted connect outcomes, frame injection, and call recording
//! - [`MockHistory`] - Canned conversation history or a canned failure
//! - [`fixtures`] - Message and frame builders

pub mod fixtures;
pub mod mock_history;
pub mod mock_transport;

pub use mock_history::MockHistory;
pub use mock_transport::{ConnectGate, ConnectScript, MockTransport, SentFrame};
