// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer token supply for transport and history authentication.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::ChatError;

/// Supplies the bearer token injected as `Authorization: Bearer {token}`.
///
/// Consulted on every connect attempt, so a rotated token is picked up by the
/// next reconnect. `Ok(None)` means connect anonymously.
#[async_trait]
pub trait TokenProvider: Send + Sync + 'static {
    async fn bearer_token(&self) -> Result<Option<SecretString>, ChatError>;
}
