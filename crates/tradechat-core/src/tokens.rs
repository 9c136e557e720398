// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in [`TokenProvider`] implementations.

use std::path::PathBuf;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::error::ChatError;
use crate::traits::TokenProvider;

/// Never supplies a token; every connection is anonymous.
#[derive(Debug, Default, Clone, Copy)]
pub struct Anonymous;

#[async_trait]
impl TokenProvider for Anonymous {
    async fn bearer_token(&self) -> Result<Option<SecretString>, ChatError> {
        Ok(None)
    }
}

/// A fixed token, typically taken from configuration.
pub struct StaticToken {
    token: SecretString,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken([REDACTED])")
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self) -> Result<Option<SecretString>, ChatError> {
        Ok(Some(self.token.clone()))
    }
}

/// Reads the token from a file on every call, so an external login process
/// can rotate it between reconnects. A missing or empty file means anonymous.
#[derive(Debug, Clone)]
pub struct FileToken {
    path: PathBuf,
}

impl FileToken {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenProvider for FileToken {
    async fn bearer_token(&self) -> Result<Option<SecretString>, ChatError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let token = content.trim();
                if token.is_empty() {
                    debug!(path = %self.path.display(), "token file is empty");
                    Ok(None)
                } else {
                    Ok(Some(SecretString::from(token.to_string())))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "token file not found");
                Ok(None)
            }
            Err(e) => Err(ChatError::Config(format!(
                "failed to read token file {}: {e}",
                self.path.display()
            ))),
        }
    }
}

/// Formats the `Authorization` header value for a token.
pub fn bearer_header(token: &SecretString) -> String {
    format!("Bearer {}", token.expose_secret())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn anonymous_has_no_token() {
        assert!(Anonymous.bearer_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn static_token_is_returned_and_redacted_in_debug() {
        let provider = StaticToken::new("abc.def");
        let token = provider.bearer_token().await.unwrap().unwrap();
        assert_eq!(bearer_header(&token), "Bearer abc.def");
        assert_eq!(format!("{provider:?}"), "StaticToken([REDACTED])");
    }

    #[tokio::test]
    async fn file_token_trims_and_rereads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        let provider = FileToken::new(&path);

        assert!(provider.bearer_token().await.unwrap().is_none());

        std::fs::write(&path, "first\n").unwrap();
        let token = provider.bearer_token().await.unwrap().unwrap();
        assert_eq!(token.expose_secret(), "first");

        std::fs::write(&path, "second").unwrap();
        let token = provider.bearer_token().await.unwrap().unwrap();
        assert_eq!(token.expose_secret(), "second");

        std::fs::write(&path, "   \n").unwrap();
        assert!(provider.bearer_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_token_on_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileToken::new(dir.path());
        assert!(matches!(
            provider.bearer_token().await,
            Err(ChatError::Config(_))
        ));
    }
}
