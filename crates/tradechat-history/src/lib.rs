// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation history over HTTP.
//!
//! [`HttpHistory`] fetches the user's conversations with a single `GET` and
//! hands them to the session for seeding. The bearer token is taken from the
//! same [`TokenProvider`] the transport uses.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tracing::debug;
use tradechat_config::ServerConfig;
use tradechat_core::{ChatError, Conversation, HistoryProvider, TokenProvider};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`HistoryProvider`] backed by the chat REST API.
#[derive(Clone)]
pub struct HttpHistory {
    client: reqwest::Client,
    url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for HttpHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpHistory")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl HttpHistory {
    /// Creates a provider for `{base_url}{path}`.
    pub fn new(
        base_url: &str,
        path: &str,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChatError::History {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), path),
            tokens,
        })
    }

    /// Builds a provider from the `[server]` section, or `None` when
    /// `history_url` is unset.
    pub fn from_config(
        server: &ServerConfig,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Option<Self>, ChatError> {
        server
            .history_url
            .as_deref()
            .map(|base| Self::new(base, &server.history_path, tokens))
            .transpose()
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl HistoryProvider for HttpHistory {
    async fn fetch_conversations(&self) -> Result<Vec<Conversation>, ChatError> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = self.tokens.bearer_token().await? {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(|e| ChatError::History {
            message: format!("history request failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        debug!(url = %self.url, status = %status, "history response received");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::History {
                message: format!("history endpoint returned {status}: {body}"),
                source: None,
            });
        }

        let conversations: Vec<Conversation> =
            response.json().await.map_err(|e| ChatError::History {
                message: format!("invalid history response: {e}"),
                source: Some(Box::new(e)),
            })?;
        debug!(count = conversations.len(), "history fetched");
        Ok(conversations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradechat_core::tokens::{Anonymous, StaticToken};
    use tradechat_core::{ConversationId, UserId};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    const PATH: &str = "/api/chat/conversations";

    fn history(server: &MockServer, tokens: Arc<dyn TokenProvider>) -> HttpHistory {
        HttpHistory::new(&server.uri(), PATH, tokens).unwrap()
    }

    #[tokio::test]
    async fn fetches_conversations_with_bearer_token() {
        let server = MockServer::start().await;
        let body = serde_json::json!([
            {
                "id": 7,
                "messages": [
                    {"senderId": 2, "content": "hi", "timestamp": "2026-01-01T00:00:00Z"},
                    {"senderId": "3", "content": "yo", "timestamp": "2026-01-01T00:00:05Z"}
                ]
            },
            {"id": "8"}
        ]);
        Mock::given(method("GET"))
            .and(path(PATH))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let conversations = history(&server, Arc::new(StaticToken::new("s3cret")))
            .fetch_conversations()
            .await
            .unwrap();

        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[0].id, ConversationId::from("7"));
        assert_eq!(conversations[0].messages[0].sender_id, UserId::from(2i64));
        assert_eq!(conversations[0].messages[1].content, "yo");
        assert!(conversations[1].messages.is_empty());
    }

    #[tokio::test]
    async fn anonymous_request_has_no_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PATH))
            .respond_with(|req: &Request| {
                if req.headers.contains_key("authorization") {
                    ResponseTemplate::new(400)
                } else {
                    ResponseTemplate::new(200).set_body_json(serde_json::json!([]))
                }
            })
            .mount(&server)
            .await;

        let conversations = history(&server, Arc::new(Anonymous))
            .fetch_conversations()
            .await
            .unwrap();
        assert!(conversations.is_empty());
    }

    #[tokio::test]
    async fn error_status_is_a_history_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let err = history(&server, Arc::new(Anonymous))
            .fetch_conversations()
            .await
            .unwrap_err();
        match err {
            ChatError::History { message, .. } => {
                assert!(message.contains("401"), "{message}");
                assert!(message.contains("unauthorized"), "{message}");
            }
            other => panic!("expected history error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_history_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = history(&server, Arc::new(Anonymous))
            .fetch_conversations()
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::History { .. }));
    }

    #[test]
    fn from_config_joins_base_and_path() {
        let mut server = ServerConfig::default();
        assert!(
            HttpHistory::from_config(&server, Arc::new(Anonymous))
                .unwrap()
                .is_none()
        );

        server.history_url = Some("https://chat.example.com/".into());
        let history = HttpHistory::from_config(&server, Arc::new(Anonymous))
            .unwrap()
            .unwrap();
        assert_eq!(history.url(), "https://chat.example.com/api/chat/conversations");
    }
}
