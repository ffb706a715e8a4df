use super::media::{decode_medias, MediaItem};
use crate::resolver::ResolveRequest;
use crate::utils::truncate_chars;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_ERROR_MESSAGE: &str = "Media not found / invalid link.";

const BODY_PREVIEW_CHARS: usize = 80;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Paste a link first.")]
    EmptyInput,

    /// The proxy answered with something other than JSON.
    #[error("{0}")]
    NonJson(String),

    /// The proxy answered with a classified error or `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error("Could not reach the resolver: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response from the resolver: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Talks to the resolver proxy endpoint.
#[derive(Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ProxyClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Shared HTTP client, also used to fetch media for forced downloads.
    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Resolves `input` (already trimmed by the caller or not) into media.
    /// Empty input is rejected without touching the network.
    pub async fn resolve(&self, input: &str) -> Result<Vec<MediaItem>, ClientError> {
        let url = input.trim();
        if url.is_empty() {
            return Err(ClientError::EmptyInput);
        }

        debug!("Submitting {} to {}", url, self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ResolveRequest {
                url: Some(url.to_string()),
            })
            .send()
            .await?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));

        if !is_json {
            let text = response.text().await.unwrap_or_default();
            let preview = truncate_chars(&text, BODY_PREVIEW_CHARS, "");
            let preview = if preview.is_empty() {
                "Unknown error".to_string()
            } else {
                preview
            };
            return Err(ClientError::NonJson(format!("Server error: {}", preview)));
        }

        let body: Value = serde_json::from_slice(&response.bytes().await?)?;

        if !status.is_success() || body.get("success") != Some(&Value::Bool(true)) {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .filter(|message| !message.is_empty())
                .unwrap_or(DEFAULT_ERROR_MESSAGE);
            return Err(ClientError::Rejected(message.to_string()));
        }

        let medias = match body.get("data") {
            Some(Value::Array(items)) => decode_medias(items),
            _ => Vec::new(),
        };
        Ok(medias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{spawn_server, Hits};
    use axum::{http::StatusCode, response::IntoResponse, routing::post, Json, Router};
    use serde_json::json;

    async fn proxy_replying(status: StatusCode, reply: Value, hits: Hits) -> ProxyClient {
        let router = Router::new().route(
            "/api",
            post(move || {
                let hits = hits.clone();
                let reply = reply.clone();
                async move {
                    hits.hit();
                    (status, Json(reply))
                }
            }),
        );
        ProxyClient::new(format!("{}/api", spawn_server(router).await))
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_call() {
        let hits = Hits::default();
        let client = proxy_replying(StatusCode::OK, json!({}), hits.clone()).await;

        let err = client.resolve("   ").await.unwrap_err();
        assert!(matches!(err, ClientError::EmptyInput));
        assert_eq!(hits.count(), 0);
    }

    #[tokio::test]
    async fn test_success_returns_media() {
        let hits = Hits::default();
        let client = proxy_replying(
            StatusCode::OK,
            json!({
                "success": true,
                "data": [{"url": "https://cdn/x.mp4", "type": "video"}],
                "original_url": "https://example.com/post/123"
            }),
            hits.clone(),
        )
        .await;

        let medias = client.resolve(" https://example.com/post/123 ").await.unwrap();
        assert_eq!(medias.len(), 1);
        assert_eq!(medias[0].url, "https://cdn/x.mp4");
        assert_eq!(hits.count(), 1);
    }

    #[tokio::test]
    async fn test_off_schema_items_still_render() {
        let client = proxy_replying(
            StatusCode::OK,
            json!({
                "success": true,
                "data": [
                    {"url": "https://cdn/x.mp4", "type": "video", "quality": 720},
                    {"type": "image"},
                    {"url": "https://cdn/x.gif", "type": "gif", "extension": null}
                ],
                "original_url": "https://example.com/post/123"
            }),
            Hits::default(),
        )
        .await;

        let medias = client.resolve("https://example.com/post/123").await.unwrap();
        assert_eq!(medias.len(), 2);
        assert_eq!(medias[0].quality.as_deref(), Some("720"));
        assert_eq!(medias[1].url, "https://cdn/x.gif");
    }

    #[tokio::test]
    async fn test_server_error_message_is_surfaced() {
        let client = proxy_replying(
            StatusCode::NOT_FOUND,
            json!({"error": "Media not found."}),
            Hits::default(),
        )
        .await;

        let err = client.resolve("https://example.com/p").await.unwrap_err();
        assert_eq!(err.to_string(), "Media not found.");
    }

    #[tokio::test]
    async fn test_success_false_uses_default_message() {
        let client =
            proxy_replying(StatusCode::OK, json!({"success": false}), Hits::default()).await;

        let err = client.resolve("https://example.com/p").await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected(ref m) if m == DEFAULT_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn test_non_json_body_is_truncated() {
        let page = "x".repeat(200);
        let router = Router::new().route(
            "/api",
            post(move || {
                let page = page.clone();
                async move { (StatusCode::BAD_GATEWAY, page).into_response() }
            }),
        );
        let client = ProxyClient::new(format!("{}/api", spawn_server(router).await));

        let err = client.resolve("https://example.com/p").await.unwrap_err();
        assert_eq!(err.to_string(), format!("Server error: {}", "x".repeat(80)));
    }

    #[tokio::test]
    async fn test_empty_non_json_body() {
        let router = Router::new().route(
            "/api",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let client = ProxyClient::new(format!("{}/api", spawn_server(router).await));

        let err = client.resolve("https://example.com/p").await.unwrap_err();
        assert_eq!(err.to_string(), "Server error: Unknown error");
    }
}
