//! HTTP relay that forwards the vendor's realtime feed to browsers.
//!
//! The vendor credential lives inside the [`HttpClient`] handed to
//! [`router`]; responses only ever carry the feed bytes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::fetch::{HttpClient, PROTOBUF_CONTENT_TYPE, fetch_bytes};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
}

struct RelayState<C: ?Sized> {
    client: Arc<C>,
    upstream_url: Arc<str>,
}

impl<C: ?Sized> Clone for RelayState<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            upstream_url: Arc::clone(&self.upstream_url),
        }
    }
}

/// Builds the relay routes. `client` must already carry the vendor
/// credential, e.g. via [`UrlParam`](crate::fetch::auth::UrlParam).
pub fn router<C>(client: Arc<C>, upstream_url: &str) -> Router
where
    C: HttpClient + ?Sized + 'static,
{
    let state = RelayState {
        client,
        upstream_url: Arc::from(upstream_url),
    };

    Router::new()
        .route("/api/gtfs", get(relay_feed::<C>))
        .route("/proxy/gtfs", get(relay_feed::<C>))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn relay_feed<C>(State(state): State<RelayState<C>>) -> Response
where
    C: HttpClient + ?Sized + 'static,
{
    match fetch_bytes(state.client.as_ref(), &state.upstream_url).await {
        Ok(bytes) => {
            info!(bytes = bytes.len(), "Relayed realtime feed");
            (
                [(header::CONTENT_TYPE, PROTOBUF_CONTENT_TYPE)],
                Bytes::from(bytes),
            )
                .into_response()
        }
        Err(err) => {
            error!(error = %err, kind = ?err.kind(), "Error fetching GTFS data from upstream");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Error fetching GTFS data".to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { healthy: true })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::auth::UrlParam;
    use crate::fetch::testing::CannedClient;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn get_path(app: Router, path: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let resp = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        (status, content_type, body)
    }

    #[tokio::test]
    async fn test_relay_forwards_bytes_with_protobuf_type() {
        let upstream = Arc::new(CannedClient::new(reqwest::StatusCode::OK, vec![0x0A, 0x00]));
        let app = router(upstream, "https://vendor.test/v3/gtfsposition");

        let (status, content_type, body) = get_path(app, "/api/gtfs").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/x-protobuf"));
        assert_eq!(body, vec![0x0A, 0x00]);
    }

    #[tokio::test]
    async fn test_relay_attaches_credential_upstream() {
        let canned = Arc::new(CannedClient::new(reqwest::StatusCode::OK, vec![]));
        let client = Arc::new(UrlParam {
            inner: Arc::clone(&canned),
            param_name: "apikey".to_string(),
            key: "k3y".to_string(),
        });
        let app = router(client, "https://vendor.test/v3/gtfsposition");

        let (status, _, _) = get_path(app, "/proxy/gtfs").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            canned.requested_urls(),
            vec!["https://vendor.test/v3/gtfsposition?apikey=k3y".to_string()]
        );
    }

    #[tokio::test]
    async fn test_relay_upstream_failure_is_500_json() {
        let upstream = Arc::new(CannedClient::new(reqwest::StatusCode::FORBIDDEN, vec![]));
        let app = router(upstream, "https://vendor.test/v3/gtfsposition");

        let (status, content_type, body) = get_path(app, "/api/gtfs").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Error fetching GTFS data" }));
    }

    #[tokio::test]
    async fn test_health() {
        let upstream = Arc::new(CannedClient::new(reqwest::StatusCode::OK, vec![]));
        let (status, _, body) = get_path(router(upstream, "https://vendor.test/"), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, br#"{"healthy":true}"#.to_vec());
    }
}
