//! HTTP plumbing for pulling raw feed bytes.
//!
//! [`HttpClient`] is the seam every outbound request goes through, so
//! credentials can be layered on with the wrappers in [`auth`] and tests can
//! substitute canned responses.

mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use reqwest::header::{ACCEPT, HeaderValue};
use tracing::debug;

use crate::error::FeedError;

pub const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";

/// Issues a `GET` for `url` and returns the body of a successful response.
///
/// # Errors
///
/// Returns [`FeedError::InvalidUrl`] for unparseable URLs,
/// [`FeedError::Status`] for non-2xx responses and [`FeedError::Transport`]
/// when the request itself fails. Transport errors carry no URL, since
/// credential wrappers may have put a key in its query string.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Vec<u8>, FeedError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| FeedError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let mut req = reqwest::Request::new(reqwest::Method::GET, parsed);
    req.headers_mut()
        .insert(ACCEPT, HeaderValue::from_static(PROTOBUF_CONTENT_TYPE));

    let resp = client
        .execute(req)
        .await
        .map_err(reqwest::Error::without_url)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FeedError::Status(status));
    }

    let bytes = resp.bytes().await.map_err(reqwest::Error::without_url)?;
    debug!(bytes = bytes.len(), "Feed bytes received");
    Ok(bytes.to_vec())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use super::HttpClient;

    /// Answers every request with the same status and body, remembering what
    /// was asked for.
    pub struct CannedClient {
        pub status: StatusCode,
        pub body: Vec<u8>,
        pub seen: Mutex<Vec<(String, Option<String>)>>,
    }

    impl CannedClient {
        pub fn new(status: StatusCode, body: Vec<u8>) -> Self {
            Self {
                status,
                body,
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn requested_urls(&self) -> Vec<String> {
            self.seen.lock().unwrap().iter().map(|(url, _)| url.clone()).collect()
        }
    }

    #[async_trait]
    impl HttpClient for CannedClient {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            let accept = req
                .headers()
                .get(reqwest::header::ACCEPT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            self.seen.lock().unwrap().push((req.url().to_string(), accept));

            let resp = axum::http::Response::builder()
                .status(self.status)
                .body(self.body.clone())
                .unwrap();
            Ok(reqwest::Response::from(resp))
        }
    }
}
