//! Consumer-facing realtime lookups.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::FeedError;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::status::{RouteStatus, decode_and_filter};

/// Anything that can produce the current [`RouteStatus`] for a route.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_route_status(&self, route_id: &str) -> Result<RouteStatus, FeedError>;
}

/// Fetches the raw feed from the relay and reduces it to a route status.
pub struct RealtimeClient<C> {
    client: C,
    feed_url: String,
}

impl<C: HttpClient> RealtimeClient<C> {
    pub fn new(client: C, feed_url: impl Into<String>) -> Self {
        Self {
            client,
            feed_url: feed_url.into(),
        }
    }
}

#[async_trait]
impl<C: HttpClient> StatusSource for RealtimeClient<C> {
    #[tracing::instrument(skip(self), fields(feed_url = %self.feed_url))]
    async fn fetch_route_status(&self, route_id: &str) -> Result<RouteStatus, FeedError> {
        let bytes = fetch_bytes(&self.client, &self.feed_url).await?;
        debug!(bytes = bytes.len(), "Decoding feed");
        let status = decode_and_filter(&bytes, route_id)?;
        info!(is_active = status.is_active, "Route status resolved");
        Ok(status)
    }
}
