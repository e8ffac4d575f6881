use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use prost::Message;
use route_pulse::fetch::HttpClient;
use route_pulse::fetch::auth::UrlParam;
use route_pulse::gtfs_rt::{
    FeedEntity, FeedHeader, FeedMessage, Position, TripDescriptor, VehiclePosition,
};
use route_pulse::poller::{ChannelTicker, LogNotifier, PollState, PollerHandle};
use route_pulse::realtime::{RealtimeClient, StatusSource};
use route_pulse::relay;
use tower::ServiceExt;

/// Stands in for the vendor endpoint; only answers when the API key is
/// present.
struct FakeVendor {
    feed: Vec<u8>,
}

#[async_trait]
impl HttpClient for FakeVendor {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let authorized = req
            .url()
            .query_pairs()
            .any(|(name, value)| name == "apikey" && value == "test-key");
        let resp = if authorized {
            axum::http::Response::builder()
                .status(200)
                .body(self.feed.clone())
                .unwrap()
        } else {
            axum::http::Response::builder()
                .status(401)
                .body(Vec::new())
                .unwrap()
        };
        Ok(reqwest::Response::from(resp))
    }
}

/// Sends requests straight into an in-process router instead of the network.
struct RouterClient(Router);

#[async_trait]
impl HttpClient for RouterClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let request = axum::http::Request::builder()
            .method(req.method().clone())
            .uri(req.url().as_str())
            .body(Body::empty())
            .unwrap();
        let resp = self.0.clone().oneshot(request).await.unwrap();
        let (parts, body) = resp.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        Ok(reqwest::Response::from(axum::http::Response::from_parts(
            parts,
            bytes.to_vec(),
        )))
    }
}

fn vehicle(id: &str, route_id: &str, lat: f32, lng: f32, timestamp: u64) -> FeedEntity {
    FeedEntity {
        id: id.to_string(),
        vehicle: Some(VehiclePosition {
            trip: Some(TripDescriptor {
                route_id: Some(route_id.to_string()),
                ..Default::default()
            }),
            position: Some(Position {
                latitude: lat,
                longitude: lng,
                ..Default::default()
            }),
            timestamp: Some(timestamp),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn sample_feed() -> Vec<u8> {
    FeedMessage {
        header: FeedHeader {
            gtfs_realtime_version: "2.0".to_string(),
            timestamp: Some(1700000005),
            ..Default::default()
        },
        entity: vec![
            vehicle("1", "99", 49.26, -123.16, 1699999990),
            vehicle("2", "R4", 49.2827, -123.1207, 1700000000),
        ],
    }
    .encode_to_vec()
}

fn relay_client(api_key: &str) -> RouterClient {
    let vendor = Arc::new(UrlParam {
        inner: FakeVendor { feed: sample_feed() },
        param_name: "apikey".to_string(),
        key: api_key.to_string(),
    });
    RouterClient(relay::router(vendor, "https://vendor.test/v3/gtfsposition"))
}

#[tokio::test]
async fn test_full_pipeline_through_relay() {
    let realtime = RealtimeClient::new(relay_client("test-key"), "http://relay.test/api/gtfs");

    let status = realtime.fetch_route_status("R4").await.unwrap();

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["routeId"], "R4");
    assert_eq!(json["isActive"], true);
    assert_eq!(
        json["currentPosition"]["timestamp"],
        "2023-11-14T22:13:20.000Z"
    );
    let position = status.current_position.unwrap();
    assert_eq!(position.lat, f64::from(49.2827_f32));
    assert_eq!(position.lng, f64::from(-123.1207_f32));
}

#[tokio::test]
async fn test_unknown_route_is_inactive() {
    let realtime = RealtimeClient::new(relay_client("test-key"), "http://relay.test/api/gtfs");

    let status = realtime.fetch_route_status("7").await.unwrap();

    assert_eq!(
        serde_json::to_value(&status).unwrap(),
        serde_json::json!({ "routeId": "7", "isActive": false })
    );
}

#[tokio::test]
async fn test_rejected_credential_surfaces_in_poller() {
    let realtime = Arc::new(RealtimeClient::new(
        relay_client("wrong-key"),
        "http://relay.test/api/gtfs",
    ));
    let (_tick, ticker) = ChannelTicker::new();
    let handle = PollerHandle::spawn(realtime, ticker, LogNotifier);
    let mut rx = handle.subscribe();

    handle.select(Some("R4".to_string()));
    let snapshot = tokio::time::timeout(
        Duration::from_secs(2),
        rx.wait_for(|s| s.state == PollState::Failed),
    )
    .await
    .expect("timed out")
    .expect("poller stopped")
    .clone();

    assert!(snapshot.status.is_none());
    assert!(snapshot.error.unwrap().contains("500"));
    handle.shutdown().await;
}
