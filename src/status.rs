//! Reduction of a GTFS-RT vehicle feed to a per-route status record.
//!
//! Only the first vehicle entity whose trip references the requested route is
//! kept, in feed order. Routes with several vehicles in service are therefore
//! reported through a single representative vehicle; aggregating across
//! vehicles is intentionally not attempted here.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FeedError;
use crate::gtfs_rt::vehicle_position::VehicleStopStatus;
use crate::gtfs_rt::{FeedMessage, VehiclePosition};
use crate::parser::parse_feed;

/// Live status of a single route, recomputed on every poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStatus {
    pub route_id: String,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_position: Option<CurrentPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stop_sequence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_status: Option<StopStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_id: Option<String>,
}

/// Where the matched vehicle was when it last reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentPosition {
    pub lat: f64,
    pub lng: f64,
    /// ISO-8601 UTC timestamp with millisecond precision, e.g.
    /// `2023-11-14T22:13:20.000Z`.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

/// The vehicle's relation to its current stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopStatus {
    IncomingAt,
    StoppedAt,
    InTransitTo,
}

impl From<VehicleStopStatus> for StopStatus {
    fn from(status: VehicleStopStatus) -> Self {
        match status {
            VehicleStopStatus::IncomingAt => StopStatus::IncomingAt,
            VehicleStopStatus::StoppedAt => StopStatus::StoppedAt,
            VehicleStopStatus::InTransitTo => StopStatus::InTransitTo,
        }
    }
}

impl RouteStatus {
    /// Status for a route with no vehicle in the feed.
    pub fn inactive(route_id: &str) -> Self {
        Self {
            route_id: route_id.to_string(),
            is_active: false,
            current_position: None,
            vehicle_id: None,
            vehicle_label: None,
            current_stop_sequence: None,
            current_status: None,
            stop_id: None,
        }
    }

    /// Builds an active status from the vehicle matched for `route_id`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Timestamp`] if the vehicle's timestamp cannot be
    /// represented as a calendar date.
    pub fn from_vehicle(route_id: &str, vehicle: &VehiclePosition) -> Result<Self, FeedError> {
        let current_position = match &vehicle.position {
            Some(position) => {
                // Missing timestamps decode as the schema default of zero.
                let timestamp = iso_timestamp(vehicle.timestamp.unwrap_or(0))?;
                Some(CurrentPosition {
                    lat: f64::from(position.latitude),
                    lng: f64::from(position.longitude),
                    timestamp,
                    heading: position.bearing.map(f64::from),
                    speed: position.speed.map(f64::from),
                })
            }
            None => None,
        };

        let current_status = vehicle.current_status.and_then(|raw| {
            let status = VehicleStopStatus::try_from(raw).ok().map(StopStatus::from);
            if status.is_none() {
                debug!(raw, "Ignoring unknown vehicle stop status");
            }
            status
        });

        let descriptor = vehicle.vehicle.as_ref();

        Ok(Self {
            route_id: route_id.to_string(),
            is_active: true,
            current_position,
            vehicle_id: descriptor.and_then(|d| d.id.clone()),
            vehicle_label: descriptor.and_then(|d| d.label.clone()),
            current_stop_sequence: vehicle.current_stop_sequence,
            current_status,
            stop_id: vehicle.stop_id.clone(),
        })
    }
}

/// Converts epoch seconds to an ISO-8601 string with millisecond precision.
fn iso_timestamp(epoch_secs: u64) -> Result<String, FeedError> {
    i64::try_from(epoch_secs)
        .ok()
        .and_then(|secs| secs.checked_mul(1000))
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or(FeedError::Timestamp(epoch_secs))
}

/// Lazily yields the vehicles whose trip references `route_id`, in feed order.
pub fn matching_vehicles<'a>(
    feed: &'a FeedMessage,
    route_id: &'a str,
) -> impl Iterator<Item = &'a VehiclePosition> + 'a {
    feed.entity
        .iter()
        .filter_map(|entity| entity.vehicle.as_ref())
        .filter(move |vehicle| {
            vehicle
                .trip
                .as_ref()
                .and_then(|trip| trip.route_id.as_deref())
                == Some(route_id)
        })
}

/// Reduces an already-decoded feed to the status of `route_id`.
pub fn route_status(feed: &FeedMessage, route_id: &str) -> Result<RouteStatus, FeedError> {
    match matching_vehicles(feed, route_id).next() {
        Some(vehicle) => RouteStatus::from_vehicle(route_id, vehicle),
        None => Ok(RouteStatus::inactive(route_id)),
    }
}

/// Decodes `bytes` as a GTFS-RT feed and returns the status of `route_id`.
///
/// A well-formed feed without any matching vehicle yields an inactive status;
/// it is not an error.
///
/// # Errors
///
/// Returns [`FeedError::Decode`] for malformed buffers and
/// [`FeedError::Timestamp`] for out-of-range vehicle timestamps.
pub fn decode_and_filter(bytes: &[u8], route_id: &str) -> Result<RouteStatus, FeedError> {
    let feed = parse_feed(bytes)?;
    debug!(entity_count = feed.entity.len(), route_id, "Feed decoded");
    route_status(&feed, route_id)
}
