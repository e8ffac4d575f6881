//! Static schedule data: route listings, headsign counts and route shapes.
//!
//! The backing store sits behind [`ScheduleSource`]; [`GtfsDirectory`] reads
//! an unpacked GTFS static feed. Substituted data is never passed off as
//! real: [`with_fallback`] tags it [`Provenance::Degraded`].

pub mod demo;
mod gtfs_dir;
mod types;

pub use gtfs_dir::GtfsDirectory;
pub use types::{
    HeadsignSummary, Route, RouteOption, RouteShape, RouteShapePoint, RouteVerification,
    ShapePoint, Trip,
};

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Failed to read {}: {source}", .path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Schedule store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the static schedule tables.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn routes(&self) -> Result<Vec<Route>, ScheduleError>;
    async fn trips_for_route(&self, route_id: &str) -> Result<Vec<Trip>, ScheduleError>;
    async fn shape_points(&self, shape_id: &str) -> Result<Vec<ShapePoint>, ScheduleError>;
}

/// Whether data came from the schedule store or was substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    Live,
    Degraded { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sourced<T> {
    pub data: T,
    pub provenance: Provenance,
}

impl<T> Sourced<T> {
    pub fn live(data: T) -> Self {
        Self {
            data,
            provenance: Provenance::Live,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.provenance, Provenance::Degraded { .. })
    }
}

/// Uses `fallback` when `result` failed, recording why.
pub fn with_fallback<T>(
    result: Result<T, ScheduleError>,
    fallback: impl FnOnce() -> T,
) -> Sourced<T> {
    match result {
        Ok(data) => Sourced::live(data),
        Err(err) => {
            warn!(error = %err, "Schedule query failed, serving fallback data");
            Sourced {
                data: fallback(),
                provenance: Provenance::Degraded {
                    reason: err.to_string(),
                },
            }
        }
    }
}

/// Picker entries labelled `"<short> - <long>"`, ordered by short name.
pub fn route_options(routes: &[Route]) -> Vec<RouteOption> {
    let mut sorted: Vec<&Route> = routes.iter().collect();
    sorted.sort_by(|a, b| a.route_short_name.cmp(&b.route_short_name));
    sorted
        .into_iter()
        .map(|route| RouteOption {
            value: route.route_id.clone(),
            label: format!("{} - {}", route.route_short_name, route.route_long_name),
        })
        .collect()
}

/// Counts trips per headsign.
///
/// Trips without a headsign are skipped. A headsign's direction is the one of
/// the first trip seen with it. Output is ordered by direction, then by trip
/// count descending; equal entries keep first-seen order.
pub fn summarize_headsigns(trips: &[Trip]) -> Vec<HeadsignSummary> {
    let mut summaries: Vec<HeadsignSummary> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for trip in trips {
        let Some(headsign) = trip.trip_headsign.as_deref().filter(|h| !h.is_empty()) else {
            continue;
        };
        match index.get(headsign) {
            Some(&i) => summaries[i].trips += 1,
            None => {
                index.insert(headsign, summaries.len());
                summaries.push(HeadsignSummary {
                    headsign: headsign.to_string(),
                    direction_id: trip.direction_id.unwrap_or(0),
                    trips: 1,
                });
            }
        }
    }

    summaries.sort_by(|a, b| {
        a.direction_id
            .cmp(&b.direction_id)
            .then_with(|| b.trips.cmp(&a.trips))
    });
    summaries
}

/// Collects the headsigns and shapes a planner needs to check `route_id`.
#[tracing::instrument(skip(source))]
pub async fn verify_route<S>(source: &S, route_id: &str) -> Result<RouteVerification, ScheduleError>
where
    S: ScheduleSource + ?Sized,
{
    let trips = source.trips_for_route(route_id).await?;

    let mut seen = HashSet::new();
    let shape_ids: Vec<&str> = trips
        .iter()
        .filter_map(|trip| trip.shape_id.as_deref())
        .filter(|id| !id.is_empty() && seen.insert(*id))
        .collect();

    let mut shapes = Vec::with_capacity(shape_ids.len());
    for shape_id in shape_ids {
        let mut points = source.shape_points(shape_id).await?;
        points.sort_by_key(|point| point.shape_pt_sequence);
        shapes.push(RouteShape {
            shape_id: shape_id.to_string(),
            points: points.into_iter().map(RouteShapePoint::from).collect(),
        });
    }

    Ok(RouteVerification {
        route_id: route_id.to_string(),
        headsigns: summarize_headsigns(&trips),
        shapes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(id: &str, headsign: Option<&str>, direction_id: u32, shape_id: Option<&str>) -> Trip {
        Trip {
            route_id: "R".to_string(),
            trip_id: id.to_string(),
            trip_headsign: headsign.map(str::to_string),
            direction_id: Some(direction_id),
            shape_id: shape_id.map(str::to_string),
        }
    }

    struct FixedSource {
        trips: Vec<Trip>,
        shapes: HashMap<String, Vec<ShapePoint>>,
    }

    #[async_trait]
    impl ScheduleSource for FixedSource {
        async fn routes(&self) -> Result<Vec<Route>, ScheduleError> {
            Err(ScheduleError::Unavailable("offline".to_string()))
        }

        async fn trips_for_route(&self, _route_id: &str) -> Result<Vec<Trip>, ScheduleError> {
            Ok(self.trips.clone())
        }

        async fn shape_points(&self, shape_id: &str) -> Result<Vec<ShapePoint>, ScheduleError> {
            Ok(self.shapes.get(shape_id).cloned().unwrap_or_default())
        }
    }

    fn point(shape_id: &str, sequence: u32) -> ShapePoint {
        ShapePoint {
            shape_id: shape_id.to_string(),
            shape_pt_lat: 49.0 + f64::from(sequence) / 100.0,
            shape_pt_lon: -123.0,
            shape_pt_sequence: sequence,
        }
    }

    #[test]
    fn test_summarize_headsigns_orders_and_skips_empty() {
        let trips = vec![
            trip("1", Some("UBC"), 1, None),
            trip("2", Some("Downtown"), 0, None),
            trip("3", Some("Arbutus"), 0, None),
            trip("4", Some("Downtown"), 0, None),
            trip("5", Some(""), 0, None),
            trip("6", None, 0, None),
            trip("7", Some("UBC"), 1, None),
        ];

        let summary = summarize_headsigns(&trips);

        let rows: Vec<(&str, u32, usize)> = summary
            .iter()
            .map(|s| (s.headsign.as_str(), s.direction_id, s.trips))
            .collect();
        assert_eq!(
            rows,
            vec![("Downtown", 0, 2), ("Arbutus", 0, 1), ("UBC", 1, 2)]
        );
    }

    #[test]
    fn test_route_options_sorted_by_short_name() {
        let routes = vec![
            Route {
                route_id: "b".to_string(),
                route_short_name: "2".to_string(),
                route_long_name: "Burrard".to_string(),
            },
            Route {
                route_id: "a".to_string(),
                route_short_name: "1".to_string(),
                route_long_name: "Downtown".to_string(),
            },
        ];

        let options = route_options(&routes);

        assert_eq!(options[0].value, "a");
        assert_eq!(options[0].label, "1 - Downtown");
        assert_eq!(options[1].label, "2 - Burrard");
    }

    #[tokio::test]
    async fn test_verify_route_dedups_and_orders_shapes() {
        let mut shapes = HashMap::new();
        shapes.insert("s2".to_string(), vec![point("s2", 3), point("s2", 1), point("s2", 2)]);
        shapes.insert("s1".to_string(), vec![point("s1", 1)]);
        let source = FixedSource {
            trips: vec![
                trip("1", Some("UBC"), 0, Some("s2")),
                trip("2", Some("UBC"), 0, Some("s1")),
                trip("3", Some("UBC"), 0, Some("s2")),
                trip("4", Some("UBC"), 0, None),
            ],
            shapes,
        };

        let verification = verify_route(&source, "R").await.unwrap();

        let ids: Vec<&str> = verification.shapes.iter().map(|s| s.shape_id.as_str()).collect();
        assert_eq!(ids, vec!["s2", "s1"]);
        let sequences: Vec<u32> = verification.shapes[0].points.iter().map(|p| p.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        assert_eq!(verification.headsigns[0].trips, 4);
    }

    #[tokio::test]
    async fn test_fallback_is_marked_degraded() {
        let source = FixedSource {
            trips: vec![],
            shapes: HashMap::new(),
        };

        let routes = with_fallback(
            source.routes().await.map(|r| route_options(&r)),
            demo::route_options,
        );

        assert!(routes.is_degraded());
        assert_eq!(
            routes.provenance,
            Provenance::Degraded {
                reason: "Schedule store unavailable: offline".to_string()
            }
        );
        assert_eq!(routes.data.len(), 5);
    }

    #[test]
    fn test_success_is_live() {
        let sourced = with_fallback(Ok(vec![1, 2]), Vec::new);
        assert!(!sourced.is_degraded());
        assert_eq!(sourced.data, vec![1, 2]);
        assert_eq!(
            serde_json::to_value(&sourced.provenance).unwrap(),
            serde_json::json!({ "kind": "live" })
        );
    }

    #[test]
    fn test_demo_shapes_mirror_each_other() {
        let demo = demo::verification("1");
        let outbound = &demo.shapes[0].points;
        let inbound = &demo.shapes[1].points;

        assert_eq!(outbound.len(), inbound.len());
        assert_eq!(outbound[0].lat, inbound[inbound.len() - 1].lat);
        assert_eq!(inbound[0].sequence, 1);
    }
}
