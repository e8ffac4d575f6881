use serde::{Deserialize, Serialize};

/// A row of `routes.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Route {
    pub route_id: String,
    #[serde(default)]
    pub route_short_name: String,
    #[serde(default)]
    pub route_long_name: String,
}

/// A row of `trips.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Trip {
    pub route_id: String,
    pub trip_id: String,
    #[serde(default)]
    pub trip_headsign: Option<String>,
    #[serde(default)]
    pub direction_id: Option<u32>,
    #[serde(default)]
    pub shape_id: Option<String>,
}

/// A row of `shapes.txt`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShapePoint {
    pub shape_id: String,
    pub shape_pt_lat: f64,
    pub shape_pt_lon: f64,
    pub shape_pt_sequence: u32,
}

/// Entry for a route picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadsignSummary {
    pub headsign: String,
    pub direction_id: u32,
    pub trips: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteShapePoint {
    pub lat: f64,
    pub lng: f64,
    pub sequence: u32,
}

impl From<ShapePoint> for RouteShapePoint {
    fn from(point: ShapePoint) -> Self {
        Self {
            lat: point.shape_pt_lat,
            lng: point.shape_pt_lon,
            sequence: point.shape_pt_sequence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteShape {
    pub shape_id: String,
    pub points: Vec<RouteShapePoint>,
}

/// Static schedule view of one route: what riders should see on the
/// headsigns and where the vehicles should drive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteVerification {
    pub route_id: String,
    pub headsigns: Vec<HeadsignSummary>,
    pub shapes: Vec<RouteShape>,
}
