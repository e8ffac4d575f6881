use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::types::{Route, ShapePoint, Trip};
use super::{ScheduleError, ScheduleSource};

/// Schedule tables loaded from an unpacked GTFS static directory.
///
/// `routes.txt` and `trips.txt` are required; `shapes.txt` is optional since
/// many agencies do not publish it.
#[derive(Debug, Default)]
pub struct GtfsDirectory {
    routes: Vec<Route>,
    trips_by_route: HashMap<String, Vec<Trip>>,
    shapes: HashMap<String, Vec<ShapePoint>>,
}

impl GtfsDirectory {
    #[tracing::instrument(skip(dir), fields(dir = %dir.as_ref().display()))]
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ScheduleError> {
        let dir = dir.as_ref();

        let routes: Vec<Route> = read_table(&dir.join("routes.txt"))?;
        let trips: Vec<Trip> = read_table(&dir.join("trips.txt"))?;

        let shapes_path = dir.join("shapes.txt");
        let points: Vec<ShapePoint> = if shapes_path.exists() {
            read_table(&shapes_path)?
        } else {
            debug!("No shapes.txt, continuing without shapes");
            Vec::new()
        };

        let mut trips_by_route: HashMap<String, Vec<Trip>> = HashMap::new();
        for trip in trips {
            trips_by_route
                .entry(trip.route_id.clone())
                .or_default()
                .push(trip);
        }

        let mut shapes: HashMap<String, Vec<ShapePoint>> = HashMap::new();
        for point in points {
            shapes.entry(point.shape_id.clone()).or_default().push(point);
        }

        info!(
            routes = routes.len(),
            routes_with_trips = trips_by_route.len(),
            shapes = shapes.len(),
            "GTFS static tables loaded"
        );

        Ok(Self {
            routes,
            trips_by_route,
            shapes,
        })
    }
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ScheduleError> {
    let table_error = |source: csv::Error| ScheduleError::Table {
        path: PathBuf::from(path),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(table_error)?;

    reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(table_error)
}

#[async_trait]
impl ScheduleSource for GtfsDirectory {
    async fn routes(&self) -> Result<Vec<Route>, ScheduleError> {
        Ok(self.routes.clone())
    }

    async fn trips_for_route(&self, route_id: &str) -> Result<Vec<Trip>, ScheduleError> {
        Ok(self.trips_by_route.get(route_id).cloned().unwrap_or_default())
    }

    async fn shape_points(&self, shape_id: &str) -> Result<Vec<ShapePoint>, ScheduleError> {
        Ok(self.shapes.get(shape_id).cloned().unwrap_or_default())
    }
}
