//! Placeholder schedule data for demos and offline development.
//!
//! Only ever served through [`with_fallback`](super::with_fallback), which
//! marks it as degraded.

use super::types::{HeadsignSummary, RouteOption, RouteShape, RouteShapePoint, RouteVerification};

pub fn route_options() -> Vec<RouteOption> {
    [
        ("1", "1 - Downtown"),
        ("2", "2 - Burrard"),
        ("3", "3 - Main Street"),
        ("4", "4 - UBC"),
        ("5", "5 - Robson"),
    ]
    .into_iter()
    .map(|(value, label)| RouteOption {
        value: value.to_string(),
        label: label.to_string(),
    })
    .collect()
}

pub fn verification(route_id: &str) -> RouteVerification {
    let headsigns = [("Downtown", 0, 150), ("Arbutus", 0, 45), ("UBC", 1, 148)]
        .into_iter()
        .map(|(headsign, direction_id, trips)| HeadsignSummary {
            headsign: headsign.to_string(),
            direction_id,
            trips,
        })
        .collect();

    let outbound = [
        (49.28273, -123.12074),
        (49.27, -123.15),
        (49.26, -123.18),
    ];

    RouteVerification {
        route_id: route_id.to_string(),
        headsigns,
        shapes: vec![
            demo_shape("shape_1", outbound.iter().copied()),
            demo_shape("shape_2", outbound.iter().rev().copied()),
        ],
    }
}

fn demo_shape(shape_id: &str, points: impl Iterator<Item = (f64, f64)>) -> RouteShape {
    RouteShape {
        shape_id: shape_id.to_string(),
        points: points
            .zip(1..)
            .map(|((lat, lng), sequence)| RouteShapePoint { lat, lng, sequence })
            .collect(),
    }
}
