//! Output formatting for route statuses and schedule summaries.

use anyhow::Result;
use serde::Serialize;

use crate::status::RouteStatus;

/// Writes a value to stdout as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", to_json(value)?);
    Ok(())
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// One-line human summary of a route status.
pub fn status_line(status: &RouteStatus) -> String {
    if !status.is_active {
        return format!("route {}: no active vehicle", status.route_id);
    }

    let mut line = format!("route {}: active", status.route_id);
    if let Some(label) = status.vehicle_label.as_deref().or(status.vehicle_id.as_deref()) {
        line.push_str(&format!(" vehicle {label}"));
    }
    match &status.current_position {
        Some(pos) => line.push_str(&format!(
            " at ({:.5}, {:.5}) reported {}",
            pos.lat, pos.lng, pos.timestamp
        )),
        None => line.push_str(" (no position reported)"),
    }
    if let Some(stop_id) = &status.stop_id {
        line.push_str(&format!(" near stop {stop_id}"));
    }
    line
}
