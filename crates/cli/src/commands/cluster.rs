use std::path::Path;

use serde::Serialize;
use spotcast_core::clustering::{cluster, max_distance_meters};
use spotcast_core::config::LoadOptions;
use spotcast_core::domain::location::Location;
use spotcast_core::geo::GeoPoint;

use crate::commands::{load_config, read_json, storage_failure, CommandResult};

const COMMAND: &str = "cluster";

#[derive(Debug, Serialize)]
struct ClusterView {
    center: GeoPoint,
    size: usize,
    quality: Option<f64>,
    members: Vec<MemberView>,
}

#[derive(Debug, Serialize)]
struct MemberView {
    id: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct ClusterReport {
    zoom: f64,
    max_distance_meters: f64,
    clusters: Vec<ClusterView>,
}

pub fn run(options: &LoadOptions, input: &Path, zoom: f64) -> CommandResult {
    if let Err(failure) = load_config(COMMAND, options) {
        return failure;
    }
    if !zoom.is_finite() {
        return CommandResult::failure(COMMAND, "invalid_request", "zoom must be a number", 2);
    }

    let locations: Vec<Location> = match read_json(input, "a location list") {
        Ok(locations) => locations,
        Err(error) => return storage_failure(COMMAND, &error),
    };
    let location_count = locations.len();

    let clusters: Vec<ClusterView> = cluster(locations, zoom)
        .into_iter()
        .map(|cluster| {
            let quality = cluster.mean_rating();
            let cluster = cluster.with_quality(quality);
            ClusterView {
                center: cluster.center,
                size: cluster.len(),
                quality: cluster.quality,
                members: cluster
                    .members
                    .iter()
                    .map(|member| MemberView {
                        id: member.id.to_string(),
                        name: member.display_name().to_string(),
                    })
                    .collect(),
            }
        })
        .collect();

    let message = format!("grouped {location_count} locations into {} clusters", clusters.len());
    CommandResult::success_with(
        COMMAND,
        message,
        ClusterReport { zoom, max_distance_meters: max_distance_meters(zoom), clusters },
    )
}
