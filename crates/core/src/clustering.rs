//! Zoom-dependent greedy clustering of fishing spots for map display.
//!
//! Locations are scanned once in input order. Each one joins the first
//! cluster (in creation order) whose center lies within the zoom's
//! threshold, otherwise it opens a new cluster centered on itself. Centers
//! are never moved, so results depend on input order.

use serde::Serialize;

use crate::domain::location::Location;
use crate::geo::{haversine_meters, GeoPoint};

/// `(exclusive zoom upper bound, max distance in meters)`, coarse to fine.
const ZOOM_STEPS: &[(f64, f64)] = &[
    (5.0, 220_000.0),
    (7.0, 60_000.0),
    (9.0, 20_000.0),
    (11.0, 5_000.0),
    (13.0, 1_000.0),
];

/// Zoom level at and above which every location gets its own cluster.
pub const NO_CLUSTERING_ZOOM: f64 = 13.0;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Cluster {
    pub center: GeoPoint,
    pub members: Vec<Location>,
    pub quality: Option<f64>,
}

impl Cluster {
    fn seeded_by(location: Location) -> Self {
        Self { center: location.position, members: vec![location], quality: None }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Mean rating of the members that carry one.
    pub fn mean_rating(&self) -> Option<f64> {
        let ratings: Vec<f64> =
            self.members.iter().filter_map(|member| member.rating).map(f64::from).collect();
        if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
        }
    }

    pub fn with_quality(mut self, quality: Option<f64>) -> Self {
        self.quality = quality;
        self
    }
}

pub fn max_distance_meters(zoom_level: f64) -> f64 {
    ZOOM_STEPS
        .iter()
        .find(|(upper_bound, _)| zoom_level < *upper_bound)
        .map(|(_, meters)| *meters)
        .unwrap_or(0.0)
}

pub fn cluster(locations: Vec<Location>, zoom_level: f64) -> Vec<Cluster> {
    cluster_within(locations, max_distance_meters(zoom_level))
}

pub fn cluster_within(locations: Vec<Location>, max_distance_meters: f64) -> Vec<Cluster> {
    if max_distance_meters <= 0.0 {
        return locations.into_iter().map(Cluster::seeded_by).collect();
    }

    let mut clusters: Vec<Cluster> = Vec::new();
    for location in locations {
        let target = clusters.iter_mut().find(|cluster| {
            haversine_meters(cluster.center, location.position) <= max_distance_meters
        });

        match target {
            Some(cluster) => cluster.members.push(location),
            None => clusters.push(Cluster::seeded_by(location)),
        }
    }

    clusters
}
