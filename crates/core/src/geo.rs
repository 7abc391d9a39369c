//! Great-circle geometry over WGS84 degrees.

use serde::{Deserialize, Serialize};

/// Mean earth radius used for all distance calculations.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

const METERS_PER_DEGREE_LATITUDE: f64 = 111_320.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }

    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        haversine_meters(*self, *other)
    }

    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        haversine_meters(*self, *other) / 1000.0
    }
}

/// Haversine distance between two points, in meters.
pub fn haversine_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // h can drift slightly above 1.0 for antipodal points
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().atan2((1.0 - h).max(0.0).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Axis-aligned area used to query the location directory.
///
/// A box that crosses the antimeridian has `min_longitude > max_longitude`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_longitude: f64,
    pub min_latitude: f64,
    pub max_longitude: f64,
    pub max_latitude: f64,
}

impl BoundingBox {
    /// Box enclosing every point within `radius_km` of `center`.
    pub fn around(center: GeoPoint, radius_km: f64) -> Self {
        let radius_m = radius_km.max(0.0) * 1000.0;
        let lat_delta = radius_m / METERS_PER_DEGREE_LATITUDE;
        let min_latitude = center.latitude - lat_delta;
        let max_latitude = center.latitude + lat_delta;

        let cos_lat = center.latitude.to_radians().cos().abs();
        let lon_delta = if cos_lat < 1e-6 {
            180.0
        } else {
            radius_m / (METERS_PER_DEGREE_LATITUDE * cos_lat)
        };

        // reaching a pole or spanning the globe covers every longitude
        let (min_longitude, max_longitude) =
            if lon_delta >= 180.0 || min_latitude <= -90.0 || max_latitude >= 90.0 {
                (-180.0, 180.0)
            } else {
                (
                    wrap_longitude(center.longitude - lon_delta),
                    wrap_longitude(center.longitude + lon_delta),
                )
            };

        Self {
            min_longitude,
            min_latitude: min_latitude.max(-90.0),
            max_longitude,
            max_latitude: max_latitude.min(90.0),
        }
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.min_longitude > self.max_longitude
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        let within_longitude = if self.crosses_antimeridian() {
            point.longitude >= self.min_longitude || point.longitude <= self.max_longitude
        } else {
            (self.min_longitude..=self.max_longitude).contains(&point.longitude)
        };
        within_longitude && (self.min_latitude..=self.max_latitude).contains(&point.latitude)
    }
}

fn wrap_longitude(longitude: f64) -> f64 {
    if longitude > 180.0 {
        longitude - 360.0
    } else if longitude < -180.0 {
        longitude + 360.0
    } else {
        longitude
    }
}
