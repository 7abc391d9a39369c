use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::location::Location;
use crate::domain::weather::WeatherReport;
use crate::errors::UpstreamError;
use crate::geo::{BoundingBox, GeoPoint};

/// Accepts spots whose sub-locations list between `min` and `max` distinct species.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesCountRange {
    pub min: u32,
    pub max: Option<u32>,
}

impl SpeciesCountRange {
    pub fn contains(&self, count: u32) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationQuery {
    pub area: BoundingBox,
    pub reference: GeoPoint,
    pub species: Option<String>,
    pub species_count: SpeciesCountRange,
}

#[async_trait]
pub trait LocationDirectory: Send + Sync {
    async fn find_locations(&self, query: &LocationQuery) -> Result<Vec<Location>, UpstreamError>;
}

#[async_trait]
pub trait WeatherOracle: Send + Sync {
    async fn weather_at(
        &self,
        position: GeoPoint,
        at: DateTime<Utc>,
    ) -> Result<WeatherReport, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::SpeciesCountRange;

    #[test]
    fn open_ended_range_accepts_anything_above_min() {
        let range = SpeciesCountRange { min: 1, max: None };
        assert!(!range.contains(0));
        assert!(range.contains(1));
        assert!(range.contains(250));
    }

    #[test]
    fn bounded_range_is_inclusive() {
        let range = SpeciesCountRange { min: 2, max: Some(4) };
        assert!(range.contains(2));
        assert!(range.contains(4));
        assert!(!range.contains(5));
        assert!(SpeciesCountRange::default().contains(0));
    }
}
