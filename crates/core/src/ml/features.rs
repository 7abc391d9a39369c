use chrono::{DateTime, Datelike, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::domain::species::SpeciesId;
use crate::domain::weather::WeatherReport;
use crate::errors::ModelError;
use crate::geo::GeoPoint;

/// Number of inputs the deployed classifier expects.
pub const FEATURE_COUNT: usize = 10;

/// Feature order is part of the trained weights' contract.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "species_id",
    "air_temperature",
    "wind_speed",
    "precipitation",
    "air_pressure",
    "cloud_cover",
    "hour_of_day",
    "season",
    "latitude",
    "longitude",
];

/// Feature vector extracted for one candidate spot at one point in time
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn from_slice(values: &[f64]) -> Result<Self, ModelError> {
        let array: [f64; FEATURE_COUNT] = values.try_into().map_err(|_| {
            ModelError::ShapeMismatch { expected: FEATURE_COUNT, actual: values.len() }
        })?;
        Ok(Self(array))
    }

    /// Build the classifier input for a spot from its weather at `at`.
    ///
    /// Hour and season are read in `at`'s own timezone, so callers should pass
    /// the user's local time.
    pub fn assemble<Tz: TimeZone>(
        species: SpeciesId,
        weather: &WeatherReport,
        at: &DateTime<Tz>,
        position: GeoPoint,
    ) -> Self {
        Self([
            f64::from(species.0),
            weather.air_temperature_c,
            weather.wind_speed_mps,
            weather.precipitation_mm,
            weather.air_pressure_hpa,
            weather.cloud_cover_pct,
            f64::from(at.hour()),
            f64::from(season_index(at.month())),
            position.latitude,
            position.longitude,
        ])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        self.0
    }
}

/// Meteorological season: 0 winter (Dec-Feb), 1 spring, 2 summer, 3 autumn.
pub fn season_index(month: u32) -> u8 {
    match month {
        3..=5 => 1,
        6..=8 => 2,
        9..=11 => 3,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};

    use super::*;

    fn weather() -> WeatherReport {
        WeatherReport {
            air_temperature_c: 12.0,
            wind_speed_mps: 2.0,
            precipitation_mm: 0.0,
            air_pressure_hpa: 1013.0,
            cloud_cover_pct: 10.0,
        }
    }

    #[test]
    fn assemble_keeps_contract_order() {
        let offset = FixedOffset::east_opt(2 * 3600).expect("valid offset");
        let at = offset.with_ymd_and_hms(2024, 7, 14, 14, 30, 0).single().expect("valid time");

        let features = FeatureVector::assemble(SpeciesId(0), &weather(), &at, GeoPoint::new(10.0, 60.0));

        assert_eq!(features.values(), [0.0, 12.0, 2.0, 0.0, 1013.0, 10.0, 14.0, 2.0, 60.0, 10.0]);
    }

    #[test]
    fn hour_is_read_in_callers_timezone() {
        let offset = FixedOffset::east_opt(2 * 3600).expect("valid offset");
        let local = offset.with_ymd_and_hms(2024, 1, 10, 1, 0, 0).single().expect("valid time");
        let utc = local.with_timezone(&chrono::Utc);

        let local_features =
            FeatureVector::assemble(SpeciesId(1), &weather(), &local, GeoPoint::new(10.0, 60.0));
        let utc_features =
            FeatureVector::assemble(SpeciesId(1), &weather(), &utc, GeoPoint::new(10.0, 60.0));

        assert_eq!(local_features.values()[6], 1.0);
        assert_eq!(utc_features.values()[6], 23.0);
    }

    #[test]
    fn seasons_follow_meteorological_months() {
        let seasons: Vec<u8> = (1..=12).map(season_index).collect();
        assert_eq!(seasons, vec![0, 0, 1, 1, 1, 2, 2, 2, 3, 3, 3, 0]);
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        for len in [9, 11] {
            let values = vec![0.0; len];
            assert_eq!(
                FeatureVector::from_slice(&values),
                Err(ModelError::ShapeMismatch { expected: FEATURE_COUNT, actual: len })
            );
        }
    }
}
