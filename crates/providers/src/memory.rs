use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use spotcast_core::domain::location::Location;
use spotcast_core::domain::weather::WeatherReport;
use spotcast_core::errors::{UpstreamError, UpstreamService};
use spotcast_core::geo::GeoPoint;
use spotcast_core::recommendation::{LocationDirectory, LocationQuery, WeatherOracle};

/// Location directory backed by a list held in memory.
#[derive(Default)]
pub struct InMemoryLocationDirectory {
    locations: RwLock<Vec<Location>>,
}

impl InMemoryLocationDirectory {
    pub fn new(locations: Vec<Location>) -> Self {
        Self { locations: RwLock::new(locations) }
    }

    pub async fn insert(&self, location: Location) {
        let mut locations = self.locations.write().await;
        locations.retain(|existing| existing.id != location.id);
        locations.push(location);
    }

    pub async fn len(&self) -> usize {
        self.locations.read().await.len()
    }
}

/// Distinct species listed across a location's sub-locations.
pub fn species_count(location: &Location) -> u32 {
    let distinct: BTreeSet<String> = location
        .sub_locations
        .iter()
        .filter_map(|sub| sub.species.as_ref())
        .flatten()
        .map(|name| name.trim().to_lowercase())
        .collect();
    u32::try_from(distinct.len()).unwrap_or(u32::MAX)
}

/// Applies the directory query the way a remote directory would.
pub fn matches_query(location: &Location, query: &LocationQuery) -> bool {
    if !query.area.contains(&location.position) {
        return false;
    }
    if let Some(species) = query.species.as_deref() {
        if !location.supports_species(species) {
            return false;
        }
    }
    query.species_count.contains(species_count(location))
}

#[async_trait]
impl LocationDirectory for InMemoryLocationDirectory {
    async fn find_locations(&self, query: &LocationQuery) -> Result<Vec<Location>, UpstreamError> {
        let locations = self.locations.read().await;
        Ok(locations.iter().filter(|location| matches_query(location, query)).cloned().collect())
    }
}

/// Canned response for one position.
#[derive(Clone, Debug, PartialEq)]
pub enum WeatherScript {
    Report(WeatherReport),
    Fail(String),
    /// Answer after a delay, for timeout tests.
    Delayed(Duration, WeatherReport),
}

/// Weather oracle that replays scripted answers per position.
#[derive(Default)]
pub struct ScriptedWeatherOracle {
    scripts: RwLock<HashMap<(i64, i64), WeatherScript>>,
    fallback: Option<WeatherReport>,
    calls: AtomicUsize,
}

fn position_key(position: GeoPoint) -> (i64, i64) {
    ((position.longitude * 1e5).round() as i64, (position.latitude * 1e5).round() as i64)
}

impl ScriptedWeatherOracle {
    /// Answers every unscripted position with `report`.
    pub fn with_fallback(report: WeatherReport) -> Self {
        Self { fallback: Some(report), ..Self::default() }
    }

    pub async fn script(&self, position: GeoPoint, script: WeatherScript) {
        self.scripts.write().await.insert(position_key(position), script);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherOracle for ScriptedWeatherOracle {
    async fn weather_at(
        &self,
        position: GeoPoint,
        _at: DateTime<Utc>,
    ) -> Result<WeatherReport, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.read().await.get(&position_key(position)).cloned();

        match script {
            Some(WeatherScript::Report(report)) => Ok(report),
            Some(WeatherScript::Fail(message)) => {
                Err(UpstreamError::unavailable(UpstreamService::WeatherOracle, message))
            }
            Some(WeatherScript::Delayed(delay, report)) => {
                tokio::time::sleep(delay).await;
                Ok(report)
            }
            None => self.fallback.ok_or_else(|| {
                UpstreamError::unavailable(
                    UpstreamService::WeatherOracle,
                    format!("no forecast for ({}, {})", position.longitude, position.latitude),
                )
            }),
        }
    }
}
