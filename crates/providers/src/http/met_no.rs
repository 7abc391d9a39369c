//! Weather oracle backed by a met.no locationforecast "compact" endpoint.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use spotcast_core::domain::weather::WeatherReport;
use spotcast_core::errors::{ApplicationError, UpstreamError, UpstreamService};
use spotcast_core::geo::GeoPoint;
use spotcast_core::recommendation::WeatherOracle;

use super::checked;

const SERVICE: UpstreamService = UpstreamService::WeatherOracle;

pub struct MetNoWeatherOracle {
    client: Client,
    base_url: String,
}

impl MetNoWeatherOracle {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, ApplicationError> {
        let client = Client::builder().user_agent(user_agent).timeout(timeout).build().map_err(
            |error| ApplicationError::Configuration(format!("could not build weather client: {error}")),
        )?;
        Ok(Self { client, base_url: base_url.into() })
    }

    /// The service caches per coordinate and rejects more than four decimals.
    fn forecast_url(&self, position: GeoPoint) -> String {
        format!(
            "{}?lat={:.4}&lon={:.4}",
            self.base_url.trim_end_matches('/'),
            position.latitude,
            position.longitude
        )
    }
}

#[async_trait]
impl WeatherOracle for MetNoWeatherOracle {
    async fn weather_at(
        &self,
        position: GeoPoint,
        at: DateTime<Utc>,
    ) -> Result<WeatherReport, UpstreamError> {
        let url = self.forecast_url(position);
        debug!(event_name = "spotcast.weather.request", url = %url, at = %at, "requesting forecast");

        let response = checked(SERVICE, self.client.get(&url).send().await)?;
        let forecast: Forecast = response.json().await.map_err(|error| {
            UpstreamError::invalid_response(SERVICE, format!("undecodable forecast: {error}"))
        })?;
        report_at(&forecast, at)
    }
}

#[derive(Debug, Deserialize)]
struct Forecast {
    properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    #[serde(default)]
    timeseries: Vec<ForecastStep>,
}

#[derive(Debug, Deserialize)]
struct ForecastStep {
    time: DateTime<Utc>,
    data: StepData,
}

#[derive(Debug, Deserialize)]
struct StepData {
    instant: Instant,
    next_1_hours: Option<Period>,
    next_6_hours: Option<Period>,
}

#[derive(Debug, Deserialize)]
struct Instant {
    details: InstantDetails,
}

#[derive(Debug, Deserialize)]
struct InstantDetails {
    air_temperature: Option<f64>,
    wind_speed: Option<f64>,
    air_pressure_at_sea_level: Option<f64>,
    cloud_area_fraction: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Period {
    details: Option<PeriodDetails>,
}

#[derive(Debug, Deserialize)]
struct PeriodDetails {
    precipitation_amount: Option<f64>,
}

impl Period {
    fn precipitation(&self) -> Option<f64> {
        self.details.as_ref().and_then(|details| details.precipitation_amount)
    }
}

pub fn parse_forecast(body: &str, at: DateTime<Utc>) -> Result<WeatherReport, UpstreamError> {
    let forecast: Forecast = serde_json::from_str(body).map_err(|error| {
        UpstreamError::invalid_response(SERVICE, format!("undecodable forecast: {error}"))
    })?;
    report_at(&forecast, at)
}

/// Reads the forecast step closest to `at`.
fn report_at(forecast: &Forecast, at: DateTime<Utc>) -> Result<WeatherReport, UpstreamError> {
    let step = forecast
        .properties
        .timeseries
        .iter()
        .min_by_key(|step| (step.time - at).num_seconds().abs())
        .ok_or_else(|| UpstreamError::invalid_response(SERVICE, "forecast has no timeseries"))?;

    let details = &step.data.instant.details;
    let required = |value: Option<f64>, field: &str| {
        value.ok_or_else(|| {
            UpstreamError::invalid_response(SERVICE, format!("forecast step lacks `{field}`"))
        })
    };

    let precipitation_mm = step
        .data
        .next_1_hours
        .as_ref()
        .and_then(Period::precipitation)
        .or_else(|| step.data.next_6_hours.as_ref().and_then(Period::precipitation))
        .unwrap_or(0.0);

    Ok(WeatherReport {
        air_temperature_c: required(details.air_temperature, "air_temperature")?,
        wind_speed_mps: required(details.wind_speed, "wind_speed")?,
        precipitation_mm,
        air_pressure_hpa: required(details.air_pressure_at_sea_level, "air_pressure_at_sea_level")?,
        cloud_cover_pct: details.cloud_area_fraction.unwrap_or(0.0),
    })
}
