use serde::{Deserialize, Serialize};

/// One weather observation or forecast step for a single point in time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Air temperature in degrees Celsius
    pub air_temperature_c: f64,
    /// Wind speed in m/s
    pub wind_speed_mps: f64,
    /// Precipitation in mm over the nearest forecast bucket
    pub precipitation_mm: f64,
    /// Air pressure in hPa
    pub air_pressure_hpa: f64,
    /// Cloud cover in percent (0-100)
    pub cloud_cover_pct: f64,
}
