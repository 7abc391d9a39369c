//! Adapters for the services the recommendation pipeline depends on.

pub mod file;
pub mod http;
pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use spotcast_core::config::AppConfig;
use spotcast_core::errors::ApplicationError;
use spotcast_core::recommendation::{LocationDirectory, WeatherOracle};

pub use file::JsonFileLocationDirectory;
pub use http::{HttpLocationDirectory, MetNoWeatherOracle};
pub use memory::{InMemoryLocationDirectory, ScriptedWeatherOracle, WeatherScript};

/// The pair of collaborators a pipeline is built from.
#[derive(Clone)]
pub struct Sources {
    pub directory: Arc<dyn LocationDirectory>,
    pub weather: Arc<dyn WeatherOracle>,
}

/// Picks the directory adapter from config. An HTTP endpoint wins over a fixture
/// file; config validation already rejects setting both.
pub fn build_sources(config: &AppConfig) -> Result<Sources, ApplicationError> {
    let directory: Arc<dyn LocationDirectory> =
        match (&config.directory.url, &config.directory.fixture_path) {
            (Some(url), _) => Arc::new(HttpLocationDirectory::new(
                url.clone(),
                config.directory.api_key.clone(),
                Duration::from_secs(config.directory.timeout_secs),
            )?),
            (None, Some(path)) => Arc::new(JsonFileLocationDirectory::open(path)?),
            (None, None) => {
                return Err(ApplicationError::Configuration(
                    "no location directory configured; set directory.url or directory.fixture_path"
                        .to_string(),
                ))
            }
        };

    let weather = Arc::new(MetNoWeatherOracle::new(
        config.weather.base_url.clone(),
        &config.weather.user_agent,
        Duration::from_secs(config.weather.timeout_secs),
    )?);

    Ok(Sources { directory, weather })
}
