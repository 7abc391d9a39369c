use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use spotcast_core::domain::location::Location;
use spotcast_core::errors::{ApplicationError, UpstreamError};
use spotcast_core::recommendation::{LocationDirectory, LocationQuery};

use crate::memory::InMemoryLocationDirectory;

/// Location directory loaded once from a JSON array of locations.
pub struct JsonFileLocationDirectory {
    path: PathBuf,
    inner: InMemoryLocationDirectory,
}

impl JsonFileLocationDirectory {
    pub fn open(path: &Path) -> Result<Self, ApplicationError> {
        let raw = fs::read_to_string(path).map_err(|error| {
            ApplicationError::Storage(format!("could not read `{}`: {error}", path.display()))
        })?;
        let locations: Vec<Location> = serde_json::from_str(&raw).map_err(|error| {
            ApplicationError::Storage(format!(
                "`{}` is not a JSON list of locations: {error}",
                path.display()
            ))
        })?;

        info!(
            event_name = "spotcast.directory.fixture_loaded",
            path = %path.display(),
            locations = locations.len(),
            "loaded location fixture"
        );

        Ok(Self { path: path.to_path_buf(), inner: InMemoryLocationDirectory::new(locations) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LocationDirectory for JsonFileLocationDirectory {
    async fn find_locations(&self, query: &LocationQuery) -> Result<Vec<Location>, UpstreamError> {
        self.inner.find_locations(query).await
    }
}
