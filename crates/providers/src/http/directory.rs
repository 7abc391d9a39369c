use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use spotcast_core::domain::location::Location;
use spotcast_core::errors::{ApplicationError, UpstreamError, UpstreamService};
use spotcast_core::recommendation::{LocationDirectory, LocationQuery};

use super::checked;

const SERVICE: UpstreamService = UpstreamService::LocationDirectory;

/// Location directory reached over HTTP. The query is posted as JSON and the
/// endpoint answers with a JSON list of locations.
pub struct HttpLocationDirectory {
    client: Client,
    url: String,
    api_key: Option<SecretString>,
}

impl HttpLocationDirectory {
    pub fn new(
        url: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, ApplicationError> {
        let client = Client::builder().timeout(timeout).build().map_err(|error| {
            ApplicationError::Configuration(format!("could not build directory client: {error}"))
        })?;
        Ok(Self { client, url: url.into(), api_key })
    }
}

#[async_trait]
impl LocationDirectory for HttpLocationDirectory {
    async fn find_locations(&self, query: &LocationQuery) -> Result<Vec<Location>, UpstreamError> {
        debug!(
            event_name = "spotcast.directory.request",
            url = %self.url,
            species = query.species.as_deref().unwrap_or("any"),
            "querying location directory"
        );

        let mut request = self.client.post(&self.url).json(query);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = checked(SERVICE, request.send().await)?;
        let locations: Vec<Location> = response.json().await.map_err(|error| {
            UpstreamError::invalid_response(SERVICE, format!("undecodable location list: {error}"))
        })?;

        debug!(
            event_name = "spotcast.directory.response",
            locations = locations.len(),
            "location directory answered"
        );
        Ok(locations)
    }
}
