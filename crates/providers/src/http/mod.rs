pub mod directory;
pub mod met_no;

pub use directory::HttpLocationDirectory;
pub use met_no::MetNoWeatherOracle;

use spotcast_core::errors::{UpstreamError, UpstreamService};

/// Transport failures and non-2xx answers both mean the service is unavailable.
pub(crate) fn checked(
    service: UpstreamService,
    result: Result<reqwest::Response, reqwest::Error>,
) -> Result<reqwest::Response, UpstreamError> {
    let response = result.map_err(|error| {
        let message = if error.is_timeout() {
            "request timed out".to_string()
        } else {
            format!("request failed: {error}")
        };
        UpstreamError::unavailable(service, message)
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(UpstreamError::unavailable(service, format!("endpoint returned {status}")));
    }
    Ok(response)
}
