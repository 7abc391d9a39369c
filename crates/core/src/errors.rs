use std::fmt;

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("invalid input shape: expected {expected} features, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error("degenerate normalization scale `{value}` at feature index {index}")]
    DegenerateScale { index: usize, value: f64 },
    #[error("non-finite {stage} value `{value}` at index {index}")]
    NonFinite { stage: &'static str, index: usize, value: f64 },
    #[error("invalid training sample #{index}: {reason}")]
    InvalidTrainingSample { index: usize, reason: String },
    #[error("cannot train on an empty sample set")]
    EmptyTrainingSet,
    #[error("invalid classifier artifact: {0}")]
    InvalidArtifact(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpstreamService {
    LocationDirectory,
    WeatherOracle,
}

impl fmt::Display for UpstreamService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocationDirectory => f.write_str("location directory"),
            Self::WeatherOracle => f.write_str("weather oracle"),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("{service} unavailable: {message}")]
    Unavailable { service: UpstreamService, message: String },
    #[error("{service} returned an unusable response: {message}")]
    InvalidResponse { service: UpstreamService, message: String },
}

impl UpstreamError {
    pub fn unavailable(service: UpstreamService, message: impl Into<String>) -> Self {
        Self::Unavailable { service, message: message.into() }
    }

    pub fn invalid_response(service: UpstreamService, message: impl Into<String>) -> Self {
        Self::InvalidResponse { service, message: message.into() }
    }

    pub fn service(&self) -> UpstreamService {
        match self {
            Self::Unavailable { service, .. } | Self::InvalidResponse { service, .. } => *service,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApplicationError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Stable machine-readable class used in command output.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Model(ModelError::InvalidTrainingSample { .. } | ModelError::EmptyTrainingSet) => {
                "training_data"
            }
            Self::Model(ModelError::InvalidArtifact(_)) => "model_artifact",
            Self::Model(_) => "model_input",
            Self::Upstream(_) => "upstream_unavailable",
            Self::Storage(_) => "storage",
            Self::Configuration(_) => "config_validation",
        }
    }
}
