pub mod clustering;
pub mod config;
pub mod domain;
pub mod errors;
pub mod geo;
pub mod ml;
pub mod recommendation;

pub use clustering::{cluster, cluster_within, max_distance_meters, Cluster};
pub use config::{AppConfig, ConfigError, LoadOptions, LogFormat};
pub use domain::location::{Location, LocationId, SubLocation};
pub use domain::species::{SpeciesCatalog, SpeciesId};
pub use domain::weather::WeatherReport;
pub use errors::{ApplicationError, ModelError, UpstreamError, UpstreamService};
pub use geo::{haversine_meters, BoundingBox, GeoPoint};
pub use ml::{ConditionAssessment, ConditionClass, ConditionModel, FeatureVector};
pub use recommendation::{
    LocationDirectory, LocationQuery, PipelineSettings, RecommendationOutcome,
    RecommendationPipeline, RecommendationRequest, Recommendations, WeatherOracle,
};
