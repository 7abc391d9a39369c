//! Recommendation Pipeline
//!
//! Given a species, a position and a planned time, fetch candidate spots from
//! the location directory and rank them twice: by distance, and by predicted
//! fishing conditions. Weather is fetched for every spot concurrently; a spot
//! whose weather or scoring fails is left out of the conditions ranking without
//! failing the whole request.

pub mod pipeline;
pub mod sources;
pub mod types;

pub use pipeline::{nearby_spots, PipelineSettings, RecommendationPipeline};
pub use sources::{LocationDirectory, LocationQuery, SpeciesCountRange, WeatherOracle};
pub use types::{
    CandidateFailure, CandidateFailureKind, NearbySpot, PipelineFailure, RecommendationOutcome,
    RecommendationRequest, Recommendations, ScoredSpot,
};
