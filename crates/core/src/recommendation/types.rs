//! Types for the Recommendation Pipeline

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use thiserror::Error;

use crate::domain::location::{Location, LocationId};
use crate::domain::weather::WeatherReport;
use crate::errors::UpstreamError;
use crate::geo::GeoPoint;
use crate::ml::ConditionAssessment;

/// One planning request. The user's position travels with the request.
#[derive(Clone, Debug, PartialEq)]
pub struct RecommendationRequest {
    /// Species name as typed by the user
    pub species: String,
    /// Where the user is planning from
    pub origin: GeoPoint,
    /// Planned fishing time in the user's local offset
    pub target_time: DateTime<FixedOffset>,
    /// Search radius around `origin`
    pub radius_km: f64,
}

impl RecommendationRequest {
    pub fn new(
        species: impl Into<String>,
        origin: GeoPoint,
        target_time: DateTime<FixedOffset>,
        radius_km: f64,
    ) -> Self {
        Self { species: species.into(), origin, target_time, radius_km }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NearbySpot {
    pub location: Location,
    pub distance_km: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredSpot {
    pub location: Location,
    pub distance_km: f64,
    pub weather: WeatherReport,
    pub assessment: ConditionAssessment,
}

impl ScoredSpot {
    pub fn score(&self) -> f64 {
        self.assessment.score
    }
}

/// Both ranked views of the candidates around the user.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Recommendations {
    /// Every spot inside the radius, nearest first
    pub nearest: Vec<NearbySpot>,
    /// Spots that could be scored, best conditions first
    pub best_conditions: Vec<ScoredSpot>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateFailureKind {
    Weather,
    Scoring,
    TimedOut,
    Aborted,
}

/// Why a nearby spot is missing from the best-conditions list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CandidateFailure {
    pub location_id: Option<LocationId>,
    pub kind: CandidateFailureKind,
    pub reason: String,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum PipelineFailure {
    #[error("invalid recommendation request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    DirectoryUnavailable(UpstreamError),
    #[error("location directory returned no spots for this area")]
    NoData,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RecommendationOutcome {
    /// Every nearby spot was scored.
    Ready(Recommendations),
    /// Nearest list is complete, some spots could not be scored.
    Degraded { recommendations: Recommendations, failures: Vec<CandidateFailure> },
    Failed(PipelineFailure),
}

impl RecommendationOutcome {
    pub fn recommendations(&self) -> Option<&Recommendations> {
        match self {
            Self::Ready(recommendations) | Self::Degraded { recommendations, .. } => {
                Some(recommendations)
            }
            Self::Failed(_) => None,
        }
    }

    pub fn failures(&self) -> &[CandidateFailure] {
        match self {
            Self::Degraded { failures, .. } => failures,
            Self::Ready(_) | Self::Failed(_) => &[],
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Ready(_) => "ready",
            Self::Degraded { .. } => "degraded",
            Self::Failed(_) => "failed",
        }
    }
}
