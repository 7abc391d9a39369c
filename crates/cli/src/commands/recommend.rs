use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local};
use serde::Serialize;
use spotcast_core::config::LoadOptions;
use spotcast_core::domain::weather::WeatherReport;
use spotcast_core::geo::GeoPoint;
use spotcast_core::ml::ConditionClass;
use spotcast_core::recommendation::{
    CandidateFailure, PipelineFailure, PipelineSettings, RecommendationOutcome,
    RecommendationPipeline, RecommendationRequest,
};
use spotcast_providers::build_sources;

use crate::commands::classify::load_model;
use crate::commands::{exit_code_for, load_config, CommandResult};
use crate::RecommendArgs;

const COMMAND: &str = "recommend";

#[derive(Debug, Serialize)]
struct NearbyView {
    id: String,
    name: String,
    distance_km: f64,
}

#[derive(Debug, Serialize)]
struct ScoredView {
    id: String,
    name: String,
    distance_km: f64,
    score: f64,
    class: ConditionClass,
    weather: WeatherReport,
}

#[derive(Debug, Serialize)]
struct RecommendReport {
    outcome: &'static str,
    species: String,
    origin: GeoPoint,
    target_time: DateTime<FixedOffset>,
    radius_km: f64,
    nearest: Vec<NearbyView>,
    best_conditions: Vec<ScoredView>,
    failures: Vec<CandidateFailure>,
}

pub fn run(options: &LoadOptions, args: RecommendArgs) -> CommandResult {
    let mut options = options.clone();
    if let Some(fixture) = &args.fixture {
        options.overrides.directory_fixture_path = Some(fixture.clone());
    }
    let config = match load_config(COMMAND, &options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let target_time = match args.at.as_deref() {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(time) => time,
            Err(error) => {
                return CommandResult::failure(
                    COMMAND,
                    "invalid_request",
                    format!("--at must be an RFC 3339 timestamp: {error}"),
                    2,
                )
            }
        },
        None => DateTime::<FixedOffset>::from(Local::now()),
    };

    let model = match load_model(&config, args.model.clone()) {
        Ok(model) => model,
        Err(error) => return CommandResult::application_failure(COMMAND, &error),
    };
    let sources = match build_sources(&config) {
        Ok(sources) => sources,
        Err(error) => return CommandResult::application_failure(COMMAND, &error),
    };

    let pipeline = RecommendationPipeline::new(sources.directory, sources.weather, Arc::new(model))
        .with_settings(PipelineSettings::from(&config.pipeline));
    let request = RecommendationRequest::new(
        args.species,
        GeoPoint::new(args.lon, args.lat),
        target_time,
        args.radius_km.unwrap_or(config.pipeline.default_radius_km),
    );

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let outcome = runtime.block_on(pipeline.recommend(&request));
    render(&request, outcome)
}

fn render(request: &RecommendationRequest, outcome: RecommendationOutcome) -> CommandResult {
    let status = outcome.status();
    let (recommendations, failures) = match outcome {
        RecommendationOutcome::Ready(recommendations) => (recommendations, Vec::new()),
        RecommendationOutcome::Degraded { recommendations, failures } => {
            (recommendations, failures)
        }
        RecommendationOutcome::Failed(failure) => {
            let error_class = match &failure {
                PipelineFailure::InvalidRequest(_) => "invalid_request",
                PipelineFailure::DirectoryUnavailable(_) => "upstream_unavailable",
                PipelineFailure::NoData => "no_data",
            };
            return CommandResult::failure(
                COMMAND,
                error_class,
                failure.to_string(),
                exit_code_for(error_class),
            );
        }
    };

    let nearest: Vec<NearbyView> = recommendations
        .nearest
        .iter()
        .map(|spot| NearbyView {
            id: spot.location.id.to_string(),
            name: spot.location.display_name().to_string(),
            distance_km: spot.distance_km,
        })
        .collect();
    let best_conditions: Vec<ScoredView> = recommendations
        .best_conditions
        .iter()
        .map(|spot| ScoredView {
            id: spot.location.id.to_string(),
            name: spot.location.display_name().to_string(),
            distance_km: spot.distance_km,
            score: spot.score(),
            class: spot.assessment.class,
            weather: spot.weather,
        })
        .collect();

    let message = format!(
        "{} spots nearby, {} scored, {} unscored",
        nearest.len(),
        best_conditions.len(),
        failures.len()
    );
    CommandResult::success_with(
        COMMAND,
        message,
        RecommendReport {
            outcome: status,
            species: request.species.clone(),
            origin: request.origin,
            target_time: request.target_time,
            radius_km: request.radius_km,
            nearest,
            best_conditions,
            failures,
        },
    )
}
