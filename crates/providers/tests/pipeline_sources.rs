use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, TimeZone};
use spotcast_core::domain::location::{Location, SubLocation};
use spotcast_core::domain::weather::WeatherReport;
use spotcast_core::geo::GeoPoint;
use spotcast_core::ml::{
    ConditionModel, FishingConditionClassifier, Network, Normalizer, CONDITION_CLASSES,
    DEFAULT_HIDDEN_UNITS, FEATURE_COUNT,
};
use spotcast_core::recommendation::{
    CandidateFailureKind, PipelineSettings, RecommendationOutcome, RecommendationPipeline,
    RecommendationRequest,
};
use spotcast_providers::{InMemoryLocationDirectory, ScriptedWeatherOracle, WeatherScript};

fn spot(id: &str, longitude: f64, latitude: f64, species: &[&str]) -> Location {
    Location::new(id, format!("spot {id}"), GeoPoint::new(longitude, latitude)).with_sub_location(
        SubLocation {
            category: "02".to_string(),
            name: String::new(),
            notes: None,
            species: Some(species.iter().map(|name| name.to_string()).collect()),
        },
    )
}

fn directory() -> Arc<InMemoryLocationDirectory> {
    Arc::new(InMemoryLocationDirectory::new(vec![
        spot("huk", 10.68, 59.90, &["cod", "mackerel"]),
        spot("nesodden", 10.66, 59.85, &["cod"]),
        spot("drobak", 10.63, 59.66, &["cod"]),
        spot("bunnefjorden", 10.75, 59.83, &["pike"]),
        spot("mjosa", 10.70, 60.80, &["cod"]),
    ]))
}

fn report(wind_speed_mps: f64) -> WeatherReport {
    WeatherReport {
        air_temperature_c: 14.0,
        wind_speed_mps,
        precipitation_mm: 0.0,
        air_pressure_hpa: 1014.0,
        cloud_cover_pct: 30.0,
    }
}

fn model() -> Arc<ConditionModel> {
    let network = Network::seeded(FEATURE_COUNT, DEFAULT_HIDDEN_UNITS, CONDITION_CLASSES, 7);
    let classifier = FishingConditionClassifier::new(network).expect("matching dimensions");
    Arc::new(ConditionModel::new("scripted", Normalizer::identity(), classifier))
}

fn request() -> RecommendationRequest {
    let offset = FixedOffset::east_opt(2 * 3600).expect("valid offset");
    RecommendationRequest::new(
        "cod",
        GeoPoint::new(10.70, 59.91),
        offset.with_ymd_and_hms(2024, 7, 14, 14, 0, 0).single().expect("valid time"),
        40.0,
    )
}

#[tokio::test]
async fn scripted_sources_drive_a_degraded_recommendation() {
    let weather = Arc::new(ScriptedWeatherOracle::with_fallback(report(3.0)));
    weather
        .script(GeoPoint::new(10.66, 59.85), WeatherScript::Fail("HTTP 503".to_string()))
        .await;
    weather
        .script(GeoPoint::new(10.63, 59.66), WeatherScript::Report(report(f64::INFINITY)))
        .await;
    let pipeline = RecommendationPipeline::new(directory(), weather.clone(), model());

    let outcome = pipeline.recommend(&request()).await;

    let RecommendationOutcome::Degraded { recommendations, failures } = outcome else {
        panic!("expected degraded outcome");
    };
    let nearest: Vec<&str> =
        recommendations.nearest.iter().map(|spot| spot.location.id.0.as_str()).collect();
    assert_eq!(nearest, ["huk", "nesodden", "drobak"]);
    assert_eq!(recommendations.best_conditions.len(), 1);
    assert_eq!(recommendations.best_conditions[0].location.id.0, "huk");

    let kinds: HashSet<(&str, CandidateFailureKind)> = failures
        .iter()
        .filter_map(|failure| failure.location_id.as_ref().map(|id| (id.0.as_str(), failure.kind)))
        .collect();
    assert_eq!(
        kinds,
        HashSet::from([
            ("nesodden", CandidateFailureKind::Weather),
            ("drobak", CandidateFailureKind::Scoring),
        ])
    );
    assert_eq!(weather.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn delayed_forecast_counts_as_timed_out() {
    let weather = Arc::new(ScriptedWeatherOracle::with_fallback(report(3.0)));
    weather
        .script(
            GeoPoint::new(10.68, 59.90),
            WeatherScript::Delayed(Duration::from_secs(30), report(3.0)),
        )
        .await;
    let pipeline = RecommendationPipeline::new(directory(), weather, model()).with_settings(
        PipelineSettings { candidate_timeout: Duration::from_secs(2), ..PipelineSettings::default() },
    );

    let outcome = pipeline.recommend(&request()).await;

    assert_eq!(outcome.status(), "degraded");
    let failures = outcome.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, CandidateFailureKind::TimedOut);
    assert_eq!(outcome.recommendations().map(|r| r.best_conditions.len()), Some(2));
}

#[tokio::test]
async fn spots_across_the_antimeridian_are_found() {
    let directory = Arc::new(InMemoryLocationDirectory::new(vec![
        spot("taveuni-east", -179.95, -16.5, &["cod"]),
        spot("taveuni-west", 179.85, -16.5, &["cod"]),
    ]));
    let weather = Arc::new(ScriptedWeatherOracle::with_fallback(report(3.0)));
    let pipeline = RecommendationPipeline::new(directory, weather, model());
    let offset = FixedOffset::east_opt(12 * 3600).expect("valid offset");
    let request = RecommendationRequest::new(
        "cod",
        GeoPoint::new(179.9, -16.5),
        offset.with_ymd_and_hms(2024, 7, 14, 6, 0, 0).single().expect("valid time"),
        30.0,
    );

    let outcome = pipeline.recommend(&request).await;

    assert_eq!(outcome.status(), "ready");
    let mut found: Vec<&str> = outcome
        .recommendations()
        .map(|r| r.nearest.iter().map(|spot| spot.location.id.0.as_str()).collect())
        .unwrap_or_default();
    found.sort_unstable();
    assert_eq!(found, ["taveuni-east", "taveuni-west"]);
}
