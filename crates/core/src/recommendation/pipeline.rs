//! Recommendation Pipeline implementation

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::sources::{LocationDirectory, LocationQuery, SpeciesCountRange, WeatherOracle};
use super::types::*;
use crate::config::PipelineConfig;
use crate::domain::location::Location;
use crate::domain::species::{SpeciesCatalog, SpeciesId};
use crate::geo::BoundingBox;
use crate::ml::{ConditionModel, FeatureVector};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineSettings {
    /// Upper bound on one spot's weather lookup
    pub candidate_timeout: Duration,
    /// Extra margin around the search radius when querying the directory
    pub search_padding_km: f64,
    pub species_count: SpeciesCountRange,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            candidate_timeout: Duration::from_secs(5),
            search_padding_km: 10.0,
            species_count: SpeciesCountRange::default(),
        }
    }
}

impl From<&PipelineConfig> for PipelineSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            candidate_timeout: Duration::from_secs(config.candidate_timeout_secs),
            search_padding_km: config.search_padding_km,
            species_count: SpeciesCountRange::default(),
        }
    }
}

/// Fetches spots around the user, then scores each one concurrently.
pub struct RecommendationPipeline {
    directory: Arc<dyn LocationDirectory>,
    weather: Arc<dyn WeatherOracle>,
    model: Arc<ConditionModel>,
    catalog: SpeciesCatalog,
    settings: PipelineSettings,
}

impl RecommendationPipeline {
    pub fn new(
        directory: Arc<dyn LocationDirectory>,
        weather: Arc<dyn WeatherOracle>,
        model: Arc<ConditionModel>,
    ) -> Self {
        Self {
            directory,
            weather,
            model,
            catalog: SpeciesCatalog,
            settings: PipelineSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub async fn recommend(&self, request: &RecommendationRequest) -> RecommendationOutcome {
        let correlation_id = Uuid::new_v4().to_string();

        if let Err(reason) = validate_request(request) {
            warn!(
                event_name = "spotcast.pipeline.invalid_request",
                correlation_id = %correlation_id,
                reason = %reason,
                "rejecting recommendation request"
            );
            return RecommendationOutcome::Failed(PipelineFailure::InvalidRequest(reason));
        }

        let species = request.species.trim().to_lowercase();
        let species_id = self.catalog.id_of(&species);
        if !species_id.is_known() {
            warn!(
                event_name = "spotcast.pipeline.unknown_species",
                correlation_id = %correlation_id,
                species = %species,
                "species is not in the catalog, scoring with the unknown sentinel"
            );
        }

        let query = LocationQuery {
            area: BoundingBox::around(
                request.origin,
                request.radius_km + self.settings.search_padding_km,
            ),
            reference: request.origin,
            species: Some(species.clone()),
            species_count: self.settings.species_count,
        };

        let candidates = match self.directory.find_locations(&query).await {
            Ok(candidates) => candidates,
            Err(error) => {
                warn!(
                    event_name = "spotcast.pipeline.directory_unavailable",
                    correlation_id = %correlation_id,
                    error = %error,
                    "location directory lookup failed"
                );
                return RecommendationOutcome::Failed(PipelineFailure::DirectoryUnavailable(error));
            }
        };
        if candidates.is_empty() {
            info!(
                event_name = "spotcast.pipeline.no_data",
                correlation_id = %correlation_id,
                "location directory returned no spots"
            );
            return RecommendationOutcome::Failed(PipelineFailure::NoData);
        }

        let candidate_count = candidates.len();
        let nearest = nearby_spots(candidates, request);
        debug!(
            event_name = "spotcast.pipeline.radius_filtered",
            correlation_id = %correlation_id,
            candidates = candidate_count,
            nearby = nearest.len(),
            radius_km = request.radius_km,
            "filtered candidates by radius"
        );

        let (mut best_conditions, failures) =
            self.score_all(&nearest, species_id, request.target_time, &correlation_id).await;
        best_conditions.sort_by(|a, b| {
            b.score().total_cmp(&a.score()).then(a.distance_km.total_cmp(&b.distance_km))
        });

        info!(
            event_name = "spotcast.pipeline.completed",
            correlation_id = %correlation_id,
            nearby = nearest.len(),
            scored = best_conditions.len(),
            failed = failures.len(),
            "recommendation run completed"
        );

        let recommendations = Recommendations { nearest, best_conditions };
        if failures.is_empty() {
            RecommendationOutcome::Ready(recommendations)
        } else {
            RecommendationOutcome::Degraded { recommendations, failures }
        }
    }

    /// Fans out one task per spot and waits for every one of them.
    async fn score_all(
        &self,
        nearest: &[NearbySpot],
        species_id: SpeciesId,
        target_time: DateTime<FixedOffset>,
        correlation_id: &str,
    ) -> (Vec<ScoredSpot>, Vec<CandidateFailure>) {
        let mut tasks = JoinSet::new();
        let mut task_locations = HashMap::new();

        for spot in nearest {
            let handle = tasks.spawn(score_candidate(
                spot.clone(),
                Arc::clone(&self.weather),
                Arc::clone(&self.model),
                species_id,
                target_time,
                self.settings.candidate_timeout,
            ));
            task_locations.insert(handle.id(), spot.location.id.clone());
        }

        let mut scored = Vec::with_capacity(nearest.len());
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            let failure = match joined {
                Ok((_, Ok(spot))) => {
                    scored.push(spot);
                    continue;
                }
                Ok((_, Err(failure))) => failure,
                Err(error) => CandidateFailure {
                    location_id: task_locations.remove(&error.id()),
                    kind: CandidateFailureKind::Aborted,
                    reason: error.to_string(),
                },
            };

            warn!(
                event_name = "spotcast.pipeline.candidate_failed",
                correlation_id = %correlation_id,
                location_id = failure.location_id.as_ref().map(|id| id.0.as_str()).unwrap_or("unknown"),
                kind = ?failure.kind,
                reason = %failure.reason,
                "dropping spot from best-conditions ranking"
            );
            failures.push(failure);
        }

        (scored, failures)
    }
}

async fn score_candidate(
    spot: NearbySpot,
    weather: Arc<dyn WeatherOracle>,
    model: Arc<ConditionModel>,
    species_id: SpeciesId,
    target_time: DateTime<FixedOffset>,
    timeout: Duration,
) -> Result<ScoredSpot, CandidateFailure> {
    let position = spot.location.position;
    let failure = |kind, reason: String| CandidateFailure {
        location_id: Some(spot.location.id.clone()),
        kind,
        reason,
    };

    let lookup = weather.weather_at(position, target_time.with_timezone(&Utc));
    let report = match tokio::time::timeout(timeout, lookup).await {
        Ok(Ok(report)) => report,
        Ok(Err(error)) => return Err(failure(CandidateFailureKind::Weather, error.to_string())),
        Err(_) => {
            return Err(failure(
                CandidateFailureKind::TimedOut,
                format!("weather lookup exceeded {} ms", timeout.as_millis()),
            ))
        }
    };

    let features = FeatureVector::assemble(species_id, &report, &target_time, position);
    let assessment = model
        .assess(&features)
        .map_err(|error| failure(CandidateFailureKind::Scoring, error.to_string()))?;

    Ok(ScoredSpot { location: spot.location, distance_km: spot.distance_km, weather: report, assessment })
}

/// Spots within the request radius, nearest first.
pub fn nearby_spots(candidates: Vec<Location>, request: &RecommendationRequest) -> Vec<NearbySpot> {
    let mut nearby: Vec<NearbySpot> = candidates
        .into_iter()
        .map(|location| {
            let distance_km = request.origin.distance_km(&location.position);
            NearbySpot { location, distance_km }
        })
        .filter(|spot| spot.distance_km <= request.radius_km)
        .collect();
    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    nearby
}

fn validate_request(request: &RecommendationRequest) -> Result<(), String> {
    if !request.radius_km.is_finite() || request.radius_km < 0.0 {
        return Err(format!("radius must be a non-negative number of km, got {}", request.radius_km));
    }
    let origin = request.origin;
    if !(-90.0..=90.0).contains(&origin.latitude) || !(-180.0..=180.0).contains(&origin.longitude) {
        return Err(format!(
            "origin ({}, {}) is outside WGS84 bounds",
            origin.longitude, origin.latitude
        ));
    }
    if request.species.trim().is_empty() {
        return Err("species must not be empty".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::domain::location::SubLocation;
    use crate::domain::weather::WeatherReport;
    use crate::errors::{UpstreamError, UpstreamService};
    use crate::geo::GeoPoint;
    use crate::ml::{
        ConditionClass, FishingConditionClassifier, Network, Normalizer, CONDITION_CLASSES,
        FEATURE_COUNT,
    };

    struct FixedDirectory {
        result: Result<Vec<Location>, UpstreamError>,
        queries: Mutex<Vec<LocationQuery>>,
    }

    impl FixedDirectory {
        fn returning(locations: Vec<Location>) -> Self {
            Self { result: Ok(locations), queries: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl LocationDirectory for FixedDirectory {
        async fn find_locations(
            &self,
            query: &LocationQuery,
        ) -> Result<Vec<Location>, UpstreamError> {
            self.queries.lock().expect("query log").push(query.clone());
            self.result.clone()
        }
    }

    /// Succeeds for every spot except the ids listed in `failing`.
    struct PartialWeather {
        failing: HashSet<String>,
        slow: HashSet<String>,
        by_position: HashMap<String, WeatherReport>,
    }

    impl PartialWeather {
        fn new(failing: &[&str]) -> Self {
            Self {
                failing: failing.iter().map(|id| id.to_string()).collect(),
                slow: HashSet::new(),
                by_position: HashMap::new(),
            }
        }
    }

    fn key(position: GeoPoint) -> String {
        format!("{:.4},{:.4}", position.longitude, position.latitude)
    }

    #[async_trait]
    impl WeatherOracle for PartialWeather {
        async fn weather_at(
            &self,
            position: GeoPoint,
            _at: chrono::DateTime<Utc>,
        ) -> Result<WeatherReport, UpstreamError> {
            let key = key(position);
            if self.slow.contains(&key) {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            if self.failing.contains(&key) {
                return Err(UpstreamError::unavailable(UpstreamService::WeatherOracle, "HTTP 503"));
            }
            Ok(self.by_position.get(&key).copied().unwrap_or(calm_weather()))
        }
    }

    fn calm_weather() -> WeatherReport {
        WeatherReport {
            air_temperature_c: 12.0,
            wind_speed_mps: 2.0,
            precipitation_mm: 0.0,
            air_pressure_hpa: 1013.0,
            cloud_cover_pct: 10.0,
        }
    }

    fn cod_spot(id: &str, longitude: f64, latitude: f64) -> Location {
        Location::new(id, format!("spot {id}"), GeoPoint::new(longitude, latitude))
            .with_sub_location(SubLocation {
                category: "02".to_string(),
                name: String::new(),
                notes: None,
                species: Some(vec!["cod".to_string()]),
            })
    }

    /// Five spots within ~10 km of the origin plus one far away.
    fn fjord_spots() -> Vec<Location> {
        vec![
            cod_spot("s3", 10.10, 60.02),
            cod_spot("s1", 10.01, 60.00),
            cod_spot("far", 12.0, 62.0),
            cod_spot("s5", 10.15, 60.05),
            cod_spot("s2", 10.03, 60.01),
            cod_spot("s4", 10.12, 60.03),
        ]
    }

    /// Network whose "excellent" logit grows with wind speed.
    fn wind_loving_model() -> Arc<ConditionModel> {
        let mut network = Network::zeroed(FEATURE_COUNT, 1, CONDITION_CLASSES);
        network.input_weights[2][0] = 1.0;
        network.output_weights[0] = vec![0.0, 0.0, 0.0, 1.0];
        let classifier = FishingConditionClassifier::new(network).expect("matching dimensions");
        Arc::new(ConditionModel::new("test", Normalizer::identity(), classifier))
    }

    fn request(radius_km: f64) -> RecommendationRequest {
        let offset = FixedOffset::east_opt(2 * 3600).expect("valid offset");
        RecommendationRequest::new(
            "Cod",
            GeoPoint::new(10.0, 60.0),
            offset.with_ymd_and_hms(2024, 7, 14, 14, 0, 0).single().expect("valid time"),
            radius_km,
        )
    }

    fn pipeline(directory: FixedDirectory, weather: PartialWeather) -> RecommendationPipeline {
        RecommendationPipeline::new(Arc::new(directory), Arc::new(weather), wind_loving_model())
    }

    fn ids<'a>(ids: impl Iterator<Item = &'a Location>) -> Vec<&'a str> {
        ids.map(|location| location.id.0.as_str()).collect()
    }

    #[tokio::test]
    async fn ranks_nearby_spots_two_ways() {
        let mut weather = PartialWeather::new(&[]);
        weather.by_position.insert(
            key(GeoPoint::new(10.15, 60.05)),
            WeatherReport { wind_speed_mps: 9.0, ..calm_weather() },
        );
        weather.by_position.insert(
            key(GeoPoint::new(10.03, 60.01)),
            WeatherReport { wind_speed_mps: 5.0, ..calm_weather() },
        );

        let outcome =
            pipeline(FixedDirectory::returning(fjord_spots()), weather).recommend(&request(20.0)).await;

        let RecommendationOutcome::Ready(recommendations) = outcome else {
            panic!("expected ready outcome");
        };
        assert_eq!(
            ids(recommendations.nearest.iter().map(|spot| &spot.location)),
            ["s1", "s2", "s3", "s4", "s5"]
        );
        let best = ids(recommendations.best_conditions.iter().map(|spot| &spot.location));
        assert_eq!(&best[..2], ["s5", "s2"]);
        assert_eq!(recommendations.best_conditions[0].assessment.class, ConditionClass::Excellent);
        // calm spots tie on score and fall back to distance order
        assert_eq!(&best[2..], ["s1", "s3", "s4"]);
    }

    #[tokio::test]
    async fn weather_failures_only_shrink_the_scored_list() {
        let weather = PartialWeather::new(&["10.0300,60.0100", "10.1200,60.0300"]);

        let outcome =
            pipeline(FixedDirectory::returning(fjord_spots()), weather).recommend(&request(20.0)).await;

        let RecommendationOutcome::Degraded { recommendations, failures } = outcome else {
            panic!("expected degraded outcome");
        };
        assert_eq!(recommendations.nearest.len(), 5);
        assert!(recommendations.best_conditions.len() <= 3);
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().all(|failure| failure.kind == CandidateFailureKind::Weather));
        let failed: HashSet<&str> =
            failures.iter().filter_map(|f| f.location_id.as_ref()).map(|id| id.0.as_str()).collect();
        assert_eq!(failed, HashSet::from(["s2", "s4"]));
    }

    #[tokio::test]
    async fn unreachable_weather_keeps_nearest_list() {
        let failing: Vec<String> =
            fjord_spots().iter().map(|location| key(location.position)).collect();
        let failing: Vec<&str> = failing.iter().map(String::as_str).collect();

        let outcome = pipeline(
            FixedDirectory::returning(fjord_spots()),
            PartialWeather::new(&failing),
        )
        .recommend(&request(20.0))
        .await;

        assert_eq!(outcome.status(), "degraded");
        let recommendations = outcome.recommendations().expect("lists are present");
        assert_eq!(recommendations.nearest.len(), 5);
        assert!(recommendations.best_conditions.is_empty());
        assert_eq!(outcome.failures().len(), 5);
    }

    #[tokio::test]
    async fn non_finite_weather_is_a_scoring_failure_not_a_ranking() {
        let mut weather = PartialWeather::new(&[]);
        weather.by_position.insert(
            key(GeoPoint::new(10.03, 60.01)),
            WeatherReport { wind_speed_mps: f64::INFINITY, ..calm_weather() },
        );

        let outcome =
            pipeline(FixedDirectory::returning(fjord_spots()), weather).recommend(&request(20.0)).await;

        let RecommendationOutcome::Degraded { recommendations, failures } = outcome else {
            panic!("expected degraded outcome");
        };
        assert_eq!(recommendations.nearest.len(), 5);
        assert_eq!(
            ids(recommendations.best_conditions.iter().map(|spot| &spot.location)),
            ["s1", "s3", "s4", "s5"]
        );
        assert!(recommendations.best_conditions.iter().all(|spot| spot.score().is_finite()));
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, CandidateFailureKind::Scoring);
        assert_eq!(failures[0].location_id.as_ref().map(|id| id.0.as_str()), Some("s2"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_weather_lookup_times_out() {
        let mut weather = PartialWeather::new(&[]);
        weather.slow.insert(key(GeoPoint::new(10.01, 60.00)));
        let pipeline = pipeline(FixedDirectory::returning(fjord_spots()), weather).with_settings(
            PipelineSettings { candidate_timeout: Duration::from_secs(2), ..PipelineSettings::default() },
        );

        let outcome = pipeline.recommend(&request(20.0)).await;

        let failures = outcome.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, CandidateFailureKind::TimedOut);
        assert_eq!(outcome.recommendations().map(|r| r.best_conditions.len()), Some(4));
    }

    #[tokio::test]
    async fn directory_failure_is_surfaced() {
        let directory = FixedDirectory {
            result: Err(UpstreamError::unavailable(UpstreamService::LocationDirectory, "timeout")),
            queries: Mutex::new(Vec::new()),
        };

        let outcome = pipeline(directory, PartialWeather::new(&[])).recommend(&request(20.0)).await;

        assert!(matches!(
            outcome,
            RecommendationOutcome::Failed(PipelineFailure::DirectoryUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn empty_directory_is_no_data_but_empty_radius_is_ready() {
        let outcome = pipeline(FixedDirectory::returning(Vec::new()), PartialWeather::new(&[]))
            .recommend(&request(20.0))
            .await;
        assert_eq!(outcome, RecommendationOutcome::Failed(PipelineFailure::NoData));

        let outcome = pipeline(
            FixedDirectory::returning(vec![cod_spot("far", 12.0, 62.0)]),
            PartialWeather::new(&[]),
        )
        .recommend(&request(20.0))
        .await;
        assert_eq!(outcome, RecommendationOutcome::Ready(Recommendations::default()));
    }

    #[tokio::test]
    async fn query_covers_radius_and_species() {
        let directory = Arc::new(FixedDirectory::returning(fjord_spots()));
        let pipeline = RecommendationPipeline::new(
            directory.clone(),
            Arc::new(PartialWeather::new(&[])),
            wind_loving_model(),
        );

        pipeline.recommend(&request(20.0)).await;

        let queries = directory.queries.lock().expect("query log");
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].species.as_deref(), Some("cod"));
        assert!(queries[0].area.contains(&GeoPoint::new(10.0, 60.25)));
        assert_eq!(queries[0].reference, GeoPoint::new(10.0, 60.0));
    }

    #[tokio::test]
    async fn invalid_radius_is_rejected_before_any_lookup() {
        let outcome = pipeline(FixedDirectory::returning(fjord_spots()), PartialWeather::new(&[]))
            .recommend(&request(-1.0))
            .await;

        assert!(matches!(outcome, RecommendationOutcome::Failed(PipelineFailure::InvalidRequest(_))));
    }

    #[test]
    fn nearby_spots_are_sorted_and_bounded() {
        let nearby = nearby_spots(fjord_spots(), &request(5.0));

        assert_eq!(ids(nearby.iter().map(|spot| &spot.location)), ["s1", "s2"]);
        assert!(nearby.iter().all(|spot| spot.distance_km <= 5.0));
    }
}
