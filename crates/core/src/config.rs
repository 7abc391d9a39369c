use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "spotcast.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub weather: WeatherConfig,
    pub directory: DirectoryConfig,
    pub model: ModelConfig,
    pub pipeline: PipelineConfig,
    pub training: TrainingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct WeatherConfig {
    pub base_url: String,
    /// met.no rejects requests without an identifying agent
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct DirectoryConfig {
    pub url: Option<String>,
    pub fixture_path: Option<PathBuf>,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Default)]
pub struct ModelConfig {
    pub artifact_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub candidate_timeout_secs: u64,
    pub search_padding_km: f64,
    pub default_radius_km: f64,
}

#[derive(Clone, Debug)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub hidden_units: usize,
    pub seed: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub directory_url: Option<String>,
    pub directory_fixture_path: Option<PathBuf>,
    pub model_artifact_path: Option<PathBuf>,
    pub default_radius_km: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            weather: WeatherConfig {
                base_url: "https://api.met.no/weatherapi/locationforecast/2.0/compact".to_string(),
                user_agent: concat!("spotcast/", env!("CARGO_PKG_VERSION")).to_string(),
                timeout_secs: 10,
            },
            directory: DirectoryConfig {
                url: None,
                fixture_path: None,
                api_key: None,
                timeout_secs: 10,
            },
            model: ModelConfig::default(),
            pipeline: PipelineConfig {
                candidate_timeout_secs: 5,
                search_padding_km: 10.0,
                default_radius_km: 50.0,
            },
            training: TrainingConfig {
                epochs: 1000,
                learning_rate: 0.01,
                hidden_units: 16,
                seed: 42,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(weather) = patch.weather {
            if let Some(base_url) = weather.base_url {
                self.weather.base_url = base_url;
            }
            if let Some(user_agent) = weather.user_agent {
                self.weather.user_agent = user_agent;
            }
            if let Some(timeout_secs) = weather.timeout_secs {
                self.weather.timeout_secs = timeout_secs;
            }
        }

        if let Some(directory) = patch.directory {
            if let Some(url) = directory.url {
                self.directory.url = Some(url);
            }
            if let Some(fixture_path) = directory.fixture_path {
                self.directory.fixture_path = Some(fixture_path);
            }
            if let Some(api_key) = directory.api_key {
                self.directory.api_key = Some(secret_value(api_key));
            }
            if let Some(timeout_secs) = directory.timeout_secs {
                self.directory.timeout_secs = timeout_secs;
            }
        }

        if let Some(model) = patch.model {
            if let Some(artifact_path) = model.artifact_path {
                self.model.artifact_path = Some(artifact_path);
            }
        }

        if let Some(pipeline) = patch.pipeline {
            if let Some(candidate_timeout_secs) = pipeline.candidate_timeout_secs {
                self.pipeline.candidate_timeout_secs = candidate_timeout_secs;
            }
            if let Some(search_padding_km) = pipeline.search_padding_km {
                self.pipeline.search_padding_km = search_padding_km;
            }
            if let Some(default_radius_km) = pipeline.default_radius_km {
                self.pipeline.default_radius_km = default_radius_km;
            }
        }

        if let Some(training) = patch.training {
            if let Some(epochs) = training.epochs {
                self.training.epochs = epochs;
            }
            if let Some(learning_rate) = training.learning_rate {
                self.training.learning_rate = learning_rate;
            }
            if let Some(hidden_units) = training.hidden_units {
                self.training.hidden_units = hidden_units;
            }
            if let Some(seed) = training.seed {
                self.training.seed = seed;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SPOTCAST_WEATHER_BASE_URL") {
            self.weather.base_url = value;
        }
        if let Some(value) = read_env("SPOTCAST_WEATHER_USER_AGENT") {
            self.weather.user_agent = value;
        }
        if let Some(value) = read_env("SPOTCAST_WEATHER_TIMEOUT_SECS") {
            self.weather.timeout_secs = parse_u64("SPOTCAST_WEATHER_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SPOTCAST_DIRECTORY_URL") {
            self.directory.url = Some(value);
        }
        if let Some(value) = read_env("SPOTCAST_DIRECTORY_FIXTURE_PATH") {
            self.directory.fixture_path = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("SPOTCAST_DIRECTORY_API_KEY") {
            self.directory.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("SPOTCAST_DIRECTORY_TIMEOUT_SECS") {
            self.directory.timeout_secs = parse_u64("SPOTCAST_DIRECTORY_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SPOTCAST_MODEL_ARTIFACT_PATH") {
            self.model.artifact_path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("SPOTCAST_PIPELINE_CANDIDATE_TIMEOUT_SECS") {
            self.pipeline.candidate_timeout_secs =
                parse_u64("SPOTCAST_PIPELINE_CANDIDATE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("SPOTCAST_PIPELINE_SEARCH_PADDING_KM") {
            self.pipeline.search_padding_km =
                parse_f64("SPOTCAST_PIPELINE_SEARCH_PADDING_KM", &value)?;
        }
        if let Some(value) = read_env("SPOTCAST_PIPELINE_DEFAULT_RADIUS_KM") {
            self.pipeline.default_radius_km =
                parse_f64("SPOTCAST_PIPELINE_DEFAULT_RADIUS_KM", &value)?;
        }

        if let Some(value) = read_env("SPOTCAST_TRAINING_EPOCHS") {
            self.training.epochs = parse_usize("SPOTCAST_TRAINING_EPOCHS", &value)?;
        }
        if let Some(value) = read_env("SPOTCAST_TRAINING_LEARNING_RATE") {
            self.training.learning_rate = parse_f64("SPOTCAST_TRAINING_LEARNING_RATE", &value)?;
        }
        if let Some(value) = read_env("SPOTCAST_TRAINING_HIDDEN_UNITS") {
            self.training.hidden_units = parse_usize("SPOTCAST_TRAINING_HIDDEN_UNITS", &value)?;
        }
        if let Some(value) = read_env("SPOTCAST_TRAINING_SEED") {
            self.training.seed = parse_u64("SPOTCAST_TRAINING_SEED", &value)?;
        }

        let log_level =
            read_env("SPOTCAST_LOGGING_LEVEL").or_else(|| read_env("SPOTCAST_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SPOTCAST_LOGGING_FORMAT").or_else(|| read_env("SPOTCAST_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(directory_url) = overrides.directory_url {
            self.directory.url = Some(directory_url);
        }
        if let Some(fixture_path) = overrides.directory_fixture_path {
            self.directory.fixture_path = Some(fixture_path);
        }
        if let Some(artifact_path) = overrides.model_artifact_path {
            self.model.artifact_path = Some(artifact_path);
        }
        if let Some(default_radius_km) = overrides.default_radius_km {
            self.pipeline.default_radius_km = default_radius_km;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_weather(&self.weather)?;
        validate_directory(&self.directory)?;
        validate_pipeline(&self.pipeline)?;
        validate_training(&self.training)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn validate_weather(weather: &WeatherConfig) -> Result<(), ConfigError> {
    if !is_http_url(weather.base_url.trim()) {
        return Err(ConfigError::Validation(
            "weather.base_url must start with http:// or https://".to_string(),
        ));
    }
    if weather.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "weather.user_agent is required; the forecast service rejects anonymous clients"
                .to_string(),
        ));
    }
    if weather.timeout_secs == 0 || weather.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "weather.timeout_secs must be in range 1..=300".to_string(),
        ));
    }
    Ok(())
}

fn validate_directory(directory: &DirectoryConfig) -> Result<(), ConfigError> {
    if directory.url.is_some() && directory.fixture_path.is_some() {
        return Err(ConfigError::Validation(
            "directory.url and directory.fixture_path are mutually exclusive".to_string(),
        ));
    }

    if let Some(url) = &directory.url {
        if !is_http_url(url.trim()) {
            return Err(ConfigError::Validation(
                "directory.url must start with http:// or https://".to_string(),
            ));
        }
    }

    let blank_key =
        directory.api_key.as_ref().map(|key| key.expose_secret().trim().is_empty()).unwrap_or(false);
    if blank_key {
        return Err(ConfigError::Validation(
            "directory.api_key is set but empty; remove it or provide a key".to_string(),
        ));
    }

    if directory.timeout_secs == 0 || directory.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "directory.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_pipeline(pipeline: &PipelineConfig) -> Result<(), ConfigError> {
    if pipeline.candidate_timeout_secs == 0 || pipeline.candidate_timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "pipeline.candidate_timeout_secs must be in range 1..=120".to_string(),
        ));
    }
    if !pipeline.search_padding_km.is_finite() || pipeline.search_padding_km < 0.0 {
        return Err(ConfigError::Validation(
            "pipeline.search_padding_km must be a non-negative number".to_string(),
        ));
    }
    if !pipeline.default_radius_km.is_finite() || pipeline.default_radius_km <= 0.0 {
        return Err(ConfigError::Validation(
            "pipeline.default_radius_km must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_training(training: &TrainingConfig) -> Result<(), ConfigError> {
    if training.epochs == 0 {
        return Err(ConfigError::Validation(
            "training.epochs must be greater than zero".to_string(),
        ));
    }
    if !training.learning_rate.is_finite() || training.learning_rate <= 0.0 {
        return Err(ConfigError::Validation(
            "training.learning_rate must be a positive number".to_string(),
        ));
    }
    if training.hidden_units == 0 {
        return Err(ConfigError::Validation(
            "training.hidden_units must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| invalid_override(key, value))
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    weather: Option<WeatherPatch>,
    directory: Option<DirectoryPatch>,
    model: Option<ModelPatch>,
    pipeline: Option<PipelinePatch>,
    training: Option<TrainingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct WeatherPatch {
    base_url: Option<String>,
    user_agent: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct DirectoryPatch {
    url: Option<String>,
    fixture_path: Option<PathBuf>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ModelPatch {
    artifact_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct PipelinePatch {
    candidate_timeout_secs: Option<u64>,
    search_padding_km: Option<f64>,
    default_radius_km: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct TrainingPatch {
    epochs: Option<usize>,
    learning_rate: Option<f64>,
    hidden_units: Option<usize>,
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
