use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use spotcast_core::config::{AppConfig, ConfigOverrides, LoadOptions, DEFAULT_CONFIG_FILE};
use toml::Value;

use crate::commands::{load_config, CommandResult};

const COMMAND: &str = "config";

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: &'static str,
    pub value: String,
    pub source: String,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_path = detect_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let overridden = overridden_keys(&options.overrides);
    let entries =
        entries(&config, &overridden, config_file_doc.as_ref(), config_file_path.as_deref());

    CommandResult::success_with(
        COMMAND,
        "effective config (source precedence: override > env > file > default)",
        entries,
    )
}

fn overridden_keys(overrides: &ConfigOverrides) -> Vec<&'static str> {
    [
        ("logging.level", overrides.log_level.is_some()),
        ("directory.url", overrides.directory_url.is_some()),
        ("directory.fixture_path", overrides.directory_fixture_path.is_some()),
        ("model.artifact_path", overrides.model_artifact_path.is_some()),
        ("pipeline.default_radius_km", overrides.default_radius_km.is_some()),
    ]
    .into_iter()
    .filter_map(|(key, set)| set.then_some(key))
    .collect()
}

fn entries(
    config: &AppConfig,
    overridden: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> Vec<ConfigEntry> {
    let entry = |key: &'static str, value: String, env_key: &str| ConfigEntry {
        key,
        value,
        source: if overridden.contains(&key) {
            "override".to_string()
        } else {
            field_source(key, Some(env_key), config_file_doc, config_file_path)
        },
    };
    let optional_path =
        |path: &Option<PathBuf>| path.as_ref().map(|path| path.display().to_string());
    let unset = || "<unset>".to_string();

    vec![
        entry("weather.base_url", config.weather.base_url.clone(), "SPOTCAST_WEATHER_BASE_URL"),
        entry(
            "weather.user_agent",
            config.weather.user_agent.clone(),
            "SPOTCAST_WEATHER_USER_AGENT",
        ),
        entry(
            "weather.timeout_secs",
            config.weather.timeout_secs.to_string(),
            "SPOTCAST_WEATHER_TIMEOUT_SECS",
        ),
        entry(
            "directory.url",
            config.directory.url.clone().unwrap_or_else(unset),
            "SPOTCAST_DIRECTORY_URL",
        ),
        entry(
            "directory.fixture_path",
            optional_path(&config.directory.fixture_path).unwrap_or_else(unset),
            "SPOTCAST_DIRECTORY_FIXTURE_PATH",
        ),
        entry(
            "directory.api_key",
            if config.directory.api_key.is_some() { "<redacted>" } else { "<unset>" }.to_string(),
            "SPOTCAST_DIRECTORY_API_KEY",
        ),
        entry(
            "directory.timeout_secs",
            config.directory.timeout_secs.to_string(),
            "SPOTCAST_DIRECTORY_TIMEOUT_SECS",
        ),
        entry(
            "model.artifact_path",
            optional_path(&config.model.artifact_path).unwrap_or_else(unset),
            "SPOTCAST_MODEL_ARTIFACT_PATH",
        ),
        entry(
            "pipeline.candidate_timeout_secs",
            config.pipeline.candidate_timeout_secs.to_string(),
            "SPOTCAST_PIPELINE_CANDIDATE_TIMEOUT_SECS",
        ),
        entry(
            "pipeline.search_padding_km",
            config.pipeline.search_padding_km.to_string(),
            "SPOTCAST_PIPELINE_SEARCH_PADDING_KM",
        ),
        entry(
            "pipeline.default_radius_km",
            config.pipeline.default_radius_km.to_string(),
            "SPOTCAST_PIPELINE_DEFAULT_RADIUS_KM",
        ),
        entry("training.epochs", config.training.epochs.to_string(), "SPOTCAST_TRAINING_EPOCHS"),
        entry(
            "training.learning_rate",
            config.training.learning_rate.to_string(),
            "SPOTCAST_TRAINING_LEARNING_RATE",
        ),
        entry(
            "training.hidden_units",
            config.training.hidden_units.to_string(),
            "SPOTCAST_TRAINING_HIDDEN_UNITS",
        ),
        entry("training.seed", config.training.seed.to_string(), "SPOTCAST_TRAINING_SEED"),
        entry("logging.level", config.logging.level.clone(), "SPOTCAST_LOGGING_LEVEL"),
        entry(
            "logging.format",
            format!("{:?}", config.logging.format).to_lowercase(),
            "SPOTCAST_LOGGING_FORMAT",
        ),
    ]
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let root = PathBuf::from(DEFAULT_CONFIG_FILE);
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config").join(DEFAULT_CONFIG_FILE);
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
