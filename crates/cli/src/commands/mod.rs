pub mod classify;
pub mod cluster;
pub mod config;
pub mod recommend;
pub mod train;

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use spotcast_core::config::{AppConfig, ConfigError, LoadOptions};
use spotcast_core::errors::ApplicationError;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with(command, message, Value::Null)
    }

    /// Success carrying a command-specific JSON body under `data`.
    pub fn success_with(command: &str, message: impl Into<String>, data: impl Serialize) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(error) => {
                return Self::failure(command, "serialization", error.to_string(), 1);
            }
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn config_failure(command: &str, error: &ConfigError) -> Self {
        Self::failure(command, "config_validation", format!("configuration issue: {error}"), 2)
    }

    pub fn application_failure(command: &str, error: &ApplicationError) -> Self {
        let error_class = error.error_class();
        Self::failure(command, error_class, error.to_string(), exit_code_for(error_class))
    }
}

pub fn exit_code_for(error_class: &str) -> u8 {
    match error_class {
        "config_validation" | "invalid_request" => 2,
        "runtime_init" => 3,
        "storage" | "model_artifact" => 4,
        "upstream_unavailable" | "no_data" => 5,
        "model_input" | "training_data" => 6,
        _ => 1,
    }
}

pub(crate) fn load_config(
    command: &str,
    options: &LoadOptions,
) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options.clone()).map_err(|error| CommandResult::config_failure(command, &error))
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read {what} from `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("`{}` does not contain valid {what}", path.display()))
}

pub(crate) fn storage_failure(command: &str, error: &anyhow::Error) -> CommandResult {
    CommandResult::failure(command, "storage", format!("{error:#}"), exit_code_for("storage"))
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
