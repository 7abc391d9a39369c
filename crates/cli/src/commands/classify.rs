use std::path::PathBuf;

use serde::Serialize;
use spotcast_core::config::{AppConfig, LoadOptions};
use spotcast_core::errors::ApplicationError;
use spotcast_core::ml::{
    ClassifierArtifact, ConditionAssessment, ConditionModel, FeatureVector, FEATURE_NAMES,
};

use crate::commands::{load_config, CommandResult};

const COMMAND: &str = "classify";

#[derive(Debug, Serialize)]
struct ClassifyReport {
    model_version: String,
    features: Vec<(&'static str, f64)>,
    assessment: ConditionAssessment,
}

pub fn run(options: &LoadOptions, features: &str, model: Option<PathBuf>) -> CommandResult {
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let values = match parse_features(features) {
        Ok(values) => values,
        Err(message) => return CommandResult::failure(COMMAND, "model_input", message, 6),
    };

    let result = FeatureVector::from_slice(&values)
        .map_err(ApplicationError::from)
        .and_then(|raw| {
            let model = load_model(&config, model)?;
            let assessment = model.assess(&raw)?;
            Ok((model, raw, assessment))
        });

    match result {
        Ok((model, raw, assessment)) => {
            let message = format!("conditions look {:?}", assessment.class).to_lowercase();
            CommandResult::success_with(
                COMMAND,
                message,
                ClassifyReport {
                    model_version: model.version().to_string(),
                    features: FEATURE_NAMES.iter().copied().zip(raw.values()).collect(),
                    assessment,
                },
            )
        }
        Err(error) => CommandResult::application_failure(COMMAND, &error),
    }
}

fn parse_features(raw: &str) -> Result<Vec<f64>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value.parse::<f64>().map_err(|_| format!("feature value `{value}` is not a number"))
        })
        .collect()
}

/// Loads the deployed model from `explicit` or `model.artifact_path`.
pub fn load_model(
    config: &AppConfig,
    explicit: Option<PathBuf>,
) -> Result<ConditionModel, ApplicationError> {
    let path = explicit.or_else(|| config.model.artifact_path.clone()).ok_or_else(|| {
        ApplicationError::Configuration(
            "no classifier artifact given; pass --model or set model.artifact_path".to_string(),
        )
    })?;
    let artifact = ClassifierArtifact::read(&path)?;
    Ok(ConditionModel::from_artifact(artifact)?)
}

#[cfg(test)]
mod tests {
    use super::parse_features;

    #[test]
    fn parses_comma_separated_values() {
        assert_eq!(parse_features("1, 2.5,-3"), Ok(vec![1.0, 2.5, -3.0]));
    }

    #[test]
    fn rejects_non_numeric_values() {
        let error = parse_features("1,two,3").expect_err("two is not a number");

        assert!(error.contains("`two`"));
    }
}
