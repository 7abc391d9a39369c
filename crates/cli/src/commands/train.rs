use serde::Serialize;
use spotcast_core::config::LoadOptions;
use spotcast_core::errors::ApplicationError;
use spotcast_core::ml::{
    bootstrap_network, CatchObservation, ClassifierArtifact, SimplifiedBackprop, Trainer,
    TrainingReport, TrainingSample,
};
use tracing::info;
use uuid::Uuid;

use crate::commands::{load_config, read_json, storage_failure, CommandResult};
use crate::TrainArgs;

const COMMAND: &str = "train";

#[derive(Debug, Serialize)]
struct TrainSummary {
    version: String,
    output: String,
    hidden_units: usize,
    learning_rate: f64,
    seed: u64,
    report: TrainingReport,
}

pub fn run(options: &LoadOptions, args: TrainArgs) -> CommandResult {
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let observations: Vec<CatchObservation> = match read_json(&args.samples, "catch observations")
    {
        Ok(observations) => observations,
        Err(error) => return storage_failure(COMMAND, &error),
    };
    let samples: Vec<TrainingSample> = observations.into_iter().map(TrainingSample::from).collect();

    let run_id = Uuid::new_v4();
    let seed = args.seed.unwrap_or(config.training.seed);
    let trainer = SimplifiedBackprop {
        epochs: args.epochs.unwrap_or(config.training.epochs),
        learning_rate: config.training.learning_rate,
    };
    info!(
        event_name = "spotcast.training.started",
        correlation_id = %run_id,
        samples = samples.len(),
        epochs = trainer.epochs,
        seed,
        "training bootstrap catch model"
    );

    let mut network = bootstrap_network(config.training.hidden_units, seed);
    let version = format!("bootstrap-{run_id}");
    let result = trainer.train(&mut network, &samples).map_err(ApplicationError::from).and_then(
        |report| {
            ClassifierArtifact::from_network(version.clone(), &network, None).write(&args.output)?;
            Ok(report)
        },
    );

    match result {
        Ok(report) => {
            let message = format!(
                "trained on {} samples, accuracy {:.3}, loss {:.4}",
                report.samples, report.accuracy, report.loss
            );
            CommandResult::success_with(
                COMMAND,
                message,
                TrainSummary {
                    version,
                    output: args.output.display().to_string(),
                    hidden_units: config.training.hidden_units,
                    learning_rate: trainer.learning_rate,
                    seed,
                    report,
                },
            )
        }
        Err(error) => CommandResult::application_failure(COMMAND, &error),
    }
}
