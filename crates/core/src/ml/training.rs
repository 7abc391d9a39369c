//! Bootstrap trainer for the simplified catch classifier.
//!
//! The in-app trainer works on three weather features (air temperature, wind
//! speed, precipitation) and buckets observed catches into three classes.
//! Updates follow the historical rule exactly, including its shortcuts:
//! the hidden-layer error collapses the chain rule into plain sums and biases
//! are never updated. Because one-hot targets and softmax outputs both sum to
//! one, the summed output error is ~0, so input weights barely move.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::network::{argmax, relu_derivative, Network};
use crate::errors::ModelError;

/// Inputs of the bootstrap network: temperature, wind, precipitation.
pub const TRAINING_FEATURES: usize = 3;
pub const TRAINING_HIDDEN_UNITS: usize = 16;
pub const CATCH_CLASSES: usize = 3;

pub const DEFAULT_EPOCHS: usize = 1000;
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;

const PROGRESS_INTERVAL: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatchClass {
    Bad,
    Good,
    Great,
}

impl CatchClass {
    pub fn from_catch_count(count: u32) -> Self {
        match count {
            0 => Self::Bad,
            1..=2 => Self::Good,
            _ => Self::Great,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn one_hot(self) -> [f64; CATCH_CLASSES] {
        let mut target = [0.0; CATCH_CLASSES];
        target[self.index()] = 1.0;
        target
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub features: Vec<f64>,
    pub catch_count: u32,
}

/// One logged fishing trip, as stored in training data files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatchObservation {
    pub air_temperature: f64,
    pub wind_speed: f64,
    pub precipitation: f64,
    pub catch_count: u32,
}

impl From<CatchObservation> for TrainingSample {
    fn from(observation: CatchObservation) -> Self {
        Self {
            features: vec![
                observation.air_temperature,
                observation.wind_speed,
                observation.precipitation,
            ],
            catch_count: observation.catch_count,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrainingReport {
    pub epochs: usize,
    pub samples: usize,
    /// Share of training samples whose argmax matches the catch class
    pub accuracy: f64,
    /// Mean cross-entropy over the training set
    pub loss: f64,
}

/// Swappable training strategy. Implementations must leave `network`
/// untouched when they return an error.
pub trait Trainer {
    fn train(
        &self,
        network: &mut Network,
        samples: &[TrainingSample],
    ) -> Result<TrainingReport, ModelError>;
}

/// Per-sample gradient steps using the simplified backward pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimplifiedBackprop {
    pub epochs: usize,
    pub learning_rate: f64,
}

impl Default for SimplifiedBackprop {
    fn default() -> Self {
        Self { epochs: DEFAULT_EPOCHS, learning_rate: DEFAULT_LEARNING_RATE }
    }
}

impl SimplifiedBackprop {
    fn step(&self, network: &mut Network, sample: &TrainingSample) {
        let input = &sample.features;
        let pass = network.forward_unchecked(input);
        let target = CatchClass::from_catch_count(sample.catch_count).one_hot();

        let output_error: Vec<f64> =
            target.iter().zip(&pass.probabilities).map(|(t, p)| t - p).collect();
        let error_sum: f64 = output_error.iter().sum();

        // computed against the pre-update output weights
        let hidden_error: Vec<f64> = pass
            .hidden
            .iter()
            .zip(&network.output_weights)
            .map(|(activation, row)| {
                error_sum * row.iter().sum::<f64>() * relu_derivative(*activation)
            })
            .collect();

        for (activation, row) in pass.hidden.iter().zip(network.output_weights.iter_mut()) {
            for (weight, error) in row.iter_mut().zip(&output_error) {
                *weight += self.learning_rate * error * activation;
            }
        }

        for (x, row) in input.iter().zip(network.input_weights.iter_mut()) {
            for (weight, error) in row.iter_mut().zip(&hidden_error) {
                *weight += self.learning_rate * error * x;
            }
        }
    }
}

impl Trainer for SimplifiedBackprop {
    fn train(
        &self,
        network: &mut Network,
        samples: &[TrainingSample],
    ) -> Result<TrainingReport, ModelError> {
        validate_samples(network, samples)?;

        for epoch in 0..self.epochs {
            for sample in samples {
                self.step(network, sample);
            }

            if epoch % PROGRESS_INTERVAL == 0 {
                let (accuracy, loss) = evaluate_unchecked(network, samples);
                debug!(
                    event_name = "spotcast.training.progress",
                    epoch,
                    accuracy,
                    loss,
                    "training progress"
                );
            }
        }

        let (accuracy, loss) = evaluate_unchecked(network, samples);
        info!(
            event_name = "spotcast.training.completed",
            epochs = self.epochs,
            samples = samples.len(),
            accuracy,
            loss,
            "training completed"
        );

        Ok(TrainingReport { epochs: self.epochs, samples: samples.len(), accuracy, loss })
    }
}

/// Network shape used by the in-app trainer, with seeded initial weights.
pub fn bootstrap_network(hidden_units: usize, seed: u64) -> Network {
    Network::seeded(TRAINING_FEATURES, hidden_units, CATCH_CLASSES, seed)
}

/// Accuracy and mean cross-entropy of `network` on `samples`.
pub fn evaluate(network: &Network, samples: &[TrainingSample]) -> Result<(f64, f64), ModelError> {
    validate_samples(network, samples)?;
    Ok(evaluate_unchecked(network, samples))
}

fn evaluate_unchecked(network: &Network, samples: &[TrainingSample]) -> (f64, f64) {
    let mut correct = 0usize;
    let mut loss = 0.0;

    for sample in samples {
        let pass = network.forward_unchecked(&sample.features);
        let class = CatchClass::from_catch_count(sample.catch_count).index();
        if argmax(&pass.probabilities) == class {
            correct += 1;
        }
        // Clamp to avoid ln(0)
        loss -= pass.probabilities[class].clamp(1e-15, 1.0).ln();
    }

    let n = samples.len() as f64;
    (correct as f64 / n, loss / n)
}

fn validate_samples(network: &Network, samples: &[TrainingSample]) -> Result<(), ModelError> {
    if samples.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }
    if network.output_size() != CATCH_CLASSES {
        return Err(ModelError::ShapeMismatch {
            expected: CATCH_CLASSES,
            actual: network.output_size(),
        });
    }

    for (index, sample) in samples.iter().enumerate() {
        if sample.features.len() != network.input_size() {
            return Err(ModelError::InvalidTrainingSample {
                index,
                reason: format!(
                    "expected {} features, got {}",
                    network.input_size(),
                    sample.features.len()
                ),
            });
        }
        if sample.features.iter().any(|value| !value.is_finite()) {
            return Err(ModelError::InvalidTrainingSample {
                index,
                reason: "features must be finite numbers".to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::network::softmax;

    fn sample(temperature: f64, wind: f64, rain: f64, catch_count: u32) -> TrainingSample {
        CatchObservation {
            air_temperature: temperature,
            wind_speed: wind,
            precipitation: rain,
            catch_count,
        }
        .into()
    }

    #[test]
    fn catch_counts_bucket_into_classes() {
        assert_eq!(CatchClass::from_catch_count(0), CatchClass::Bad);
        assert_eq!(CatchClass::from_catch_count(1), CatchClass::Good);
        assert_eq!(CatchClass::from_catch_count(2), CatchClass::Good);
        assert_eq!(CatchClass::from_catch_count(3), CatchClass::Great);
        assert_eq!(CatchClass::from_catch_count(40), CatchClass::Great);
        assert_eq!(CatchClass::Good.one_hot(), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn single_step_follows_simplified_update_rule() {
        let mut network = Network::from_parts(
            vec![vec![0.5, -0.5]],
            vec![0.0, 0.0],
            vec![vec![0.2, 0.0, -0.2], vec![0.1, 0.1, 0.1]],
            vec![0.0, 0.0, 0.0],
        )
        .expect("valid network");
        let before = network.clone();
        let trainer = SimplifiedBackprop { epochs: 1, learning_rate: 0.1 };

        trainer
            .train(&mut network, &[TrainingSample { features: vec![1.0], catch_count: 0 }])
            .expect("valid sample");

        let probabilities = softmax(&[0.1, 0.0, -0.1]);
        let output_error = [1.0 - probabilities[0], -probabilities[1], -probabilities[2]];
        for (k, error) in output_error.iter().enumerate() {
            let expected = before.output_weights[0][k] + 0.1 * error * 0.5;
            assert!((network.output_weights[0][k] - expected).abs() < 1e-12);
        }
        // inactive hidden unit receives no update
        assert_eq!(network.output_weights[1], before.output_weights[1]);
        // summed output error is zero, so the input layer is effectively frozen
        for (row, original) in network.input_weights.iter().zip(&before.input_weights) {
            for (weight, original) in row.iter().zip(original) {
                assert!((weight - original).abs() < 1e-12);
            }
        }
        assert_eq!(network.hidden_bias, before.hidden_bias);
        assert_eq!(network.output_bias, before.output_bias);
    }

    #[test]
    fn training_learns_a_constant_outcome() {
        let samples: Vec<TrainingSample> = (0..20)
            .map(|i| sample(8.0 + f64::from(i) * 0.5, 3.0, 0.0, 0))
            .collect();
        let mut network = bootstrap_network(TRAINING_HIDDEN_UNITS, 17);
        let trainer = SimplifiedBackprop { epochs: 200, learning_rate: 0.01 };

        let (_, initial_loss) = evaluate(&network, &samples).expect("valid samples");
        let report = trainer.train(&mut network, &samples).expect("valid samples");

        assert_eq!(report.samples, 20);
        assert_eq!(report.epochs, 200);
        assert!(report.loss < initial_loss, "{} !< {initial_loss}", report.loss);
        assert_eq!(report.accuracy, 1.0);
    }

    #[test]
    fn training_is_deterministic_for_a_seed() {
        let samples =
            vec![sample(12.0, 2.0, 0.0, 3), sample(4.0, 11.0, 6.0, 0), sample(9.0, 5.0, 1.0, 1)];
        let trainer = SimplifiedBackprop { epochs: 50, learning_rate: 0.01 };

        let mut first = bootstrap_network(TRAINING_HIDDEN_UNITS, 5);
        let mut second = bootstrap_network(TRAINING_HIDDEN_UNITS, 5);
        let first_report = trainer.train(&mut first, &samples).expect("valid samples");
        let second_report = trainer.train(&mut second, &samples).expect("valid samples");

        assert_eq!(first, second);
        assert_eq!(first_report, second_report);
    }

    #[test]
    fn malformed_sample_aborts_without_touching_weights() {
        let mut network = bootstrap_network(TRAINING_HIDDEN_UNITS, 1);
        let before = network.clone();
        let samples = vec![
            sample(10.0, 2.0, 0.0, 1),
            TrainingSample { features: vec![10.0, 2.0], catch_count: 1 },
        ];

        let result = SimplifiedBackprop::default().train(&mut network, &samples);

        assert!(matches!(result, Err(ModelError::InvalidTrainingSample { index: 1, .. })));
        assert_eq!(network, before);
    }

    #[test]
    fn non_finite_features_are_rejected() {
        let mut network = bootstrap_network(TRAINING_HIDDEN_UNITS, 1);
        let samples = vec![sample(f64::NAN, 2.0, 0.0, 1)];

        assert!(matches!(
            SimplifiedBackprop::default().train(&mut network, &samples),
            Err(ModelError::InvalidTrainingSample { index: 0, .. })
        ));
    }

    #[test]
    fn empty_sample_set_is_rejected() {
        let mut network = bootstrap_network(TRAINING_HIDDEN_UNITS, 1);
        assert_eq!(
            SimplifiedBackprop::default().train(&mut network, &[]),
            Err(ModelError::EmptyTrainingSet)
        );
    }
}
