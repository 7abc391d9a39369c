//! Single hidden-layer feed-forward network shared by inference and training.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Range for uniform weight initialisation.
const INIT_RANGE: f64 = 0.5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Network {
    /// `[input][hidden]`
    pub(crate) input_weights: Vec<Vec<f64>>,
    pub(crate) hidden_bias: Vec<f64>,
    /// `[hidden][output]`
    pub(crate) output_weights: Vec<Vec<f64>>,
    pub(crate) output_bias: Vec<f64>,
}

/// Intermediate activations of one forward pass.
#[derive(Clone, Debug, PartialEq)]
pub struct ForwardPass {
    pub hidden: Vec<f64>,
    pub logits: Vec<f64>,
    pub probabilities: Vec<f64>,
}

impl Network {
    pub fn zeroed(inputs: usize, hidden: usize, outputs: usize) -> Self {
        Self {
            input_weights: vec![vec![0.0; hidden]; inputs],
            hidden_bias: vec![0.0; hidden],
            output_weights: vec![vec![0.0; outputs]; hidden],
            output_bias: vec![0.0; outputs],
        }
    }

    /// Uniformly initialised network; the same seed always yields the same weights.
    pub fn seeded(inputs: usize, hidden: usize, outputs: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut sample = |len: usize| -> Vec<f64> {
            (0..len).map(|_| rng.gen_range(-INIT_RANGE..INIT_RANGE)).collect()
        };

        let input_weights = (0..inputs).map(|_| sample(hidden)).collect();
        let hidden_bias = sample(hidden);
        let output_weights = (0..hidden).map(|_| sample(outputs)).collect();
        let output_bias = sample(outputs);

        Self { input_weights, hidden_bias, output_weights, output_bias }
    }

    /// Assemble a network from raw parameters, checking that every matrix is rectangular
    /// and that the layers line up.
    pub fn from_parts(
        input_weights: Vec<Vec<f64>>,
        hidden_bias: Vec<f64>,
        output_weights: Vec<Vec<f64>>,
        output_bias: Vec<f64>,
    ) -> Result<Self, ModelError> {
        let hidden = hidden_bias.len();
        let outputs = output_bias.len();

        if input_weights.is_empty() || hidden == 0 || outputs == 0 {
            return Err(ModelError::InvalidArtifact("network layers must not be empty".to_string()));
        }
        if let Some(row) = input_weights.iter().position(|row| row.len() != hidden) {
            return Err(ModelError::InvalidArtifact(format!(
                "input_weights row {row} has {} columns, expected {hidden}",
                input_weights[row].len()
            )));
        }
        if output_weights.len() != hidden {
            return Err(ModelError::InvalidArtifact(format!(
                "output_weights has {} rows, expected {hidden}",
                output_weights.len()
            )));
        }
        if let Some(row) = output_weights.iter().position(|row| row.len() != outputs) {
            return Err(ModelError::InvalidArtifact(format!(
                "output_weights row {row} has {} columns, expected {outputs}",
                output_weights[row].len()
            )));
        }
        let all_finite = input_weights
            .iter()
            .chain(output_weights.iter())
            .flatten()
            .chain(hidden_bias.iter())
            .chain(output_bias.iter())
            .all(|value| value.is_finite());
        if !all_finite {
            return Err(ModelError::InvalidArtifact("network parameters must be finite".to_string()));
        }

        Ok(Self { input_weights, hidden_bias, output_weights, output_bias })
    }

    pub fn input_size(&self) -> usize {
        self.input_weights.len()
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_bias.len()
    }

    pub fn output_size(&self) -> usize {
        self.output_bias.len()
    }

    pub fn input_weights(&self) -> &[Vec<f64>] {
        &self.input_weights
    }

    pub fn hidden_bias(&self) -> &[f64] {
        &self.hidden_bias
    }

    pub fn output_weights(&self) -> &[Vec<f64>] {
        &self.output_weights
    }

    pub fn output_bias(&self) -> &[f64] {
        &self.output_bias
    }

    pub fn forward(&self, input: &[f64]) -> Result<ForwardPass, ModelError> {
        if input.len() != self.input_size() {
            return Err(ModelError::InvalidInputShape {
                expected: self.input_size(),
                actual: input.len(),
            });
        }
        Ok(self.forward_unchecked(input))
    }

    pub(crate) fn forward_unchecked(&self, input: &[f64]) -> ForwardPass {
        let hidden: Vec<f64> = (0..self.hidden_size())
            .map(|j| {
                let z: f64 = input
                    .iter()
                    .zip(&self.input_weights)
                    .map(|(x, row)| x * row[j])
                    .sum::<f64>()
                    + self.hidden_bias[j];
                relu(z)
            })
            .collect();

        let logits: Vec<f64> = (0..self.output_size())
            .map(|k| {
                hidden
                    .iter()
                    .zip(&self.output_weights)
                    .map(|(h, row)| h * row[k])
                    .sum::<f64>()
                    + self.output_bias[k]
            })
            .collect();

        let probabilities = softmax(&logits);
        ForwardPass { hidden, logits, probabilities }
    }
}

pub fn relu(x: f64) -> f64 {
    x.max(0.0)
}

/// Derivative of ReLU evaluated on an activation value.
pub fn relu_derivative(activation: f64) -> f64 {
    if activation > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|value| (value - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|value| value / sum).collect()
}

/// Index of the largest value; ties resolve to the lowest index.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (index, value) in values.iter().enumerate().skip(1) {
        if *value > values[best] {
            best = index;
        }
    }
    best
}
