//! Fishing condition classifier used at inference time.

use serde::{Deserialize, Serialize};

use super::artifact::ClassifierArtifact;
use super::features::{FeatureVector, FEATURE_COUNT};
use super::network::{argmax, Network};
use super::normalizer::Normalizer;
use crate::errors::ModelError;

/// Number of ordinal fishing-quality classes.
pub const CONDITION_CLASSES: usize = 4;

/// Width of the hidden layer in the lightweight deployed variant.
pub const DEFAULT_HIDDEN_UNITS: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionClass {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl ConditionClass {
    pub const ALL: [ConditionClass; CONDITION_CLASSES] =
        [Self::Poor, Self::Fair, Self::Good, Self::Excellent];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FishingConditionClassifier {
    network: Network,
}

impl FishingConditionClassifier {
    pub fn new(network: Network) -> Result<Self, ModelError> {
        if network.input_size() != FEATURE_COUNT || network.output_size() != CONDITION_CLASSES {
            return Err(ModelError::InvalidArtifact(format!(
                "classifier expects a {FEATURE_COUNT}-input, {CONDITION_CLASSES}-output network, got {}-input, {}-output",
                network.input_size(),
                network.output_size()
            )));
        }
        Ok(Self { network })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Softmax distribution over [`ConditionClass`] for an already normalized input.
    pub fn predict_scores(&self, input: &[f64]) -> Result<[f64; CONDITION_CLASSES], ModelError> {
        if input.len() != FEATURE_COUNT {
            return Err(ModelError::InvalidInputShape {
                expected: FEATURE_COUNT,
                actual: input.len(),
            });
        }
        reject_non_finite("input", input)?;
        let pass = self.network.forward_unchecked(input);
        reject_non_finite("score", &pass.probabilities)?;
        let mut scores = [0.0; CONDITION_CLASSES];
        scores.copy_from_slice(&pass.probabilities);
        Ok(scores)
    }

    pub fn predict_class(&self, input: &[f64]) -> Result<usize, ModelError> {
        self.predict_scores(input).map(|scores| argmax(&scores))
    }
}

fn reject_non_finite(stage: &'static str, values: &[f64]) -> Result<(), ModelError> {
    match values.iter().enumerate().find(|(_, value)| !value.is_finite()) {
        Some((index, value)) => Err(ModelError::NonFinite { stage, index, value: *value }),
        None => Ok(()),
    }
}

/// Probability of good-or-better conditions.
pub fn good_conditions_probability(scores: &[f64; CONDITION_CLASSES]) -> f64 {
    scores[ConditionClass::Good.index()] + scores[ConditionClass::Excellent.index()]
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConditionAssessment {
    pub scores: [f64; CONDITION_CLASSES],
    pub class: ConditionClass,
    pub score: f64,
}

/// Normalizer and classifier loaded together from one artifact.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionModel {
    version: String,
    normalizer: Normalizer,
    classifier: FishingConditionClassifier,
}

impl ConditionModel {
    pub fn new(
        version: impl Into<String>,
        normalizer: Normalizer,
        classifier: FishingConditionClassifier,
    ) -> Self {
        Self { version: version.into(), normalizer, classifier }
    }

    pub fn from_artifact(artifact: ClassifierArtifact) -> Result<Self, ModelError> {
        let (Some(mean), Some(scale)) = (artifact.mean.clone(), artifact.scale.clone()) else {
            return Err(ModelError::InvalidArtifact(
                "deployed classifier artifact requires mean and scale vectors".to_string(),
            ));
        };
        let normalizer = Normalizer::new(mean, scale)?;
        let version = artifact.version.clone();
        let classifier = FishingConditionClassifier::new(artifact.into_network()?)?;
        Ok(Self::new(version, normalizer, classifier))
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn classifier(&self) -> &FishingConditionClassifier {
        &self.classifier
    }

    /// Normalize raw features and classify them.
    pub fn assess(&self, raw: &FeatureVector) -> Result<ConditionAssessment, ModelError> {
        let normalized = self.normalizer.normalize(raw);
        let scores = self.classifier.predict_scores(normalized.as_slice())?;
        let class = ConditionClass::from_index(argmax(&scores)).unwrap_or(ConditionClass::Poor);
        Ok(ConditionAssessment { scores, class, score: good_conditions_probability(&scores) })
    }
}
