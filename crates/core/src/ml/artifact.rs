//! JSON persistence for classifier parameters.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::network::Network;
use super::normalizer::Normalizer;
use crate::errors::{ApplicationError, ModelError};

/// Serialized network weights, plus normalization parameters for deployed models.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub version: String,
    pub input_weights: Vec<Vec<f64>>,
    pub hidden_bias: Vec<f64>,
    pub output_weights: Vec<Vec<f64>>,
    pub output_bias: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec<f64>>,
}

impl ClassifierArtifact {
    pub fn from_network(
        version: impl Into<String>,
        network: &Network,
        normalizer: Option<&Normalizer>,
    ) -> Self {
        Self {
            version: version.into(),
            input_weights: network.input_weights().to_vec(),
            hidden_bias: network.hidden_bias().to_vec(),
            output_weights: network.output_weights().to_vec(),
            output_bias: network.output_bias().to_vec(),
            mean: normalizer.map(|normalizer| normalizer.mean().to_vec()),
            scale: normalizer.map(|normalizer| normalizer.scale().to_vec()),
        }
    }

    pub fn into_network(self) -> Result<Network, ModelError> {
        Network::from_parts(
            self.input_weights,
            self.hidden_bias,
            self.output_weights,
            self.output_bias,
        )
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json)
            .map_err(|error| ModelError::InvalidArtifact(format!("failed to parse artifact: {error}")))
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        serde_json::to_string_pretty(self).map_err(|error| {
            ModelError::InvalidArtifact(format!("failed to serialize artifact: {error}"))
        })
    }

    pub fn read(path: &Path) -> Result<Self, ApplicationError> {
        let raw = fs::read_to_string(path).map_err(|error| {
            ApplicationError::Storage(format!("could not read `{}`: {error}", path.display()))
        })?;
        Ok(Self::from_json(&raw)?)
    }

    pub fn write(&self, path: &Path) -> Result<(), ApplicationError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|error| {
            ApplicationError::Storage(format!("could not write `{}`: {error}", path.display()))
        })
    }
}
