//! Z-score normalization aligning runtime features with the training distribution.

use serde::{Deserialize, Serialize};

use super::features::{FeatureVector, FEATURE_COUNT};
use crate::errors::ModelError;

/// `(raw[i] - mean[i]) / scale[i]` for every feature.
pub fn normalize(raw: &[f64], mean: &[f64], scale: &[f64]) -> Result<FeatureVector, ModelError> {
    check_shape(raw)?;
    check_parameters(mean, scale)?;

    let mut values = [0.0; FEATURE_COUNT];
    for (index, value) in values.iter_mut().enumerate() {
        *value = (raw[index] - mean[index]) / scale[index];
    }
    Ok(FeatureVector::new(values))
}

/// Inverse of [`normalize`].
pub fn denormalize(
    normalized: &[f64],
    mean: &[f64],
    scale: &[f64],
) -> Result<FeatureVector, ModelError> {
    check_shape(normalized)?;
    check_parameters(mean, scale)?;

    let mut values = [0.0; FEATURE_COUNT];
    for (index, value) in values.iter_mut().enumerate() {
        *value = normalized[index] * scale[index] + mean[index];
    }
    Ok(FeatureVector::new(values))
}

fn check_shape(values: &[f64]) -> Result<(), ModelError> {
    if values.len() != FEATURE_COUNT {
        return Err(ModelError::ShapeMismatch { expected: FEATURE_COUNT, actual: values.len() });
    }
    Ok(())
}

fn check_parameters(mean: &[f64], scale: &[f64]) -> Result<(), ModelError> {
    check_shape(mean)?;
    check_shape(scale)?;
    if let Some((index, value)) =
        scale.iter().enumerate().find(|(_, value)| **value == 0.0 || !value.is_finite())
    {
        return Err(ModelError::DegenerateScale { index, value: *value });
    }
    Ok(())
}

/// Validated mean/scale pair shipped with a deployed classifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NormalizerParams")]
pub struct Normalizer {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

#[derive(Deserialize)]
struct NormalizerParams {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl TryFrom<NormalizerParams> for Normalizer {
    type Error = ModelError;

    fn try_from(params: NormalizerParams) -> Result<Self, Self::Error> {
        Self::new(params.mean, params.scale)
    }
}

impl Normalizer {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ModelError> {
        check_parameters(&mean, &scale)?;
        Ok(Self { mean, scale })
    }

    pub fn identity() -> Self {
        Self { mean: vec![0.0; FEATURE_COUNT], scale: vec![1.0; FEATURE_COUNT] }
    }

    pub fn normalize(&self, raw: &FeatureVector) -> FeatureVector {
        let raw = raw.values();
        let mut values = [0.0; FEATURE_COUNT];
        for (index, value) in values.iter_mut().enumerate() {
            *value = (raw[index] - self.mean[index]) / self.scale[index];
        }
        FeatureVector::new(values)
    }

    pub fn denormalize(&self, normalized: &FeatureVector) -> FeatureVector {
        let normalized = normalized.values();
        let mut values = [0.0; FEATURE_COUNT];
        for (index, value) in values.iter_mut().enumerate() {
            *value = normalized[index] * self.scale[index] + self.mean[index];
        }
        FeatureVector::new(values)
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: [f64; FEATURE_COUNT] = [0.0, 12.0, 2.0, 0.0, 1013.0, 10.0, 14.0, 2.0, 60.0, 10.0];
    const MEAN: [f64; FEATURE_COUNT] = [3.0, 8.5, 4.2, 1.1, 1009.0, 55.0, 12.0, 1.5, 62.0, 11.0];
    const SCALE: [f64; FEATURE_COUNT] = [2.5, 6.0, 2.8, 2.0, 11.0, 30.0, 6.5, 1.1, 4.0, 5.5];

    #[test]
    fn normalize_applies_z_score_per_feature() {
        let normalized = normalize(&RAW, &MEAN, &SCALE).expect("valid shapes");

        assert!((normalized.values()[1] - (12.0 - 8.5) / 6.0).abs() < 1e-12);
        assert!((normalized.values()[4] - (1013.0 - 1009.0) / 11.0).abs() < 1e-12);
    }

    #[test]
    fn denormalize_inverts_normalize() {
        let normalized = normalize(&RAW, &MEAN, &SCALE).expect("valid shapes");
        let restored = denormalize(normalized.as_slice(), &MEAN, &SCALE).expect("valid shapes");

        for (restored, original) in restored.values().iter().zip(RAW) {
            assert!((restored - original).abs() < 1e-9, "{restored} != {original}");
        }
    }

    #[test]
    fn identity_parameters_leave_values_unchanged() {
        let normalized = normalize(&RAW, &[0.0; FEATURE_COUNT], &[1.0; FEATURE_COUNT])
            .expect("identity normalization must not fail");
        assert_eq!(normalized.values(), RAW);

        let normalizer = Normalizer::identity();
        assert_eq!(normalizer.normalize(&FeatureVector::new(RAW)).values(), RAW);
    }

    #[test]
    fn wrong_lengths_are_rejected() {
        assert_eq!(
            normalize(&RAW[..9], &MEAN, &SCALE),
            Err(ModelError::ShapeMismatch { expected: FEATURE_COUNT, actual: 9 })
        );

        let mut long = RAW.to_vec();
        long.push(1.0);
        assert_eq!(
            normalize(&long, &MEAN, &SCALE),
            Err(ModelError::ShapeMismatch { expected: FEATURE_COUNT, actual: 11 })
        );
        assert!(matches!(
            normalize(&RAW, &MEAN[..9], &SCALE),
            Err(ModelError::ShapeMismatch { actual: 9, .. })
        ));
    }

    #[test]
    fn zero_scale_is_reported_instead_of_dividing() {
        let mut scale = SCALE;
        scale[5] = 0.0;

        assert_eq!(
            normalize(&RAW, &MEAN, &scale),
            Err(ModelError::DegenerateScale { index: 5, value: 0.0 })
        );
        assert!(Normalizer::new(MEAN.to_vec(), scale.to_vec()).is_err());
    }

    #[test]
    fn normalizer_round_trips() {
        let normalizer = Normalizer::new(MEAN.to_vec(), SCALE.to_vec()).expect("valid parameters");
        let raw = FeatureVector::new(RAW);

        let restored = normalizer.denormalize(&normalizer.normalize(&raw));
        for (restored, original) in restored.values().iter().zip(RAW) {
            assert!((restored - original).abs() < 1e-9);
        }
    }

    #[test]
    fn deserializing_runs_the_same_checks_as_new() {
        let valid = serde_json::json!({ "mean": MEAN, "scale": SCALE });
        let normalizer: Normalizer = serde_json::from_value(valid).expect("valid parameters");
        assert_eq!(normalizer.scale(), SCALE);

        let short = serde_json::json!({ "mean": &MEAN[..9], "scale": SCALE });
        let error = serde_json::from_value::<Normalizer>(short).expect_err("short mean");
        assert!(error.to_string().contains("shape mismatch"), "{error}");

        let mut scale = SCALE;
        scale[3] = 0.0;
        let degenerate = serde_json::json!({ "mean": MEAN, "scale": scale });
        assert!(serde_json::from_value::<Normalizer>(degenerate).is_err());
    }
}
