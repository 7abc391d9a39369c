//! Fishing Condition Model
//!
//! A small feed-forward classifier that maps weather and location features to a
//! probability distribution over ordinal fishing-quality classes, together with
//! the z-score normalizer it was trained against and a bootstrap trainer.
//! Inference is pure and shares no mutable state; training needs exclusive
//! access to the network it updates.

pub mod artifact;
pub mod classifier;
pub mod features;
pub mod network;
pub mod normalizer;
pub mod training;

pub use artifact::ClassifierArtifact;
pub use classifier::{
    good_conditions_probability, ConditionAssessment, ConditionClass, ConditionModel,
    FishingConditionClassifier, CONDITION_CLASSES, DEFAULT_HIDDEN_UNITS,
};
pub use features::{season_index, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use network::{ForwardPass, Network};
pub use normalizer::{denormalize, normalize, Normalizer};
pub use training::{
    bootstrap_network, CatchClass, CatchObservation, SimplifiedBackprop, Trainer, TrainingReport,
    TrainingSample,
};
