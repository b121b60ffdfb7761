//! Income Band Model
//!
//! Scores an employee record: the probability that they earn more than
//! $50K a year, plus the resulting 0/1 label.
//!
//! ## Modules
//!
//! - [`encoding`]: label encoding, education numbers, standardization
//! - [`logistic`]: logistic regression model loaded from a JSON artifact
//! - [`train`]: fitting an artifact from adult census CSV data

pub mod encoding;
pub mod logistic;
pub mod train;

pub use encoding::{education_num, FeatureVector, StandardScaler, Vocabulary, FEATURE_NAMES};
pub use logistic::{LogisticModel, ModelArtifact};
pub use train::{train, Dataset, TrainConfig, TrainError, TrainingReport};

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::form::FormRecord;

/// Model output for one record
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    /// 1 for the high income band, 0 otherwise
    pub prediction: u8,
    /// Probability of the high income band
    pub probability: f64,
}

/// Anything that can score a record
pub trait Predictor: Send + Sync {
    /// Short name for health output and logs
    fn name(&self) -> &str;

    /// Score already encoded features
    fn predict_features(&self, features: &FeatureVector) -> Prediction;

    /// Encode and score a record
    fn predict(&self, record: &FormRecord) -> Result<Prediction, ModelError> {
        let features = FeatureVector::encode(record)?;
        Ok(self.predict_features(&features))
    }
}

/// Model loading and scoring errors
#[derive(Error, Debug)]
pub enum ModelError {
    /// A categorical value outside the known vocabulary
    #[error("Unknown value '{value}' for field '{field}'")]
    UnknownCategory { field: String, value: String },

    /// Artifact file could not be read
    #[error("Failed to read model artifact {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    /// Artifact file is not valid JSON for a model
    #[error("Failed to parse model artifact {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    /// Artifact parsed but its contents are unusable
    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),
}
