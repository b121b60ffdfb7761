//! Logistic Regression Model
//!
//! A linear model over the standardized feature vector. Weights, bias and
//! scaler statistics come from a JSON artifact, as written by `paylens train`:
//!
//! ```json
//! {
//!   "name": "adult-income-v2",
//!   "weights": [0.55, 0.01, 0.02, 0.8, -0.25, 0.01, -0.2, 0.05, 0.4, 2.3, 0.28, 0.42],
//!   "bias": -1.45,
//!   "scaler": { "mean": [38.6, 10.1, 1079.0, 87.5, 40.4], "scale": [13.7, 2.6, 7452.0, 403.0, 12.4] }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::encoding::{FeatureVector, StandardScaler, FEATURE_COUNT};
use super::{ModelError, Prediction, Predictor};

/// Serialized model parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    pub weights: Vec<f64>,
    pub bias: f64,
    pub scaler: StandardScaler,
}

/// Hand-set fallback weights, in feature order. Used when no trained
/// artifact is configured.
const BASELINE_WEIGHTS: [f64; FEATURE_COUNT] = [
    0.55,  // age
    0.01,  // workclass
    0.02,  // education
    0.80,  // educational-num
    -0.25, // marital-status
    0.01,  // occupation
    -0.20, // relationship
    0.05,  // race
    0.40,  // gender
    2.30,  // capital-gain
    0.28,  // capital-loss
    0.42,  // hours-per-week
];

const BASELINE_BIAS: f64 = -1.45;

impl ModelArtifact {
    /// Fallback parameters: the hand-set weights with the adult census
    /// means and standard deviations
    pub fn baseline() -> Self {
        Self {
            name: "baseline".to_string(),
            weights: BASELINE_WEIGHTS.to_vec(),
            bias: BASELINE_BIAS,
            scaler: StandardScaler {
                mean: [38.64, 10.08, 1079.07, 87.50, 40.42],
                scale: [13.71, 2.57, 7452.02, 403.00, 12.39],
            },
        }
    }
}

impl ModelArtifact {
    /// Write the artifact as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ModelError::InvalidArtifact(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| ModelError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Logistic regression predictor
#[derive(Debug, Clone)]
pub struct LogisticModel {
    name: String,
    weights: [f64; FEATURE_COUNT],
    bias: f64,
    scaler: StandardScaler,
}

impl LogisticModel {
    /// Build from an artifact, checking its shape
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        let weights: [f64; FEATURE_COUNT] = artifact.weights.as_slice().try_into().map_err(|_| {
            ModelError::InvalidArtifact(format!(
                "expected {} weights, found {}",
                FEATURE_COUNT,
                artifact.weights.len()
            ))
        })?;

        if weights.iter().any(|w| !w.is_finite()) || !artifact.bias.is_finite() {
            return Err(ModelError::InvalidArtifact(
                "weights and bias must be finite".to_string(),
            ));
        }
        artifact.scaler.validate()?;

        Ok(Self {
            name: artifact.name,
            weights,
            bias: artifact.bias,
            scaler: artifact.scaler,
        })
    }

    /// Load an artifact from a JSON file
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path).map_err(|e| ModelError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let artifact: ModelArtifact =
            serde_json::from_str(&content).map_err(|e| ModelError::Parse {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;

        Self::from_artifact(artifact)
    }

    /// The built-in baseline model
    pub fn baseline() -> Self {
        Self {
            name: "baseline".to_string(),
            weights: BASELINE_WEIGHTS,
            bias: BASELINE_BIAS,
            scaler: ModelArtifact::baseline().scaler,
        }
    }
}

impl Predictor for LogisticModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_features(&self, features: &FeatureVector) -> Prediction {
        let scaled = self.scaler.transform(features);
        let z: f64 = self
            .weights
            .iter()
            .zip(scaled.0.iter())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;

        let probability = sigmoid(z);
        Prediction {
            prediction: u8::from(probability >= 0.5),
            probability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormRecord;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn record(age: i64, education: &str, capital_gain: i64, hours: i64) -> FormRecord {
        FormRecord {
            age,
            workclass: "Private".to_string(),
            education: education.to_string(),
            marital_status: "Married-civ-spouse".to_string(),
            occupation: "Exec-managerial".to_string(),
            relationship: "Husband".to_string(),
            race: "White".to_string(),
            gender: "Male".to_string(),
            capital_gain,
            capital_loss: 0,
            hours_per_week: hours,
        }
    }

    #[test]
    fn test_baseline_matches_artifact() {
        let from_artifact = LogisticModel::from_artifact(ModelArtifact::baseline()).unwrap();
        let built_in = LogisticModel::baseline();
        let r = record(45, "Masters", 0, 50);

        assert_eq!(
            from_artifact.predict(&r).unwrap(),
            built_in.predict(&r).unwrap()
        );
    }

    #[test]
    fn test_probability_in_range_and_label_consistent() {
        let model = LogisticModel::baseline();
        for r in [
            record(19, "HS-grad", 0, 20),
            record(52, "Doctorate", 15000, 60),
            record(38, "Some-college", 0, 40),
        ] {
            let p = model.predict(&r).unwrap();
            assert!((0.0..=1.0).contains(&p.probability));
            assert_eq!(p.prediction == 1, p.probability >= 0.5);
        }
    }

    #[test]
    fn test_more_education_scores_higher() {
        let model = LogisticModel::baseline();
        let low = model.predict(&record(40, "HS-grad", 0, 40)).unwrap();
        let high = model.predict(&record(40, "Doctorate", 0, 40)).unwrap();
        assert!(high.probability > low.probability);
    }

    #[test]
    fn test_large_capital_gain_is_high_income() {
        let model = LogisticModel::baseline();
        let p = model.predict(&record(45, "Bachelors", 50000, 50)).unwrap();
        assert_eq!(p.prediction, 1);
    }

    #[test]
    fn test_wrong_weight_count() {
        let mut artifact = ModelArtifact::baseline();
        artifact.weights.pop();
        let err = LogisticModel::from_artifact(artifact).unwrap_err();
        assert!(err.to_string().contains("expected 12 weights, found 11"));
    }

    #[test]
    fn test_zero_scale_rejected() {
        let mut artifact = ModelArtifact::baseline();
        artifact.scaler.scale[2] = 0.0;
        assert!(matches!(
            LogisticModel::from_artifact(artifact),
            Err(ModelError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut artifact = ModelArtifact::baseline();
        artifact.name = "adult-income-v2".to_string();

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&artifact).unwrap().as_bytes())
            .unwrap();

        let model = LogisticModel::load(file.path()).unwrap();
        assert_eq!(model.name(), "adult-income-v2");
    }

    #[test]
    fn test_save_then_load() {
        let output = NamedTempFile::new().unwrap();
        ModelArtifact::baseline().save(output.path()).unwrap();

        let model = LogisticModel::load(output.path()).unwrap();
        let r = record(45, "Masters", 0, 50);
        assert_eq!(model.predict(&r).unwrap(), LogisticModel::baseline().predict(&r).unwrap());
    }

    #[test]
    fn test_load_missing_file() {
        let err = LogisticModel::load(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }
}
