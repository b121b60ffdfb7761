//! Model Training
//!
//! Fits a logistic model artifact from adult census CSV data:
//! - `?` or empty categorical cells are filled with the column's most common value
//! - categories are label-encoded against the serving vocabularies
//! - a seeded shuffle holds out a test split
//! - the [`StandardScaler`] is fitted on the training split
//! - the model is fitted by batch gradient descent and scored on the test split

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::encoding::{
    FeatureVector, StandardScaler, Vocabulary, EDUCATION, FEATURE_COUNT, FEATURE_NAMES, GENDER,
    MARITAL_STATUS, OCCUPATION, RACE, RELATIONSHIP, SCALED_FEATURES, WORKCLASS,
};
use super::logistic::{sigmoid, LogisticModel, ModelArtifact};
use super::{ModelError, Predictor};

/// Column holding the `<=50K` / `>50K` label
pub const TARGET_COLUMN: &str = "income";

/// Marker for an unknown value in the census data
pub const MISSING_MARKER: &str = "?";

/// Categorical columns, by position in the feature vector
const CATEGORICAL: [(usize, Vocabulary); 7] = [
    (1, WORKCLASS),
    (2, EDUCATION),
    (4, MARITAL_STATUS),
    (5, OCCUPATION),
    (6, RELATIONSHIP),
    (7, RACE),
    (8, GENDER),
];

/// Training settings
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Name stored in the artifact
    pub name: String,
    /// Share of rows held out for scoring
    pub test_fraction: f64,
    /// Seed for the train/test shuffle
    pub seed: u64,
    pub epochs: usize,
    pub learning_rate: f64,
    /// L2 penalty on the weights
    pub l2: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            name: "adult-income".to_string(),
            test_fraction: 0.2,
            seed: 42,
            epochs: 1000,
            learning_rate: 0.5,
            l2: 1e-3,
        }
    }
}

/// One encoded row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub features: FeatureVector,
    /// 1 for `>50K`
    pub label: u8,
}

/// Encoded training data
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    samples: Vec<Sample>,
    /// Rows dropped for a category outside the vocabulary
    pub skipped_rows: usize,
    /// Missing categorical cells replaced by the column mode
    pub filled_values: usize,
}

/// Outcome of a training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub artifact: ModelArtifact,
    pub train_rows: usize,
    pub test_rows: usize,
    pub skipped_rows: usize,
    pub filled_values: usize,
    pub train_accuracy: f64,
    /// `None` when no rows were held out
    pub test_accuracy: Option<f64>,
}

/// Training errors
#[derive(Error, Debug)]
pub enum TrainError {
    #[error("Failed to read training data {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Training data has no '{0}' column")]
    MissingColumn(String),

    #[error("Line {line}: invalid {column} value '{value}'")]
    InvalidValue {
        line: u64,
        column: String,
        value: String,
    },

    #[error("Column '{0}' has no values to fill gaps with")]
    EmptyColumn(String),

    #[error("No usable rows in training data")]
    NoData,

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl Dataset {
    /// Read a CSV file with a header row
    pub fn from_path(path: &Path) -> Result<Self, TrainError> {
        let file = std::fs::File::open(path).map_err(|e| TrainError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::from_reader(file)
    }

    /// Read CSV data with a header row. Columns are found by name; extra
    /// columns such as `fnlwgt` or `native-country` are ignored.
    pub fn from_reader(reader: impl Read) -> Result<Self, TrainError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let columns = FEATURE_NAMES
            .iter()
            .chain(std::iter::once(&TARGET_COLUMN))
            .map(|name| {
                headers
                    .iter()
                    .position(|h| h == *name)
                    .ok_or_else(|| TrainError::MissingColumn(name.to_string()))
            })
            .collect::<Result<Vec<usize>, _>>()?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let cells: Vec<String> = columns
                .iter()
                .map(|&i| record.get(i).unwrap_or_default().to_string())
                .collect();
            rows.push((line, cells));
        }

        let mut dataset = Dataset::default();

        for (position, vocab) in CATEGORICAL {
            let missing = rows.iter().filter(|(_, cells)| is_missing(&cells[position])).count();
            if missing == 0 {
                continue;
            }
            let fill = mode(rows.iter().map(|(_, cells)| cells[position].as_str()))
                .ok_or_else(|| TrainError::EmptyColumn(vocab.field.to_string()))?;
            tracing::debug!(column = vocab.field, missing, fill = %fill, "Filling missing values");

            for (_, cells) in rows.iter_mut() {
                if is_missing(&cells[position]) {
                    cells[position] = fill.clone();
                }
            }
            dataset.filled_values += missing;
        }

        'rows: for (line, cells) in &rows {
            let mut features = [0.0; FEATURE_COUNT];
            for &position in &SCALED_FEATURES {
                features[position] = parse_number(*line, FEATURE_NAMES[position], &cells[position])?;
            }
            for (position, vocab) in CATEGORICAL {
                match vocab.encode(&cells[position]) {
                    Ok(code) => features[position] = code as f64,
                    Err(e) => {
                        tracing::debug!(line, "Skipping row: {}", e);
                        dataset.skipped_rows += 1;
                        continue 'rows;
                    }
                }
            }

            dataset.samples.push(Sample {
                features: FeatureVector(features),
                label: parse_income(*line, &cells[FEATURE_COUNT])?,
            });
        }

        if dataset.skipped_rows > 0 {
            tracing::warn!(
                skipped = dataset.skipped_rows,
                "Dropped rows with categories the model does not know"
            );
        }

        Ok(dataset)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Shuffle with `seed` and split into (train, test)
    fn split(&self, test_fraction: f64, seed: u64) -> (Vec<&Sample>, Vec<&Sample>) {
        let mut indices: Vec<usize> = (0..self.samples.len()).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(seed));

        // Keep at least one training row
        let n = indices.len();
        let test_len = ((n as f64 * test_fraction.clamp(0.0, 1.0)).ceil() as usize)
            .min(n.saturating_sub(1));

        let (test, train) = indices.split_at(test_len);
        (
            train.iter().map(|&i| &self.samples[i]).collect(),
            test.iter().map(|&i| &self.samples[i]).collect(),
        )
    }
}

fn is_missing(value: &str) -> bool {
    value.is_empty() || value == MISSING_MARKER
}

/// Most common non-missing value; ties go to the smallest value
fn mode<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values.filter(|v| !is_missing(v)) {
        *counts.entry(value).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(value, _)| value.to_string())
}

fn parse_number(line: u64, column: &str, value: &str) -> Result<f64, TrainError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| TrainError::InvalidValue {
            line,
            column: column.to_string(),
            value: value.to_string(),
        })
}

fn parse_income(line: u64, value: &str) -> Result<u8, TrainError> {
    // The census test file ends its labels with a period
    match value.trim_end_matches('.') {
        ">50K" => Ok(1),
        "<=50K" => Ok(0),
        _ => Err(TrainError::InvalidValue {
            line,
            column: TARGET_COLUMN.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Mean and population standard deviation of one column; a zero spread becomes 1
fn column_stats(rows: &[[f64; FEATURE_COUNT]], column: usize) -> (f64, f64) {
    let n = rows.len() as f64;
    let mean = rows.iter().map(|r| r[column]).sum::<f64>() / n;
    let variance = rows.iter().map(|r| (r[column] - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    (mean, if std > 0.0 { std } else { 1.0 })
}

fn fit_scaler(train: &[&Sample]) -> StandardScaler {
    let rows: Vec<[f64; FEATURE_COUNT]> = train.iter().map(|s| s.features.0).collect();
    let mut scaler = StandardScaler {
        mean: [0.0; SCALED_FEATURES.len()],
        scale: [1.0; SCALED_FEATURES.len()],
    };
    for (slot, &feature) in SCALED_FEATURES.iter().enumerate() {
        (scaler.mean[slot], scaler.scale[slot]) = column_stats(&rows, feature);
    }
    scaler
}

/// Batch gradient descent on the scaled features.
///
/// Every column is standardized for the descent and the result folded back
/// into weights over the scaler's output, which is what the artifact stores.
fn fit_logistic(
    train: &[&Sample],
    scaler: &StandardScaler,
    config: &TrainConfig,
) -> ([f64; FEATURE_COUNT], f64) {
    let rows: Vec<[f64; FEATURE_COUNT]> = train
        .iter()
        .map(|s| scaler.transform(&s.features).0)
        .collect();
    let labels: Vec<f64> = train.iter().map(|s| f64::from(s.label)).collect();
    let stats: Vec<(f64, f64)> = (0..FEATURE_COUNT).map(|j| column_stats(&rows, j)).collect();

    let standardized: Vec<[f64; FEATURE_COUNT]> = rows
        .iter()
        .map(|row| std::array::from_fn(|j| (row[j] - stats[j].0) / stats[j].1))
        .collect();

    let n = standardized.len() as f64;
    let mut w = [0.0; FEATURE_COUNT];
    let mut b = 0.0;

    for _ in 0..config.epochs {
        let mut grad_w = [0.0; FEATURE_COUNT];
        let mut grad_b = 0.0;

        for (x, y) in standardized.iter().zip(&labels) {
            let z = w.iter().zip(x).map(|(w, x)| w * x).sum::<f64>() + b;
            let error = sigmoid(z) - y;
            for (g, x) in grad_w.iter_mut().zip(x) {
                *g += error * x;
            }
            grad_b += error;
        }

        for (w, g) in w.iter_mut().zip(grad_w) {
            *w -= config.learning_rate * (g / n + config.l2 * *w);
        }
        b -= config.learning_rate * grad_b / n;
    }

    let mut weights = [0.0; FEATURE_COUNT];
    let mut bias = b;
    for j in 0..FEATURE_COUNT {
        let (mean, std) = stats[j];
        weights[j] = w[j] / std;
        bias -= w[j] * mean / std;
    }
    (weights, bias)
}

fn accuracy(model: &LogisticModel, samples: &[&Sample]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let correct = samples
        .iter()
        .filter(|s| model.predict_features(&s.features).prediction == s.label)
        .count();
    Some(correct as f64 / samples.len() as f64)
}

/// Fit a model on `dataset` and score it on the held-out rows
pub fn train(dataset: &Dataset, config: &TrainConfig) -> Result<TrainingReport, TrainError> {
    if dataset.is_empty() {
        return Err(TrainError::NoData);
    }

    let (train_set, test_set) = dataset.split(config.test_fraction, config.seed);
    tracing::info!(
        train_rows = train_set.len(),
        test_rows = test_set.len(),
        epochs = config.epochs,
        "Training logistic model"
    );

    let scaler = fit_scaler(&train_set);
    let (weights, bias) = fit_logistic(&train_set, &scaler, config);

    let artifact = ModelArtifact {
        name: config.name.clone(),
        weights: weights.to_vec(),
        bias,
        scaler,
    };
    let model = LogisticModel::from_artifact(artifact.clone())?;

    let train_accuracy = accuracy(&model, &train_set).unwrap_or_default();
    let test_accuracy = accuracy(&model, &test_set);
    tracing::info!(train_accuracy, ?test_accuracy, "Training finished");

    Ok(TrainingReport {
        artifact,
        train_rows: train_set.len(),
        test_rows: test_set.len(),
        skipped_rows: dataset.skipped_rows,
        filled_values: dataset.filled_values,
        train_accuracy,
        test_accuracy,
    })
}
