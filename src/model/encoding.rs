//! Feature Encoding
//!
//! Turns a form record into the numeric feature vector the model expects:
//! categorical fields are label-encoded against fixed vocabularies, and the
//! education level also yields an ordinal education number.

use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::form::FormRecord;

/// Feature names in vector order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "workclass",
    "education",
    "educational-num",
    "marital-status",
    "occupation",
    "relationship",
    "race",
    "gender",
    "capital-gain",
    "capital-loss",
    "hours-per-week",
];

pub const FEATURE_COUNT: usize = 12;

/// Positions of the features that are standardized
pub const SCALED_FEATURES: [usize; 5] = [0, 3, 9, 10, 11];

/// Education number for levels missing from the table
pub const DEFAULT_EDUCATION_NUM: i64 = 9;

const EDUCATION_NUM: [(&str, i64); 16] = [
    ("Preschool", 1),
    ("1st-4th", 2),
    ("5th-6th", 3),
    ("7th-8th", 4),
    ("9th", 5),
    ("10th", 6),
    ("11th", 7),
    ("12th", 8),
    ("HS-grad", 9),
    ("Some-college", 10),
    ("Assoc-voc", 11),
    ("Assoc-acdm", 12),
    ("Bachelors", 13),
    ("Masters", 14),
    ("Prof-school", 15),
    ("Doctorate", 16),
];

/// Known values of one categorical field
#[derive(Debug, Clone, Copy)]
pub struct Vocabulary {
    pub field: &'static str,
    pub values: &'static [&'static str],
}

pub const WORKCLASS: Vocabulary = Vocabulary {
    field: "workclass",
    values: &[
        "Private",
        "Self-emp-not-inc",
        "Self-emp-inc",
        "Federal-gov",
        "Local-gov",
        "State-gov",
    ],
};

pub const EDUCATION: Vocabulary = Vocabulary {
    field: "education",
    values: &[
        "Bachelors",
        "Some-college",
        "11th",
        "HS-grad",
        "Prof-school",
        "Assoc-acdm",
        "Assoc-voc",
        "9th",
        "7th-8th",
        "12th",
        "Masters",
        "1st-4th",
        "10th",
        "Doctorate",
        "5th-6th",
        "Preschool",
    ],
};

pub const MARITAL_STATUS: Vocabulary = Vocabulary {
    field: "marital-status",
    values: &[
        "Married-civ-spouse",
        "Divorced",
        "Never-married",
        "Separated",
        "Widowed",
        "Married-spouse-absent",
        "Married-AF-spouse",
    ],
};

pub const OCCUPATION: Vocabulary = Vocabulary {
    field: "occupation",
    values: &[
        "Tech-support",
        "Craft-repair",
        "Other-service",
        "Sales",
        "Exec-managerial",
        "Prof-specialty",
        "Handlers-cleaners",
        "Machine-op-inspct",
        "Adm-clerical",
        "Farming-fishing",
        "Transport-moving",
        "Priv-house-serv",
        "Protective-serv",
        "Armed-Forces",
    ],
};

pub const RELATIONSHIP: Vocabulary = Vocabulary {
    field: "relationship",
    values: &[
        "Wife",
        "Own-child",
        "Husband",
        "Not-in-family",
        "Other-relative",
        "Unmarried",
    ],
};

pub const RACE: Vocabulary = Vocabulary {
    field: "race",
    values: &["White", "Asian-Pac-Islander", "Amer-Indian-Eskimo", "Other", "Black"],
};

pub const GENDER: Vocabulary = Vocabulary {
    field: "gender",
    values: &["Male", "Female"],
};

impl Vocabulary {
    /// Code of a value: its position in the sorted vocabulary
    pub fn encode(&self, value: &str) -> Result<i64, ModelError> {
        if !self.values.contains(&value) {
            return Err(ModelError::UnknownCategory {
                field: self.field.to_string(),
                value: value.to_string(),
            });
        }
        let code = self.values.iter().filter(|v| **v < value).count();
        Ok(code as i64)
    }
}

/// Ordinal education number, or [`DEFAULT_EDUCATION_NUM`] when unknown
pub fn education_num(education: &str) -> i64 {
    EDUCATION_NUM
        .iter()
        .find(|(level, _)| *level == education)
        .map(|(_, num)| *num)
        .unwrap_or(DEFAULT_EDUCATION_NUM)
}

/// Encoded but not yet standardized features
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn encode(record: &FormRecord) -> Result<Self, ModelError> {
        Ok(Self([
            record.age as f64,
            WORKCLASS.encode(&record.workclass)? as f64,
            EDUCATION.encode(&record.education)? as f64,
            education_num(&record.education) as f64,
            MARITAL_STATUS.encode(&record.marital_status)? as f64,
            OCCUPATION.encode(&record.occupation)? as f64,
            RELATIONSHIP.encode(&record.relationship)? as f64,
            RACE.encode(&record.race)? as f64,
            GENDER.encode(&record.gender)? as f64,
            record.capital_gain as f64,
            record.capital_loss as f64,
            record.hours_per_week as f64,
        ]))
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.0[i])
    }
}

/// Standardizes the numeric features: `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: [f64; SCALED_FEATURES.len()],
    pub scale: [f64; SCALED_FEATURES.len()],
}

impl StandardScaler {
    /// Check that every scale is usable as a divisor
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(ModelError::InvalidArtifact(
                "scaler scale must be finite and non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn transform(&self, features: &FeatureVector) -> FeatureVector {
        let mut out = *features;
        for (slot, &feature) in SCALED_FEATURES.iter().enumerate() {
            out.0[feature] = (features.0[feature] - self.mean[slot]) / self.scale[slot];
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(education: &str, workclass: &str) -> FormRecord {
        FormRecord {
            age: 37,
            workclass: workclass.to_string(),
            education: education.to_string(),
            marital_status: "Never-married".to_string(),
            occupation: "Sales".to_string(),
            relationship: "Not-in-family".to_string(),
            race: "White".to_string(),
            gender: "Female".to_string(),
            capital_gain: 0,
            capital_loss: 0,
            hours_per_week: 40,
        }
    }

    #[test]
    fn test_codes_follow_sorted_order() {
        // Sorted: Federal-gov, Local-gov, Private, Self-emp-inc, Self-emp-not-inc, State-gov
        assert_eq!(WORKCLASS.encode("Federal-gov").unwrap(), 0);
        assert_eq!(WORKCLASS.encode("Private").unwrap(), 2);
        assert_eq!(WORKCLASS.encode("State-gov").unwrap(), 5);
        assert_eq!(GENDER.encode("Female").unwrap(), 0);
        assert_eq!(GENDER.encode("Male").unwrap(), 1);
        // Digits sort before letters
        assert_eq!(EDUCATION.encode("10th").unwrap(), 0);
    }

    #[test]
    fn test_unknown_category() {
        let err = WORKCLASS.encode("Pirate").unwrap_err();
        assert_eq!(err.to_string(), "Unknown value 'Pirate' for field 'workclass'");
    }

    #[test]
    fn test_education_num() {
        assert_eq!(education_num("Preschool"), 1);
        assert_eq!(education_num("Masters"), 14);
        assert_eq!(education_num("Doctorate"), 16);
        assert_eq!(education_num("Unheard-of"), DEFAULT_EDUCATION_NUM);
    }

    #[test]
    fn test_encode_record() {
        let features = FeatureVector::encode(&record("Masters", "Private")).unwrap();
        assert_eq!(features.get("age"), Some(37.0));
        assert_eq!(features.get("educational-num"), Some(14.0));
        assert_eq!(features.get("workclass"), Some(2.0));
        assert_eq!(features.get("hours-per-week"), Some(40.0));
        assert_eq!(features.get("salary"), None);
    }

    #[test]
    fn test_encode_rejects_unknown_education() {
        assert!(FeatureVector::encode(&record("Kindergarten", "Private")).is_err());
    }

    #[test]
    fn test_scaler_only_touches_numeric_features() {
        let scaler = StandardScaler {
            mean: [30.0, 10.0, 0.0, 0.0, 40.0],
            scale: [10.0, 2.0, 1.0, 1.0, 5.0],
        };
        let features = FeatureVector::encode(&record("Masters", "Private")).unwrap();
        let scaled = scaler.transform(&features);

        assert_eq!(scaled.get("age"), Some(0.7));
        assert_eq!(scaled.get("educational-num"), Some(2.0));
        assert_eq!(scaled.get("hours-per-week"), Some(0.0));
        assert_eq!(scaled.get("workclass"), Some(2.0));
    }
}
