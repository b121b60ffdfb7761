//! Employee Form Records
//!
//! Collects the employee attributes submitted to the prediction endpoint.
//! Values are read from a [`FieldSource`] (a page's form elements, CLI
//! arguments, or a plain map in tests) and validated before any request
//! is made.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Every field identifier, in submission order
pub const FIELD_IDS: [&str; 11] = [
    "age",
    "workclass",
    "education",
    "marital-status",
    "occupation",
    "relationship",
    "race",
    "gender",
    "capital-gain",
    "capital-loss",
    "hours-per-week",
];

/// Fields that hold integers
pub const NUMERIC_FIELDS: [&str; 4] = ["age", "capital-gain", "capital-loss", "hours-per-week"];

/// Fields that must be present and non-empty (non-zero for numbers)
pub const REQUIRED_FIELDS: [&str; 5] = ["age", "workclass", "education", "occupation", "hours-per-week"];

/// Source of raw form values keyed by field identifier.
///
/// `None` means the backing element does not exist at all, which is
/// different from an element holding an empty string.
pub trait FieldSource {
    fn field(&self, id: &str) -> Option<String>;
}

impl FieldSource for HashMap<String, String> {
    fn field(&self, id: &str) -> Option<String> {
        self.get(id).cloned()
    }
}

impl FieldSource for HashMap<&str, &str> {
    fn field(&self, id: &str) -> Option<String> {
        self.get(id).map(|v| v.to_string())
    }
}

/// A single form value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Text(String),
}

impl FieldValue {
    /// Whether the value counts as "not filled in"
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Int(n) => *n == 0,
            FieldValue::Text(s) => s.is_empty(),
        }
    }
}

/// Employee attributes sent to `POST /predict`.
///
/// Serializes with the exact wire key names, hyphens included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRecord {
    pub age: i64,
    pub workclass: String,
    pub education: String,
    #[serde(rename = "marital-status")]
    pub marital_status: String,
    pub occupation: String,
    pub relationship: String,
    pub race: String,
    pub gender: String,
    #[serde(rename = "capital-gain")]
    pub capital_gain: i64,
    #[serde(rename = "capital-loss")]
    pub capital_loss: i64,
    #[serde(rename = "hours-per-week")]
    pub hours_per_week: i64,
}

impl FormRecord {
    /// Read every field from the source.
    ///
    /// Fails on the first field whose element is absent. Numeric fields
    /// that cannot be parsed become `0`.
    pub fn collect(source: &impl FieldSource) -> Result<Self, FormError> {
        let text = |id: &str| -> Result<String, FormError> {
            source
                .field(id)
                .ok_or_else(|| FormError::MissingElement(id.to_string()))
        };
        let int = |id: &str| -> Result<i64, FormError> { Ok(parse_int_or_zero(&text(id)?)) };

        Ok(Self {
            age: int("age")?,
            workclass: text("workclass")?,
            education: text("education")?,
            marital_status: text("marital-status")?,
            occupation: text("occupation")?,
            relationship: text("relationship")?,
            race: text("race")?,
            gender: text("gender")?,
            capital_gain: int("capital-gain")?,
            capital_loss: int("capital-loss")?,
            hours_per_week: int("hours-per-week")?,
        })
    }

    /// Collect and validate in one step
    pub fn from_source(source: &impl FieldSource) -> Result<Self, FormError> {
        let record = Self::collect(source)?;
        record.validate()?;
        Ok(record)
    }

    /// Check that every required field is filled in
    pub fn validate(&self) -> Result<(), FormError> {
        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|id| self.get(id).map(|v| v.is_blank()).unwrap_or(true))
            .map(|id| id.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(FormError::Required(missing))
        }
    }

    /// Look up a field by its wire name
    pub fn get(&self, id: &str) -> Option<FieldValue> {
        let value = match id {
            "age" => FieldValue::Int(self.age),
            "workclass" => FieldValue::Text(self.workclass.clone()),
            "education" => FieldValue::Text(self.education.clone()),
            "marital-status" => FieldValue::Text(self.marital_status.clone()),
            "occupation" => FieldValue::Text(self.occupation.clone()),
            "relationship" => FieldValue::Text(self.relationship.clone()),
            "race" => FieldValue::Text(self.race.clone()),
            "gender" => FieldValue::Text(self.gender.clone()),
            "capital-gain" => FieldValue::Int(self.capital_gain),
            "capital-loss" => FieldValue::Int(self.capital_loss),
            "hours-per-week" => FieldValue::Int(self.hours_per_week),
            _ => return None,
        };
        Some(value)
    }
}

/// Parse the leading integer of a string, or return 0.
///
/// Accepts leading whitespace and a sign, then reads digits until the
/// first non-digit: `"42 years"` is 42, `"3.9"` is 3, `"abc"` is 0.
/// Digit runs too long for `i64` saturate instead of becoming 0.
pub fn parse_int_or_zero(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    let digits = &digits[..end];
    if digits.is_empty() {
        return 0;
    }

    // Only overflow can fail here
    match digits.parse::<i64>() {
        Ok(n) if negative => -n,
        Ok(n) => n,
        Err(_) if negative => i64::MIN,
        Err(_) => i64::MAX,
    }
}

/// Form collection and validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// The element backing a field does not exist
    #[error("Missing field: {0}")]
    MissingElement(String),

    /// Required fields were left empty
    #[error("Please fill in: {}", .0.join(", "))]
    Required(Vec<String>),
}

impl FormError {
    /// Names of the fields this error is about
    pub fn fields(&self) -> Vec<String> {
        match self {
            FormError::MissingElement(id) => vec![id.clone()],
            FormError::Required(ids) => ids.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_form() -> HashMap<String, String> {
        [
            ("age", "37"),
            ("workclass", "Private"),
            ("education", "Masters"),
            ("marital-status", "Married-civ-spouse"),
            ("occupation", "Sales"),
            ("relationship", "Husband"),
            ("race", "White"),
            ("gender", "Male"),
            ("capital-gain", "0"),
            ("capital-loss", ""),
            ("hours-per-week", "45"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_collect_complete_form() {
        let record = FormRecord::from_source(&complete_form()).unwrap();
        assert_eq!(record.age, 37);
        assert_eq!(record.education, "Masters");
        assert_eq!(record.capital_loss, 0);
        assert_eq!(record.hours_per_week, 45);
    }

    #[test]
    fn test_parse_int_or_zero() {
        assert_eq!(parse_int_or_zero("42"), 42);
        assert_eq!(parse_int_or_zero("  42 years"), 42);
        assert_eq!(parse_int_or_zero("3.9"), 3);
        assert_eq!(parse_int_or_zero("-15"), -15);
        assert_eq!(parse_int_or_zero(""), 0);
        assert_eq!(parse_int_or_zero("abc"), 0);
        assert_eq!(parse_int_or_zero("-"), 0);
    }

    #[test]
    fn test_oversized_numbers_saturate() {
        assert_eq!(parse_int_or_zero("99999999999999999999"), i64::MAX);
        assert_eq!(parse_int_or_zero("-99999999999999999999"), i64::MIN);
        assert_eq!(parse_int_or_zero("-9223372036854775808"), i64::MIN);

        let mut form = complete_form();
        form.insert("age".to_string(), "99999999999999999999".to_string());
        let record = FormRecord::from_source(&form).unwrap();
        assert_eq!(record.age, i64::MAX);
    }

    #[test]
    fn test_missing_element() {
        let mut form = complete_form();
        form.remove("race");

        let err = FormRecord::collect(&form).unwrap_err();
        assert_eq!(err, FormError::MissingElement("race".to_string()));
        assert_eq!(err.to_string(), "Missing field: race");
    }

    #[test]
    fn test_all_required_fields_empty() {
        let mut form = complete_form();
        for id in REQUIRED_FIELDS {
            form.insert(id.to_string(), String::new());
        }

        let err = FormRecord::from_source(&form).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please fill in: age, workclass, education, occupation, hours-per-week"
        );
        assert_eq!(err.fields().len(), 5);
    }

    #[test]
    fn test_zero_and_garbage_numbers_count_as_missing() {
        let mut form = complete_form();
        form.insert("age".to_string(), "0".to_string());
        form.insert("hours-per-week".to_string(), "lots".to_string());

        let err = FormRecord::from_source(&form).unwrap_err();
        assert_eq!(
            err,
            FormError::Required(vec!["age".to_string(), "hours-per-week".to_string()])
        );
    }

    #[test]
    fn test_optional_fields_may_be_empty() {
        let mut form = complete_form();
        form.insert("race".to_string(), String::new());
        form.insert("capital-gain".to_string(), String::new());

        assert!(FormRecord::from_source(&form).is_ok());
    }

    #[test]
    fn test_wire_field_names() {
        let record = FormRecord::from_source(&complete_form()).unwrap();
        let json = serde_json::to_value(&record).unwrap();

        for id in FIELD_IDS {
            assert!(json.get(id).is_some(), "missing key {}", id);
        }
        assert_eq!(json["hours-per-week"], 45);
        assert_eq!(json["marital-status"], "Married-civ-spouse");
    }
}
