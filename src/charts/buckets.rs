//! Bucket Mapping
//!
//! Maps raw form values onto the fixed bucket labels of each chart.

use super::ChartSeries;

/// Education level used when no keyword matches.
///
/// Suspect: unmatched levels such as "Prof-school" or "11th" land on
/// Bachelor rather than being skipped.
pub const DEFAULT_EDUCATION_LEVEL: &str = "Bachelor";

/// Upper bounds (exclusive) of each age band, paired with its label
const AGE_BANDS: [(i64, &str); 7] = [
    (26, "20-25"),
    (31, "26-30"),
    (36, "31-35"),
    (41, "36-40"),
    (46, "41-45"),
    (51, "46-50"),
    (56, "51-55"),
];

const OLDEST_AGE_BAND: &str = "56-60";

/// Keyword → education level, checked in order
const EDUCATION_KEYWORDS: [(&str, &str); 6] = [
    ("HS", "High School"),
    ("High", "High School"),
    ("Some", "Some College"),
    ("Bach", "Bachelor"),
    ("Master", "Master"),
    ("Doc", "Doctorate"),
];

/// Index of the first department label containing the occupation, ignoring case
pub fn department_bucket(series: &ChartSeries, occupation: &str) -> Option<usize> {
    let needle = occupation.to_lowercase();
    series
        .labels()
        .position(|label| label.to_lowercase().contains(&needle))
}

/// Age band label for an age
pub fn age_bucket(age: i64) -> &'static str {
    AGE_BANDS
        .iter()
        .find(|(bound, _)| age < *bound)
        .map(|(_, label)| *label)
        .unwrap_or(OLDEST_AGE_BAND)
}

/// Education level label for an education string
pub fn education_bucket(education: &str) -> &'static str {
    EDUCATION_KEYWORDS
        .iter()
        .find(|(keyword, _)| education.contains(keyword))
        .map(|(_, level)| *level)
        .unwrap_or(DEFAULT_EDUCATION_LEVEL)
}
