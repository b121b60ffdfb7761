//! Result Panel Rendering
//!
//! Markup written into the two display regions: the prediction result and
//! the confidence meter.

use serde::Serialize;

use crate::client::PredictionResult;

pub const HIGH_INCOME_LABEL: &str = ">$50K";
pub const LOW_INCOME_LABEL: &str = "≤$50K";

/// Predictions above this count as the high income band
const HIGH_INCOME_THRESHOLD: f64 = 0.5;

/// Contents of the result and confidence regions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultPanel {
    pub result: String,
    pub probability: String,
}

/// A prediction turned into display values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub high_income: bool,
    pub label: &'static str,
    /// Probability as a percentage with one decimal, e.g. "81.2"
    pub confidence: String,
}

/// Derive the income band and confidence text from a prediction
pub fn classify(result: &PredictionResult) -> Classification {
    let high_income = result.prediction > HIGH_INCOME_THRESHOLD;
    Classification {
        high_income,
        label: if high_income {
            HIGH_INCOME_LABEL
        } else {
            LOW_INCOME_LABEL
        },
        confidence: format_tenths(result.probability * 100.0),
    }
}

/// One decimal place, with exact ties rounded away from zero.
///
/// `{:.1}` breaks ties towards the even digit (81.25 becomes "81.2"); the
/// dashboard shows "81.3". A tie at the hundredths digit is only exact when
/// the value is an odd number of quarters, so those are rounded by hand.
pub fn format_tenths(value: f64) -> String {
    let quarters = value * 4.0;
    if value.is_finite() && quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        let tenths = (value.abs() * 10.0).ceil().copysign(value);
        return format!("{:.1}", tenths / 10.0);
    }
    format!("{:.1}", value)
}

pub fn render_loading() -> ResultPanel {
    ResultPanel {
        result: r#"<div class="loading-spinner"></div><div class="loading-text">Analyzing employee data...</div>"#
            .to_string(),
        probability: String::new(),
    }
}

pub fn render_result(c: &Classification) -> String {
    let class = if c.high_income {
        "prediction-high"
    } else {
        "prediction-low"
    };
    format!(
        r#"<div class="prediction-result {}">{}</div>"#,
        class,
        escape_html(c.label)
    )
}

pub fn render_confidence(c: &Classification) -> String {
    let bar = if c.high_income { "bg-success" } else { "bg-warning" };
    format!(
        concat!(
            r#"<div class="confidence-meter">"#,
            r#"<div class="confidence-label">Confidence:</div>"#,
            r#"<div class="progress" style="height: 20px;">"#,
            r#"<div class="progress-bar {bar}" role="progressbar" style="width: {pct}%" "#,
            r#"aria-valuenow="{pct}" aria-valuemin="0" aria-valuemax="100">{pct}%</div>"#,
            r#"</div></div>"#
        ),
        bar = bar,
        pct = c.confidence
    )
}

/// Error region markup; the message is shown exactly as given
pub fn render_error(message: &str) -> ResultPanel {
    ResultPanel {
        result: format!(r#"<div class="error-text">{}</div>"#, escape_html(message)),
        probability: String::new(),
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
