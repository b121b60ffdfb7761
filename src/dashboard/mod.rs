//! Prediction Dashboard
//!
//! View model for the salary dashboard: owns the three charts, submits the
//! employee form to the prediction endpoint, renders the result panel and
//! animates the charts towards the predicted salary band.
//!
//! # Example
//!
//! ```rust,no_run
//! use paylens::charts::NullRenderer;
//! use paylens::client::{ClientConfig, PredictionClient};
//! use paylens::dashboard::{DashboardConfig, DashboardSession};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PredictionClient::new(ClientConfig::new("http://localhost:8082"))?;
//!     let session = DashboardSession::new(client, DashboardConfig::default(), Arc::new(NullRenderer));
//!
//!     let form: HashMap<&str, &str> = [("age", "37"), ("workclass", "Private")].into_iter().collect();
//!     let outcome = session.submit(&form).await;
//!     println!("{:?} {}", outcome, session.panel().await.result);
//!     Ok(())
//! }
//! ```

pub mod render;
pub mod session;

pub use render::{
    classify, render_confidence, render_error, render_loading, render_result, Classification,
    ResultPanel, HIGH_INCOME_LABEL, LOW_INCOME_LABEL,
};
pub use session::{DashboardSession, SubmitOutcome};

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::client::ClientError;
use crate::form::FormError;

/// Message shown for transport and decoding failures
pub const NETWORK_ERROR_MESSAGE: &str = "Unable to reach the prediction service. Please try again.";

/// Dashboard behaviour settings
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Salary the charts move to for a high income prediction
    #[serde(default = "default_high_salary")]
    pub high_salary: i64,

    /// Salary the charts move to for a low income prediction
    #[serde(default = "default_low_salary")]
    pub low_salary: i64,

    /// How long a chart cell takes to reach its new value
    #[serde(default = "default_animation_duration")]
    pub animation_duration_ms: u64,
}

fn default_high_salary() -> i64 {
    75_000
}

fn default_low_salary() -> i64 {
    45_000
}

fn default_animation_duration() -> u64 {
    1000
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            high_salary: default_high_salary(),
            low_salary: default_low_salary(),
            animation_duration_ms: default_animation_duration(),
        }
    }
}

impl DashboardConfig {
    /// Placeholder salary for a classification
    pub fn salary_for(&self, high_income: bool) -> i64 {
        if high_income {
            self.high_salary
        } else {
            self.low_salary
        }
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }
}

/// Everything that can go wrong during a submission.
///
/// None of these are fatal; each ends up as text in the result panel.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A required field was absent or empty
    #[error(transparent)]
    MissingField(#[from] FormError),

    /// The backend answered with a non-success status
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// The request failed or the response could not be read
    #[error("Network error: {0}")]
    Network(String),
}

impl From<ClientError> for DashboardError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Backend { status, message } => DashboardError::Backend { status, message },
            ClientError::Network(detail) => DashboardError::Network(detail),
        }
    }
}

impl DashboardError {
    /// Text shown to the user
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::MissingField(e) => e.to_string(),
            DashboardError::Backend { message, .. } => message.clone(),
            DashboardError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
        }
    }
}
