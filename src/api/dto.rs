//! Data Transfer Objects
//!
//! Response types for the API endpoints. The prediction request body is a
//! [`FormRecord`](crate::form::FormRecord).

use serde::{Deserialize, Serialize};

/// Prediction response
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    /// 1 for the high income band, 0 otherwise
    pub prediction: u8,
    /// Probability of the high income band
    pub probability: f64,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: healthy
    pub status: String,
    /// Name of the loaded model
    pub model: String,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
