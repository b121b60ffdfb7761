//! Prediction REST Client
//!
//! HTTP client for the prediction endpoint.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::form::FormRecord;

/// Message shown when a failed response carries no usable `message`
pub const GENERIC_BACKEND_MESSAGE: &str = "Prediction service unavailable";

/// Prediction endpoint client
pub struct PredictionClient {
    client: Client,
    config: ClientConfig,
}

/// Configuration for the prediction client
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the backend (e.g., "http://localhost:8082")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the prediction endpoint
    #[serde(default = "default_predict_path")]
    pub predict_path: String,
    /// Request timeout in milliseconds, 0 for none
    #[serde(default)]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8082".to_string()
}

fn default_predict_path() -> String {
    "/predict".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            predict_path: default_predict_path(),
            request_timeout_ms: 0,
        }
    }
}

impl ClientConfig {
    /// Config pointing at the given base URL with default path and timeout
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Full URL of the prediction endpoint
    pub fn predict_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.predict_path
        )
    }
}

/// Body of a successful prediction response
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted class; anything above 0.5 means the high income band
    pub prediction: f64,
    /// Probability of the high income band, in [0, 1]
    pub probability: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl PredictionClient {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if config.request_timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.request_timeout_ms));
        }
        let client = builder.build().map_err(ClientError::from_transport)?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Check that the backend is reachable
    pub async fn health_check(&self) -> Result<(), ClientError> {
        let url = format!("{}/health/live", self.config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::Backend {
                status: response.status().as_u16(),
                message: GENERIC_BACKEND_MESSAGE.to_string(),
            })
        }
    }

    /// Submit a record and return the backend's prediction
    pub async fn predict(&self, record: &FormRecord) -> Result<PredictionResult, ClientError> {
        let url = self.config.predict_url();
        tracing::debug!(url = %url, "Sending prediction request");

        let response = self
            .client
            .post(&url)
            .json(record)
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::Backend {
                status: status.as_u16(),
                message: extract_error_message(&text),
            });
        }

        let bytes = response.bytes().await.map_err(ClientError::from_transport)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Network(format!("Invalid prediction response: {}", e)))
    }
}

/// Pull the `message` field out of an error body, or fall back to the generic text
pub fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| GENERIC_BACKEND_MESSAGE.to_string())
}

// ============================================
// Errors
// ============================================

/// Errors that can occur when calling the prediction endpoint
#[derive(Error, Debug)]
pub enum ClientError {
    /// Non-success response
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// Transport or decoding failure
    #[error("Network error: {0}")]
    Network(String),
}

impl ClientError {
    fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Network("Request timeout".to_string())
        } else if e.is_connect() {
            ClientError::Network("Prediction service unreachable".to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use std::collections::HashMap;

    fn sample_record() -> FormRecord {
        let form: HashMap<&str, &str> = [
            ("age", "37"),
            ("workclass", "Private"),
            ("education", "Bachelors"),
            ("marital-status", "Never-married"),
            ("occupation", "Sales"),
            ("relationship", "Not-in-family"),
            ("race", "White"),
            ("gender", "Female"),
            ("capital-gain", "0"),
            ("capital-loss", "0"),
            ("hours-per-week", "40"),
        ]
        .into_iter()
        .collect();
        FormRecord::from_source(&form).unwrap()
    }

    async fn spawn_backend(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.predict_url(), "http://localhost:8082/predict");
        assert_eq!(config.request_timeout_ms, 0);
    }

    #[test]
    fn test_predict_url_trims_slash() {
        let config = ClientConfig::new("http://example.test/");
        assert_eq!(config.predict_url(), "http://example.test/predict");
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(extract_error_message(r#"{"message": "Bad age"}"#), "Bad age");
        assert_eq!(
            extract_error_message(r#"{"error": "boom"}"#),
            GENERIC_BACKEND_MESSAGE
        );
        assert_eq!(extract_error_message("<html>"), GENERIC_BACKEND_MESSAGE);
    }

    #[tokio::test]
    async fn test_predict_success_sends_wire_names() {
        let router = Router::new().route(
            "/predict",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["hours-per-week"], 40);
                assert_eq!(body["marital-status"], "Never-married");
                Json(serde_json::json!({"prediction": 1, "probability": 0.73}))
            }),
        );
        let base = spawn_backend(router).await;

        let client = PredictionClient::new(ClientConfig::new(base)).unwrap();
        let result = client.predict(&sample_record()).await.unwrap();
        assert_eq!(result.prediction, 1.0);
        assert_eq!(result.probability, 0.73);
    }

    #[tokio::test]
    async fn test_predict_backend_error_message() {
        let router = Router::new().route(
            "/predict",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"message": "Unknown workclass"})),
                )
            }),
        );
        let base = spawn_backend(router).await;

        let client = PredictionClient::new(ClientConfig::new(base)).unwrap();
        match client.predict(&sample_record()).await {
            Err(ClientError::Backend { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Unknown workclass");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_predict_malformed_success_body() {
        let router = Router::new().route("/predict", post(|| async { "not json" }));
        let base = spawn_backend(router).await;

        let client = PredictionClient::new(ClientConfig::new(base)).unwrap();
        let err = client.predict(&sample_record()).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }

    #[tokio::test]
    async fn test_predict_unreachable() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = PredictionClient::new(ClientConfig::new(format!("http://{}", addr))).unwrap();
        let err = client.predict(&sample_record()).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }
}
