//! Prediction Route
//!
//! - POST /predict - Score one employee record

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::PredictResponse;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::form::FormRecord;

/// POST /predict
///
/// Body: the employee record with hyphenated keys
/// (`marital-status`, `capital-gain`, ...). Responds with the 0/1 label and
/// the probability of the high income band.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FormRecord>, JsonRejection>,
) -> ApiResult<Json<PredictResponse>> {
    let Json(record) = body.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

    tracing::debug!(
        age = record.age,
        occupation = %record.occupation,
        education = %record.education,
        "Received prediction request"
    );

    let prediction = state.predictor.predict(&record)?;

    tracing::info!(
        model = state.predictor.name(),
        prediction = prediction.prediction,
        probability = prediction.probability,
        "Prediction served"
    );

    Ok(Json(PredictResponse {
        prediction: prediction.prediction,
        probability: prediction.probability,
    }))
}
