//! Dashboard Session
//!
//! Owns the chart handles and the result panel, and runs the submit flow.
//! Every submission takes a generation token; a response is only applied
//! when its token is still the newest one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use super::render::{
    classify, render_confidence, render_error, render_loading, render_result, Classification,
    ResultPanel,
};
use super::{DashboardConfig, DashboardError};
use crate::animation::spawn_cell_animation;
use crate::charts::{
    age_bucket, department_bucket, education_bucket, Chart, ChartHandle, ChartKind, ChartRenderer,
    ChartSeries,
};
use crate::client::{PredictionClient, PredictionResult};
use crate::form::{FieldSource, FormRecord};

/// What happened to a submission
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The prediction was shown and the charts updated
    Applied(Classification),
    /// The submission failed; the error was shown
    Failed(DashboardError),
    /// A newer submission started before this one finished; nothing was shown
    Superseded { token: u64, latest: u64 },
}

struct CellAnimation {
    target: i64,
    handle: JoinHandle<u64>,
}

/// Dashboard view model
pub struct DashboardSession {
    charts: HashMap<ChartKind, ChartHandle>,
    client: PredictionClient,
    config: DashboardConfig,
    panel: RwLock<ResultPanel>,
    generation: AtomicU64,
    animations: Mutex<HashMap<(ChartKind, usize), CellAnimation>>,
}

impl DashboardSession {
    /// Create a session with freshly seeded charts
    pub fn new(
        client: PredictionClient,
        config: DashboardConfig,
        renderer: Arc<dyn ChartRenderer>,
    ) -> Self {
        let charts = ChartKind::ALL
            .into_iter()
            .map(|kind| (kind, Chart::seeded(kind, Arc::clone(&renderer)).into_handle()))
            .collect();

        Self {
            charts,
            client,
            config,
            panel: RwLock::new(ResultPanel::default()),
            generation: AtomicU64::new(0),
            animations: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Shared handle to one of the charts
    pub fn chart(&self, kind: ChartKind) -> ChartHandle {
        // Every kind is inserted in `new`
        Arc::clone(&self.charts[&kind])
    }

    /// Current values of a chart
    pub async fn series(&self, kind: ChartKind) -> ChartSeries {
        self.chart(kind).read().await.series().clone()
    }

    /// Current contents of the result panel
    pub async fn panel(&self) -> ResultPanel {
        self.panel.read().await.clone()
    }

    /// Token of the most recent submission
    pub fn latest_token(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn next_token(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Submit the form held by `source`.
    ///
    /// Validation failures are shown without contacting the backend.
    pub async fn submit(&self, source: &(impl FieldSource + Sync)) -> SubmitOutcome {
        let token = self.next_token();
        *self.panel.write().await = render_loading();

        let record = match FormRecord::from_source(source) {
            Ok(record) => record,
            Err(e) => return self.finish(token, Err(e.into())).await,
        };

        tracing::debug!(token, occupation = %record.occupation, "Submitting prediction request");
        let response = self.client.predict(&record).await.map_err(DashboardError::from);

        self.finish(token, response.map(|result| (record, result))).await
    }

    async fn finish(
        &self,
        token: u64,
        outcome: Result<(FormRecord, PredictionResult), DashboardError>,
    ) -> SubmitOutcome {
        let latest = self.latest_token();
        if token != latest {
            tracing::debug!(token, latest, "Discarding stale prediction response");
            return SubmitOutcome::Superseded { token, latest };
        }

        match outcome {
            Ok((record, result)) => {
                let classification = classify(&result);
                *self.panel.write().await = ResultPanel {
                    result: render_result(&classification),
                    probability: render_confidence(&classification),
                };

                tracing::info!(
                    token,
                    label = classification.label,
                    confidence = %classification.confidence,
                    "Prediction applied"
                );

                let salary = self.config.salary_for(classification.high_income);
                self.update_department(&record.occupation, salary).await;
                self.update_age(record.age, salary).await;
                self.update_education(&record.education, salary).await;

                SubmitOutcome::Applied(classification)
            }
            Err(e) => {
                tracing::error!(token, "Prediction error: {}", e);
                *self.panel.write().await = render_error(&e.user_message());
                SubmitOutcome::Failed(e)
            }
        }
    }

    /// Animate the department matching `occupation`, if any
    pub async fn update_department(&self, occupation: &str, salary: i64) -> Option<usize> {
        let index = {
            let chart = self.charts[&ChartKind::Department].read().await;
            department_bucket(chart.series(), occupation)
        };

        match index {
            Some(index) => {
                self.animate_cell(ChartKind::Department, index, salary).await;
                Some(index)
            }
            None => {
                tracing::debug!(occupation, "No department bucket for occupation");
                None
            }
        }
    }

    /// Animate the age band containing `age`
    pub async fn update_age(&self, age: i64, salary: i64) -> Option<usize> {
        self.update_labelled(ChartKind::Age, age_bucket(age), salary).await
    }

    /// Animate the education level matching `education`
    pub async fn update_education(&self, education: &str, salary: i64) -> Option<usize> {
        self.update_labelled(ChartKind::Education, education_bucket(education), salary)
            .await
    }

    async fn update_labelled(&self, kind: ChartKind, label: &str, salary: i64) -> Option<usize> {
        let index = self.charts[&kind].read().await.index_of(label)?;
        self.animate_cell(kind, index, salary).await;
        Some(index)
    }

    /// Start animating one cell, replacing any animation already running on it
    async fn animate_cell(&self, kind: ChartKind, index: usize, target: i64) {
        let mut running = self.animations.lock().await;
        if let Some(previous) = running.remove(&(kind, index)) {
            previous.handle.abort();
        }

        let chart = self.chart(kind);
        match spawn_cell_animation(chart, index, target, self.config.animation_duration()).await {
            Ok(Some(handle)) => {
                running.insert((kind, index), CellAnimation { target, handle });
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(chart = %kind, "Could not animate cell: {}", e),
        }
    }

    /// Number of cell animations that have not finished
    pub async fn running_animations(&self) -> usize {
        self.animations
            .lock()
            .await
            .values()
            .filter(|a| !a.handle.is_finished())
            .count()
    }

    /// Wait for every running animation to reach its target
    pub async fn settle(&self) {
        let running: Vec<_> = self.animations.lock().await.drain().collect();
        for ((kind, index), animation) in running {
            if let Err(e) = animation.handle.await {
                if !e.is_cancelled() {
                    tracing::warn!(chart = %kind, index, "Animation task failed: {}", e);
                }
            }
        }
    }

    /// Stop every running animation and jump its cell to the target value
    pub async fn fast_forward(&self) {
        let running: Vec<_> = self.animations.lock().await.drain().collect();
        for ((kind, index), animation) in running {
            animation.handle.abort();
            let _ = animation.handle.await;
            if let Err(e) = self.chart(kind).write().await.set_value(index, animation.target) {
                tracing::warn!(chart = %kind, "Could not finish animation: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::NullRenderer;
    use crate::client::ClientConfig;
    use crate::dashboard::{HIGH_INCOME_LABEL, LOW_INCOME_LABEL};
    use axum::{http::StatusCode, routing::post, Json, Router};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn form(age: &str, occupation: &str, education: &str) -> HashMap<String, String> {
        [
            ("age", age),
            ("workclass", "Private"),
            ("education", education),
            ("marital-status", "Never-married"),
            ("occupation", occupation),
            ("relationship", "Not-in-family"),
            ("race", "White"),
            ("gender", "Female"),
            ("capital-gain", "0"),
            ("capital-loss", "0"),
            ("hours-per-week", "40"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn offline_session() -> DashboardSession {
        // Nothing listens on port 9 locally
        let client = PredictionClient::new(ClientConfig::new("http://127.0.0.1:9")).unwrap();
        DashboardSession::new(client, DashboardConfig::default(), Arc::new(NullRenderer))
    }

    async fn session_with_backend(router: Router) -> DashboardSession {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = PredictionClient::new(ClientConfig::new(format!("http://{}", addr))).unwrap();
        DashboardSession::new(client, DashboardConfig::default(), Arc::new(NullRenderer))
    }

    #[tokio::test]
    async fn test_missing_fields_skip_network() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let router = Router::new().route(
            "/predict",
            post(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Json(serde_json::json!({"prediction": 1, "probability": 0.9})) }
            }),
        );
        let session = session_with_backend(router).await;

        let mut fields = form("", "", "");
        fields.insert("workclass".to_string(), String::new());
        fields.insert("hours-per-week".to_string(), String::new());

        match session.submit(&fields).await {
            SubmitOutcome::Failed(DashboardError::MissingField(e)) => {
                assert_eq!(
                    e.to_string(),
                    "Please fill in: age, workclass, education, occupation, hours-per-week"
                );
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let panel = session.panel().await;
        assert!(panel.result.contains("Please fill in: age, workclass"));
        assert!(panel.probability.is_empty());
    }

    #[tokio::test]
    async fn test_high_income_prediction_updates_panel_and_charts() {
        let router = Router::new().route(
            "/predict",
            post(|| async { Json(serde_json::json!({"prediction": 0.73, "probability": 0.812})) }),
        );
        let session = session_with_backend(router).await;

        match session.submit(&form("37", "Sales", "Masters")).await {
            SubmitOutcome::Applied(c) => {
                assert_eq!(c.label, HIGH_INCOME_LABEL);
                assert_eq!(c.confidence, "81.2");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let panel = session.panel().await;
        assert!(panel.result.contains("prediction-high"));
        assert!(panel.probability.contains("81.2%"));

        // Sales, 36-40 and Master all move towards 75000
        assert_eq!(session.running_animations().await, 3);
        session.fast_forward().await;

        assert_eq!(session.series(ChartKind::Department).await.value(3), Some(75000));
        assert_eq!(session.series(ChartKind::Age).await.value(3), Some(75000));
        assert_eq!(session.series(ChartKind::Education).await.value(3), Some(75000));
        assert_eq!(session.running_animations().await, 0);
    }

    #[tokio::test]
    async fn test_low_income_prediction() {
        let router = Router::new().route(
            "/predict",
            post(|| async { Json(serde_json::json!({"prediction": 0.2, "probability": 0.35})) }),
        );
        let session = session_with_backend(router).await;

        match session.submit(&form("24", "Tech-support", "HS-grad")).await {
            SubmitOutcome::Applied(c) => {
                assert_eq!(c.label, LOW_INCOME_LABEL);
                assert_eq!(c.confidence, "35.0");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        // Tech-support has no department; 20-25 already sits at 45000
        assert_eq!(session.running_animations().await, 1);
        session.fast_forward().await;
        assert_eq!(session.series(ChartKind::Education).await.value(0), Some(45000));
        assert_eq!(
            session.series(ChartKind::Department).await.values(),
            vec![72000, 58000, 68000, 62000, 78000, 52000, 65000]
        );
    }

    #[tokio::test]
    async fn test_backend_error_message_shown() {
        let router = Router::new().route(
            "/predict",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"message": "Unknown workclass 'Pirate'"})),
                )
            }),
        );
        let session = session_with_backend(router).await;

        let outcome = session.submit(&form("37", "Sales", "Masters")).await;
        assert!(matches!(
            outcome,
            SubmitOutcome::Failed(DashboardError::Backend { status: 400, .. })
        ));

        let panel = session.panel().await;
        assert!(panel.result.contains("Unknown workclass &#39;Pirate&#39;"));
        assert_eq!(session.running_animations().await, 0);
    }

    #[tokio::test]
    async fn test_network_error_shows_generic_message() {
        let session = offline_session();

        let outcome = session.submit(&form("37", "Sales", "Masters")).await;
        assert!(matches!(outcome, SubmitOutcome::Failed(DashboardError::Network(_))));
        assert!(session
            .panel()
            .await
            .result
            .contains("Unable to reach the prediction service"));
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let router = Router::new().route(
            "/predict",
            post(|Json(body): Json<serde_json::Value>| async move {
                if body["age"] == 30 {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Json(serde_json::json!({"prediction": 1, "probability": 0.9}))
                } else {
                    Json(serde_json::json!({"prediction": 0, "probability": 0.1}))
                }
            }),
        );
        let session = session_with_backend(router).await;

        let slow = form("30", "Sales", "Masters");
        let fast = form("40", "Sales", "Masters");
        let (first, second) = tokio::join!(session.submit(&slow), session.submit(&fast));

        assert!(matches!(first, SubmitOutcome::Superseded { token: 1, latest: 2 }));
        match second {
            SubmitOutcome::Applied(c) => assert_eq!(c.label, LOW_INCOME_LABEL),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(session.panel().await.result.contains("prediction-low"));
        assert_eq!(session.latest_token(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chart_updates_settle_on_target() {
        let session = offline_session();

        assert_eq!(session.update_age(25, 45010).await, Some(0));
        assert_eq!(session.update_education("Unknown-value", 68005).await, Some(2));
        assert_eq!(session.update_department("Craft-repair", 45010).await, None);
        session.settle().await;

        assert_eq!(session.series(ChartKind::Age).await.value(0), Some(45010));
        assert_eq!(session.series(ChartKind::Education).await.value(2), Some(68005));
        assert_eq!(session.chart(ChartKind::Age).read().await.redraws(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_animation_replaces_running_one() {
        let session = offline_session();

        session.update_age(25, 45100).await;
        tokio::time::sleep(Duration::from_millis(25)).await;
        session.update_age(25, 44990).await;
        session.settle().await;

        assert_eq!(session.series(ChartKind::Age).await.value(0), Some(44990));
    }
}
