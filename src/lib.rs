//! # Paylens
//!
//! Salary band prediction dashboard: a prediction backend, a dashboard core that
//! submits employee records to it, and animated salary charts.
//!
//! ## Features
//!
//! - **Form handling**: collects and validates an employee record from any field source
//! - **Prediction backend**: Axum service scoring records with a logistic model
//! - **Charts**: department, age band and education level salary charts
//! - **Animation**: cell values step towards their targets on a tokio timer
//! - **Training**: fits a model artifact from adult census CSV data
//! - **Stale response protection**: only the newest submission updates the dashboard
//!
//! ## Modules
//!
//! - [`form`]: Employee record collection and validation
//! - [`client`]: HTTP client for the prediction endpoint
//! - [`charts`]: Chart data, bucketing rules and chart configs
//! - [`animation`]: Value animator
//! - [`dashboard`]: Session tying form, client, charts and result panel together
//! - [`model`]: Feature encoding, the logistic model and its training
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paylens::charts::NullRenderer;
//! use paylens::client::{ClientConfig, PredictionClient};
//! use paylens::dashboard::{DashboardConfig, DashboardSession, SubmitOutcome};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PredictionClient::new(ClientConfig::default())?;
//!     let session = DashboardSession::new(client, DashboardConfig::default(), Arc::new(NullRenderer));
//!
//!     let form: HashMap<&str, &str> = [
//!         ("age", "37"), ("workclass", "Private"), ("education", "Bachelors"),
//!         ("marital-status", "Never-married"), ("occupation", "Sales"),
//!         ("relationship", "Not-in-family"), ("race", "White"), ("gender", "Female"),
//!         ("capital-gain", "0"), ("capital-loss", "0"), ("hours-per-week", "40"),
//!     ]
//!     .into_iter()
//!     .collect();
//!
//!     if let SubmitOutcome::Applied(c) = session.submit(&form).await {
//!         println!("{} ({}% confidence)", c.label, c.confidence);
//!     }
//!     session.settle().await;
//!     Ok(())
//! }
//! ```

pub mod animation;
pub mod api;
pub mod charts;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod form;
pub mod model;

pub use config::Config;
pub use dashboard::{DashboardSession, SubmitOutcome};
pub use form::{FieldSource, FormRecord};
