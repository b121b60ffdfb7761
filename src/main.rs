//! Paylens CLI
//!
//! Command-line interface for Paylens:
//! - Run the prediction backend
//! - Submit an employee record and watch the charts update
//! - Print the seeded charts
//! - Train a model artifact from census data
//! - Generate a default config file

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paylens::api::{self, AppState};
use paylens::charts::{format_salary, Chart, ChartKind, ChartRenderer, ChartSeries, NullRenderer};
use paylens::client::PredictionClient;
use paylens::config::{generate_default_config, Config, LoggingConfig};
use paylens::dashboard::{DashboardSession, SubmitOutcome};
use paylens::form::FieldSource;
use paylens::model::{train, Dataset, TrainConfig};

/// Widest bar drawn for a chart's largest value
const BAR_WIDTH: usize = 40;

/// Minimum time between two frames of the same chart in watch mode
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "paylens")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Salary band prediction dashboard")]
#[command(long_about = "Paylens predicts whether an employee earns above $50K and shows\nthe result against average salaries by department, age group and education.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the prediction backend
    Serve {
        /// Bind host
        #[arg(long)]
        host: Option<String>,
        /// Bind port
        #[arg(short, long)]
        port: Option<u16>,
        /// Model artifact (JSON)
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Submit an employee record and show the prediction
    Predict(PredictArgs),

    /// Print the seeded charts
    Charts {
        /// Print Chart.js configs as JSON
        #[arg(long)]
        json: bool,
    },

    /// Train a model artifact from adult census CSV data
    Train {
        /// CSV file with a header row
        #[arg(short, long)]
        data: PathBuf,
        /// Where to write the artifact (JSON)
        #[arg(short, long, default_value = "model.json")]
        output: PathBuf,
        /// Name stored in the artifact
        #[arg(long, default_value = "adult-income")]
        name: String,
        /// Share of rows held out for scoring
        #[arg(long, default_value = "0.2")]
        test_fraction: f64,
        /// Seed for the train/test shuffle
        #[arg(long, default_value = "42")]
        seed: u64,
        #[arg(long, default_value = "1000")]
        epochs: usize,
        #[arg(long, default_value = "0.5")]
        learning_rate: f64,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Employee record fields, named like the form inputs
#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// Prediction backend URL (default: from config)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Redraw the charts while they animate instead of jumping to the result
    #[arg(short, long)]
    pub watch: bool,

    #[arg(long)]
    pub age: Option<String>,
    #[arg(long)]
    pub workclass: Option<String>,
    #[arg(long)]
    pub education: Option<String>,
    #[arg(long, default_value = "Never-married")]
    pub marital_status: String,
    #[arg(long)]
    pub occupation: Option<String>,
    #[arg(long, default_value = "Not-in-family")]
    pub relationship: String,
    #[arg(long, default_value = "White")]
    pub race: String,
    #[arg(long, default_value = "Male")]
    pub gender: String,
    #[arg(long, default_value = "0")]
    pub capital_gain: String,
    #[arg(long, default_value = "0")]
    pub capital_loss: String,
    #[arg(long)]
    pub hours_per_week: Option<String>,
}

impl FieldSource for PredictArgs {
    fn field(&self, id: &str) -> Option<String> {
        // An omitted flag behaves like an empty input
        let required = |value: &Option<String>| Some(value.clone().unwrap_or_default());

        match id {
            "age" => required(&self.age),
            "workclass" => required(&self.workclass),
            "education" => required(&self.education),
            "marital-status" => Some(self.marital_status.clone()),
            "occupation" => required(&self.occupation),
            "relationship" => Some(self.relationship.clone()),
            "race" => Some(self.race.clone()),
            "gender" => Some(self.gender.clone()),
            "capital-gain" => Some(self.capital_gain.clone()),
            "capital-loss" => Some(self.capital_loss.clone()),
            "hours-per-week" => required(&self.hours_per_week),
            _ => None,
        }
    }
}

/// Draws charts as text bars on stdout, at most one frame per interval
struct TerminalRenderer {
    last_frame: Mutex<HashMap<ChartKind, Instant>>,
}

impl TerminalRenderer {
    fn new() -> Self {
        Self {
            last_frame: Mutex::new(HashMap::new()),
        }
    }
}

impl ChartRenderer for TerminalRenderer {
    fn update(&self, kind: ChartKind, series: &ChartSeries) {
        let Ok(mut last_frame) = self.last_frame.lock() else {
            return;
        };
        let now = Instant::now();
        if let Some(previous) = last_frame.get(&kind) {
            if now.duration_since(*previous) < FRAME_INTERVAL {
                return;
            }
        }
        last_frame.insert(kind, now);
        println!("{}", render_chart(kind, series));
    }
}

/// Render a chart as one text bar per bucket
fn render_chart(kind: ChartKind, series: &ChartSeries) -> String {
    let label_width = series.labels().map(|l| l.chars().count()).max().unwrap_or(0);
    let max = series.values().into_iter().max().unwrap_or(0).max(1);

    let mut out = format!("{}\n", kind.title());
    for (label, value) in series.points() {
        let len = ((*value).max(0) * BAR_WIDTH as i64 / max) as usize;
        out.push_str(&format!(
            "  {:<width$}  {:<bar$}  {}\n",
            label,
            "█".repeat(len),
            format_salary(*value),
            width = label_width,
            bar = BAR_WIDTH,
        ));
    }
    out
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("paylens={},tower_http=debug", logging.level))
    });

    // Logs go to stderr so command output stays clean
    let (pretty, json) = if logging.is_json() {
        (
            None,
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        )
    } else {
        (
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
            None,
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_with_env(path).context("Failed to load config"),
        None => Ok(Config::load_default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Serve { host, port, model } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if model.is_some() {
                config.server.model_path = model;
            }

            tracing::info!("Paylens API v{}", env!("CARGO_PKG_VERSION"));

            let predictor = api::load_predictor(&config.server).context("Failed to load model")?;
            let state = AppState::new(predictor, config.server.clone());
            api::serve(state, &config.server).await?;
        }

        Commands::Predict(args) => {
            if let Some(url) = &args.api_url {
                config.client.base_url = url.clone();
            }

            let renderer: Arc<dyn ChartRenderer> = if args.watch {
                Arc::new(TerminalRenderer::new())
            } else {
                Arc::new(NullRenderer)
            };

            let client = PredictionClient::new(config.client.clone())?;
            if let Err(e) = client.health_check().await {
                tracing::warn!("Health check against {} failed: {}", config.client.base_url, e);
            }

            let session = DashboardSession::new(client, config.dashboard.clone(), renderer);

            match session.submit(&args).await {
                SubmitOutcome::Applied(classification) => {
                    println!("Prediction: {}", classification.label);
                    println!("Confidence: {}%", classification.confidence);
                    println!();

                    if args.watch {
                        session.settle().await;
                    } else {
                        session.fast_forward().await;
                    }

                    for kind in ChartKind::ALL {
                        println!("{}", render_chart(kind, &session.series(kind).await));
                    }
                }
                SubmitOutcome::Failed(e) => {
                    eprintln!("{}", e.user_message());
                    std::process::exit(1);
                }
                SubmitOutcome::Superseded { .. } => {}
            }
        }

        Commands::Charts { json } => {
            let charts: Vec<Chart> = ChartKind::ALL
                .into_iter()
                .map(|kind| Chart::seeded(kind, Arc::new(NullRenderer)))
                .collect();

            if json {
                let configs: Vec<_> = charts.iter().map(Chart::config).collect();
                println!("{}", serde_json::to_string_pretty(&configs)?);
            } else {
                for chart in &charts {
                    println!("{}", render_chart(chart.kind(), chart.series()));
                }
            }
        }

        Commands::Train {
            data,
            output,
            name,
            test_fraction,
            seed,
            epochs,
            learning_rate,
        } => {
            let config = TrainConfig {
                name,
                test_fraction,
                seed,
                epochs,
                learning_rate,
                ..Default::default()
            };

            let dataset = Dataset::from_path(&data)?;
            let report = train(&dataset, &config)?;
            report.artifact.save(&output)?;

            println!(
                "Trained on {} rows, tested on {} ({} skipped, {} missing values filled)",
                report.train_rows, report.test_rows, report.skipped_rows, report.filled_values
            );
            println!("Training accuracy: {:.2}", report.train_accuracy);
            match report.test_accuracy {
                Some(accuracy) => println!("Accuracy: {:.2}", accuracy),
                None => println!("Accuracy: n/a (no rows held out)"),
            }
            println!("Model written to {:?}", output);
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}
