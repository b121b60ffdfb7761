//! Salary Charts
//!
//! The three dashboard charts (average salary by department, age group and
//! education level) with their seed data, and the mapping from raw form
//! values to chart buckets.
//!
//! Drawing is left to a [`ChartRenderer`]; a chart only owns its data and
//! asks the renderer to redraw after every mutation.

pub mod buckets;
pub mod config;

pub use buckets::{age_bucket, department_bucket, education_bucket, DEFAULT_EDUCATION_LEVEL};
pub use config::{ChartConfig, ChartData, ChartOptions, ChartType, Colors, Dataset};

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Which of the three dashboard charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Department,
    Age,
    Education,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Department, ChartKind::Age, ChartKind::Education];

    /// Element id of the drawing surface on the page
    pub fn canvas_id(&self) -> &'static str {
        match self {
            ChartKind::Department => "salaryChart",
            ChartKind::Age => "ageChart",
            ChartKind::Education => "educationChart",
        }
    }

    /// Dataset label shown in the legend
    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::Department => "Average Salary by Department",
            ChartKind::Age => "Average Salary by Age Group",
            ChartKind::Education => "Average Salary by Education",
        }
    }

    /// Seed buckets and values
    pub fn seed(&self) -> &'static [(&'static str, i64)] {
        match self {
            ChartKind::Department => &[
                ("IT", 72000),
                ("HR", 58000),
                ("Finance", 68000),
                ("Sales", 62000),
                ("Engineering", 78000),
                ("Admin", 52000),
                ("Marketing", 65000),
            ],
            ChartKind::Age => &[
                ("20-25", 45000),
                ("26-30", 52000),
                ("31-35", 62000),
                ("36-40", 72000),
                ("41-45", 78000),
                ("46-50", 82000),
                ("51-55", 85000),
                ("56-60", 80000),
            ],
            ChartKind::Education => &[
                ("High School", 42000),
                ("Some College", 48000),
                ("Bachelor", 68000),
                ("Master", 82000),
                ("Doctorate", 95000),
            ],
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::Department => write!(f, "department"),
            ChartKind::Age => write!(f, "age"),
            ChartKind::Education => write!(f, "education"),
        }
    }
}

/// Ordered (label, value) pairs backing one chart.
///
/// The label set is fixed at construction; only values change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    points: Vec<(String, i64)>,
}

impl ChartSeries {
    pub fn new<L: Into<String>>(points: impl IntoIterator<Item = (L, i64)>) -> Self {
        Self {
            points: points.into_iter().map(|(l, v)| (l.into(), v)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.points.iter().map(|(l, _)| l.as_str())
    }

    pub fn values(&self) -> Vec<i64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.points.iter().position(|(l, _)| l == label)
    }

    pub fn value(&self, index: usize) -> Option<i64> {
        self.points.get(index).map(|(_, v)| *v)
    }

    pub fn points(&self) -> &[(String, i64)] {
        &self.points
    }

    fn set(&mut self, index: usize, value: i64) -> Result<(), ChartError> {
        let len = self.points.len();
        let slot = self
            .points
            .get_mut(index)
            .ok_or(ChartError::IndexOutOfRange { index, len })?;
        slot.1 = value;
        Ok(())
    }
}

/// Redraws a chart after its data changed
pub trait ChartRenderer: Send + Sync {
    fn update(&self, kind: ChartKind, series: &ChartSeries);
}

/// Renderer that draws nothing
pub struct NullRenderer;

impl ChartRenderer for NullRenderer {
    fn update(&self, _kind: ChartKind, _series: &ChartSeries) {}
}

/// One dashboard chart: its data plus the renderer that draws it
pub struct Chart {
    kind: ChartKind,
    series: ChartSeries,
    renderer: Arc<dyn ChartRenderer>,
    redraws: u64,
}

/// Shared handle to a chart mutated by animation tasks
pub type ChartHandle = Arc<RwLock<Chart>>;

impl Chart {
    /// Build a chart with its seed data
    pub fn seeded(kind: ChartKind, renderer: Arc<dyn ChartRenderer>) -> Self {
        Self {
            kind,
            series: ChartSeries::new(kind.seed().iter().copied()),
            renderer,
            redraws: 0,
        }
    }

    /// Wrap into a shared handle
    pub fn into_handle(self) -> ChartHandle {
        Arc::new(RwLock::new(self))
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    pub fn series(&self) -> &ChartSeries {
        &self.series
    }

    pub fn value(&self, index: usize) -> Option<i64> {
        self.series.value(index)
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.series.index_of(label)
    }

    /// Number of redraws requested so far
    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    /// Write a value and redraw
    pub fn set_value(&mut self, index: usize, value: i64) -> Result<(), ChartError> {
        self.series.set(index, value)?;
        self.redraw();
        Ok(())
    }

    /// Ask the renderer to draw the current data
    pub fn redraw(&mut self) {
        self.redraws += 1;
        self.renderer.update(self.kind, &self.series);
    }

    /// Construction config for a charting library
    pub fn config(&self) -> ChartConfig {
        ChartConfig::for_chart(self.kind, &self.series)
    }
}

/// Format a salary as dollars with thousands separators, e.g. `$72,000`
pub fn format_salary(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if value < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// Chart errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    #[error("Bucket index {index} out of range for chart with {len} buckets")]
    IndexOutOfRange { index: usize, len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRenderer {
        frames: Mutex<Vec<Vec<i64>>>,
    }

    impl ChartRenderer for RecordingRenderer {
        fn update(&self, _kind: ChartKind, series: &ChartSeries) {
            self.frames.lock().unwrap().push(series.values());
        }
    }

    #[test]
    fn test_seed_shapes() {
        let renderer: Arc<dyn ChartRenderer> = Arc::new(NullRenderer);
        assert_eq!(Chart::seeded(ChartKind::Department, renderer.clone()).series().len(), 7);
        assert_eq!(Chart::seeded(ChartKind::Age, renderer.clone()).series().len(), 8);
        assert_eq!(Chart::seeded(ChartKind::Education, renderer).series().len(), 5);
    }

    #[test]
    fn test_set_value_redraws() {
        let renderer = Arc::new(RecordingRenderer::default());
        let mut chart = Chart::seeded(ChartKind::Education, renderer.clone());

        let idx = chart.index_of("Master").unwrap();
        chart.set_value(idx, 82001).unwrap();

        assert_eq!(chart.value(idx), Some(82001));
        assert_eq!(chart.redraws(), 1);
        let frames = renderer.frames.lock().unwrap();
        assert_eq!(frames[0], vec![42000, 48000, 68000, 82001, 95000]);
    }

    #[test]
    fn test_set_value_out_of_range() {
        let mut chart = Chart::seeded(ChartKind::Education, Arc::new(NullRenderer));
        let err = chart.set_value(5, 1).unwrap_err();
        assert_eq!(err, ChartError::IndexOutOfRange { index: 5, len: 5 });
        assert_eq!(chart.redraws(), 0);
    }

    #[test]
    fn test_format_salary() {
        assert_eq!(format_salary(72000), "$72,000");
        assert_eq!(format_salary(950), "$950");
        assert_eq!(format_salary(1_234_567), "$1,234,567");
        assert_eq!(format_salary(-45000), "-$45,000");
    }
}
