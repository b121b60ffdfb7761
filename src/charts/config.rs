//! Charting Library Config
//!
//! Serializable `{type, data: {labels, datasets}, options}` objects handed
//! to a charting library when a chart is first constructed.

use serde::Serialize;

use super::{ChartKind, ChartSeries};

const AXIS_TITLE: &str = "Annual Salary ($)";

/// Chart construction config
#[derive(Debug, Clone, Serialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub data: ChartData,
    pub options: ChartOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

/// One dataset; colors are either shared or one per bar
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<i64>,
    pub background_color: Colors,
    pub border_color: Colors,
    pub border_width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Colors {
    Single(String),
    PerBar(Vec<String>),
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartOptions {
    pub responsive: bool,
    pub scales: Scales,
}

#[derive(Debug, Clone, Serialize)]
pub struct Scales {
    pub y: YAxis,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YAxis {
    pub begin_at_zero: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    pub title: AxisTitle,
}

#[derive(Debug, Clone, Serialize)]
pub struct AxisTitle {
    pub display: bool,
    pub text: String,
}

const EDUCATION_PALETTE: [(u8, u8, u8); 5] = [
    (255, 99, 132),
    (255, 159, 64),
    (255, 205, 86),
    (75, 192, 192),
    (54, 162, 235),
];

fn rgba((r, g, b): (u8, u8, u8), alpha: f64) -> String {
    format!("rgba({}, {}, {}, {})", r, g, b, alpha)
}

impl ChartConfig {
    /// Config for one of the dashboard charts with its current values
    pub fn for_chart(kind: ChartKind, series: &ChartSeries) -> Self {
        let (chart_type, background, border, border_width, tension, fill, min) = match kind {
            ChartKind::Department => (
                ChartType::Bar,
                Colors::Single(rgba((54, 162, 235), 0.7)),
                Colors::Single(rgba((54, 162, 235), 1.0)),
                1,
                None,
                None,
                Some(40000),
            ),
            ChartKind::Age => (
                ChartType::Line,
                Colors::Single(rgba((75, 192, 192), 0.2)),
                Colors::Single(rgba((75, 192, 192), 1.0)),
                2,
                Some(0.3),
                Some(true),
                None,
            ),
            ChartKind::Education => (
                ChartType::Bar,
                Colors::PerBar(EDUCATION_PALETTE.iter().map(|c| rgba(*c, 0.7)).collect()),
                Colors::PerBar(EDUCATION_PALETTE.iter().map(|c| rgba(*c, 1.0)).collect()),
                1,
                None,
                None,
                Some(30000),
            ),
        };

        Self {
            chart_type,
            data: ChartData {
                labels: series.labels().map(str::to_string).collect(),
                datasets: vec![Dataset {
                    label: kind.title().to_string(),
                    data: series.values(),
                    background_color: background,
                    border_color: border,
                    border_width,
                    tension,
                    fill,
                }],
            },
            options: ChartOptions {
                responsive: true,
                scales: Scales {
                    y: YAxis {
                        begin_at_zero: false,
                        min,
                        title: AxisTitle {
                            display: true,
                            text: AXIS_TITLE.to_string(),
                        },
                    },
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_department_config_json() {
        let series = ChartSeries::new(ChartKind::Department.seed().iter().copied());
        let json = serde_json::to_value(ChartConfig::for_chart(ChartKind::Department, &series)).unwrap();

        assert_eq!(json["type"], "bar");
        assert_eq!(json["data"]["labels"][4], "Engineering");
        assert_eq!(json["data"]["datasets"][0]["data"][4], 78000);
        assert_eq!(json["data"]["datasets"][0]["backgroundColor"], "rgba(54, 162, 235, 0.7)");
        assert_eq!(json["options"]["scales"]["y"]["min"], 40000);
        assert_eq!(json["options"]["scales"]["y"]["beginAtZero"], false);
    }

    #[test]
    fn test_age_config_is_filled_line() {
        let series = ChartSeries::new(ChartKind::Age.seed().iter().copied());
        let json = serde_json::to_value(ChartConfig::for_chart(ChartKind::Age, &series)).unwrap();

        assert_eq!(json["type"], "line");
        assert_eq!(json["data"]["datasets"][0]["fill"], true);
        assert_eq!(json["data"]["datasets"][0]["tension"], 0.3);
        assert!(json["options"]["scales"]["y"].get("min").is_none());
    }

    #[test]
    fn test_education_colors_per_bar() {
        let series = ChartSeries::new(ChartKind::Education.seed().iter().copied());
        let config = ChartConfig::for_chart(ChartKind::Education, &series);

        match &config.data.datasets[0].background_color {
            Colors::PerBar(colors) => assert_eq!(colors.len(), series.len()),
            Colors::Single(_) => panic!("expected per-bar colors"),
        }
    }
}
