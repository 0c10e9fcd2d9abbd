//! Shared domain types.
//!
//! These types sit between the stages of the pipeline:
//!
//! - run configuration (`RunConfig`, `SeriesCatalog`, `SlidePlan`)
//! - extracted values (`LatestValue`)
//! - the merged trend table (`TrendRow`, `MergedTrend`, `JoinReport`)

use std::path::PathBuf;

use chrono::NaiveDate;

pub const LABEL_UNEMPLOYMENT_LEVEL: &str = "Unemployment Level";
pub const LABEL_LABOR_FORCE: &str = "Labor Force";
pub const LABEL_AVG_HOURLY_EARNINGS: &str = "Avg Hourly Earnings";
pub const LABEL_UNEMPLOYMENT_RATE: &str = "Unemployment Rate";

/// A BLS series identifier paired with the label used on the slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSpec {
    pub id: String,
    pub label: String,
}

impl SeriesSpec {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// The set of series requested from the API, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesCatalog {
    pub series: Vec<SeriesSpec>,
}

impl SeriesCatalog {
    pub fn new(series: Vec<SeriesSpec>) -> Self {
        Self { series }
    }

    /// The labor-market series shown on the default slide.
    ///
    /// - `LNS13000000`: unemployment level (thousands)
    /// - `JTS000000000000000JOL`: JOLTS job openings, labelled "Labor Force"
    /// - `CES0500000003`: average hourly earnings, total private
    /// - `LNS14000000`: unemployment rate
    pub fn labor_market() -> Self {
        Self::new(vec![
            SeriesSpec::new("LNS13000000", LABEL_UNEMPLOYMENT_LEVEL),
            SeriesSpec::new("JTS000000000000000JOL", LABEL_LABOR_FORCE),
            SeriesSpec::new("CES0500000003", LABEL_AVG_HOURLY_EARNINGS),
            SeriesSpec::new("LNS14000000", LABEL_UNEMPLOYMENT_RATE),
        ])
    }

    pub fn ids(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn label_for(&self, series_id: &str) -> Option<&str> {
        self.series
            .iter()
            .find(|s| s.id == series_id)
            .map(|s| s.label.as_str())
    }
}

/// How a latest value is shown in a slide text box, e.g. `3.9%` or `$35.12`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarSpec {
    pub label: String,
    pub prefix: String,
    pub suffix: String,
}

impl ScalarSpec {
    pub fn new(label: &str, prefix: &str, suffix: &str) -> Self {
        Self {
            label: label.to_string(),
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        }
    }

    pub fn display(&self, value: &str) -> String {
        format!("{}{value}{}", self.prefix, self.suffix)
    }
}

/// Which catalog series feed which slide element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlidePlan {
    /// Upper and lower scalar text boxes.
    pub scalars: [ScalarSpec; 2],
    /// Chart series, in legend order.
    pub trend_left: String,
    pub trend_right: String,
}

impl Default for SlidePlan {
    fn default() -> Self {
        Self {
            scalars: [
                ScalarSpec::new(LABEL_UNEMPLOYMENT_RATE, "", "%"),
                ScalarSpec::new(LABEL_AVG_HOURLY_EARNINGS, "$", ""),
            ],
            trend_left: LABEL_UNEMPLOYMENT_LEVEL.to_string(),
            trend_right: LABEL_LABOR_FORCE.to_string(),
        }
    }
}

/// Options that only matter when a deck is written.
#[derive(Debug, Clone)]
pub struct DeckConfig {
    pub template: PathBuf,
    pub output: PathBuf,
    pub layout_index: usize,
    pub commentary: String,
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub catalog: SeriesCatalog,
    pub plan: SlidePlan,
    pub start_year: i32,
    pub end_year: i32,
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Read a saved API response instead of calling the network.
    pub response_path: Option<PathBuf>,
    /// Save the raw API response body.
    pub save_response: Option<PathBuf>,
    /// Export the merged trend table to CSV.
    pub export_trend: Option<PathBuf>,
    /// Treat rows dropped by the trend join as an error.
    pub strict_join: bool,
    pub deck: Option<DeckConfig>,
}

/// The observation flagged latest for one series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestValue {
    pub series_id: String,
    pub value: String,
    /// `"{periodName}-{year}"`, e.g. `March-2024`.
    pub label: String,
}

/// Join key of the trend table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodKey {
    pub year: String,
    pub period: String,
    pub period_name: String,
}

impl PeriodKey {
    pub fn label(&self) -> String {
        format!("{}-{}", self.period_name, self.year)
    }
}

/// A raw API value and its numeric reading (`None` for markers such as `-`).
#[derive(Debug, Clone, PartialEq)]
pub struct TrendValue {
    pub raw: String,
    pub number: Option<f64>,
}

impl TrendValue {
    pub fn parse(raw: &str) -> Self {
        let number = raw
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite());
        Self {
            raw: raw.to_string(),
            number,
        }
    }
}

/// One period of the merged trend table.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendRow {
    pub key: PeriodKey,
    pub left: TrendValue,
    pub right: TrendValue,
    pub month: u32,
    pub date: NaiveDate,
    pub label: String,
}

/// Periods the inner join dropped because only one series reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinReport {
    pub left_only: Vec<PeriodKey>,
    pub right_only: Vec<PeriodKey>,
}

impl JoinReport {
    pub fn dropped(&self) -> usize {
        self.left_only.len() + self.right_only.len()
    }

    pub fn is_clean(&self) -> bool {
        self.dropped() == 0
    }
}

/// Output of the reshaper: chronologically ordered rows plus the join report.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTrend {
    pub left_label: String,
    pub right_label: String,
    pub rows: Vec<TrendRow>,
    pub join: JoinReport,
}

impl MergedTrend {
    /// First and last row dates. Rows are sorted, so these are min and max.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.rows.first()?;
        let last = self.rows.last()?;
        Some((first.date, last.date))
    }
}
