//! Shared pipeline logic used by the `build`, `latest` and `trend` commands.
//!
//! fetch (or replay) -> extract latest values -> merge the two trend series
//!
//! The commands then focus on presentation: printing tables or writing a deck.

use std::collections::BTreeMap;

use crate::data::bls::validate_year_range;
use crate::data::{BlsClient, Fetched};
use crate::domain::{LatestValue, MergedTrend, RunConfig};
use crate::error::AppError;
use crate::extract::{latest_by_label, trended_data};
use crate::reshape::merge_trends;

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub fetched: Fetched,
    pub latest: BTreeMap<String, LatestValue>,
    pub trend: MergedTrend,
}

/// Fetch the configured series, or replay a saved response, and save the raw body if asked.
pub fn fetch(config: &RunConfig) -> Result<Fetched, AppError> {
    let fetched = match &config.response_path {
        Some(path) => crate::io::load_response(path)?,
        None => {
            validate_year_range(config.start_year, config.end_year, config.api_key.is_some())?;
            let client = BlsClient::new(config.endpoint.clone(), config.api_key.clone());
            client.fetch(&config.catalog.ids(), config.start_year, config.end_year)?
        }
    };

    if let Some(path) = &config.save_response {
        crate::io::save_response(path, &fetched.body)?;
    }
    Ok(fetched)
}

/// Latest value of every returned series, keyed by label.
pub fn latest(config: &RunConfig, fetched: &Fetched) -> Result<BTreeMap<String, LatestValue>, AppError> {
    latest_by_label(fetched.response.series()?, &config.catalog)
}

/// Merge the two chart series and apply the join policy.
pub fn trend(config: &RunConfig, fetched: &Fetched) -> Result<MergedTrend, AppError> {
    let series = fetched.response.series()?;
    let left = trended_data(series, &config.catalog, &config.plan.trend_left)?;
    let right = trended_data(series, &config.catalog, &config.plan.trend_right)?;
    let trend = merge_trends(&config.plan.trend_left, left, &config.plan.trend_right, right)?;

    if config.strict_join && !trend.join.is_clean() {
        return Err(AppError::JoinMismatch {
            dropped: trend.join.dropped(),
        });
    }

    if let Some(path) = &config.export_trend {
        crate::io::write_trend_csv(path, &trend)?;
    }
    Ok(trend)
}

/// Execute fetch, extraction and reshaping.
pub fn run(config: &RunConfig) -> Result<RunOutput, AppError> {
    let fetched = fetch(config)?;
    run_with_response(config, fetched)
}

/// Execute the pipeline with an already fetched response.
pub fn run_with_response(config: &RunConfig, fetched: Fetched) -> Result<RunOutput, AppError> {
    let latest = latest(config, &fetched)?;
    let trend = trend(config, &fetched)?;

    tracing::info!(
        series = latest.len(),
        rows = trend.rows.len(),
        dropped = trend.join.dropped(),
        "Pipeline complete"
    );

    Ok(RunOutput {
        fetched,
        latest,
        trend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::bls::parse_response;
    use crate::domain::{SeriesCatalog, SlidePlan};

    const BODY: &str = r#"{
        "status": "REQUEST_SUCCEEDED",
        "message": [],
        "Results": {"series": [
            {"seriesID": "LNS13000000", "data": [
                {"year": "2023", "period": "M03", "periodName": "March", "latest": "true", "value": "5867", "footnotes": [{}]},
                {"year": "2023", "period": "M02", "periodName": "February", "value": "5938", "footnotes": [{}]},
                {"year": "2023", "period": "M01", "periodName": "January", "value": "5694", "footnotes": [{}]}
            ]},
            {"seriesID": "JTS000000000000000JOL", "data": [
                {"year": "2023", "period": "M03", "periodName": "March", "latest": "true", "value": "9745", "footnotes": [{}]},
                {"year": "2023", "period": "M01", "periodName": "January", "value": "10563", "footnotes": [{}]}
            ]},
            {"seriesID": "CES0500000003", "data": [
                {"year": "2023", "period": "M03", "periodName": "March", "latest": "true", "value": "33.18", "footnotes": [{}]}
            ]},
            {"seriesID": "LNS14000000", "data": [
                {"year": "2023", "period": "M03", "periodName": "March", "latest": "true", "value": "3.5", "footnotes": [{}]}
            ]}
        ]}
    }"#;

    fn config() -> RunConfig {
        RunConfig {
            catalog: SeriesCatalog::labor_market(),
            plan: SlidePlan::default(),
            start_year: 2023,
            end_year: 2023,
            endpoint: String::new(),
            api_key: None,
            response_path: None,
            save_response: None,
            export_trend: None,
            strict_join: false,
            deck: None,
        }
    }

    fn fetched() -> Fetched {
        Fetched {
            body: BODY.to_string(),
            response: parse_response(BODY).unwrap(),
        }
    }

    #[test]
    fn run_extracts_latest_and_merges_trend() {
        let out = run_with_response(&config(), fetched()).unwrap();
        assert_eq!(out.latest.len(), 4);
        assert_eq!(out.latest["Unemployment Rate"].value, "3.5");
        assert_eq!(out.latest["Avg Hourly Earnings"].label, "March-2023");

        let labels: Vec<&str> = out.trend.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["January-2023", "March-2023"]);
        assert_eq!(out.trend.join.dropped(), 1);
    }

    #[test]
    fn strict_join_turns_dropped_rows_into_error() {
        let mut config = config();
        config.strict_join = true;
        let err = run_with_response(&config, fetched()).unwrap_err();
        assert!(matches!(err, AppError::JoinMismatch { dropped: 1 }));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn fetch_replays_saved_response_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let saved = dir.path().join("response.json");
        let copy = dir.path().join("copy.json");
        let csv = dir.path().join("trend.csv");
        std::fs::write(&saved, BODY).unwrap();

        let mut config = config();
        // Replay skips the year-range check, so an out-of-range span is fine.
        config.start_year = 1990;
        config.response_path = Some(saved);
        config.save_response = Some(copy.clone());
        config.export_trend = Some(csv.clone());

        let out = run(&config).unwrap();
        assert_eq!(out.trend.rows.len(), 2);
        assert_eq!(std::fs::read_to_string(&copy).unwrap(), BODY);
        assert_eq!(std::fs::read_to_string(&csv).unwrap().lines().count(), 3);
    }

    #[test]
    fn live_fetch_validates_year_range_first() {
        let mut config = config();
        config.start_year = 2000;
        config.end_year = 2024;
        let err = fetch(&config).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
