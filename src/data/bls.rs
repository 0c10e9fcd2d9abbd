//! BLS public timeseries API integration.
//!
//! One `POST` returns every requested series for the year range. The raw body
//! is kept alongside the parsed envelope so it can be saved and replayed with
//! `--response`.

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_ENDPOINT: &str = "https://api.bls.gov/publicAPI/v2/timeseries/data/";

const STATUS_SUCCEEDED: &str = "REQUEST_SUCCEEDED";

/// Maximum year span per request with a registration key.
pub const MAX_YEARS_REGISTERED: i32 = 20;
/// Maximum year span per request without one.
pub const MAX_YEARS_ANONYMOUS: i32 = 10;

/// JSON request body.
#[derive(Debug, Serialize)]
struct TimeseriesRequest<'a> {
    seriesid: &'a [&'a str],
    startyear: String,
    endyear: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    registrationkey: Option<&'a str>,
}

/// Parsed response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct BlsResponse {
    pub status: String,
    #[serde(default)]
    pub message: Vec<String>,
    #[serde(rename = "Results", default)]
    pub results: Option<BlsResults>,
}

impl BlsResponse {
    /// Series returned by the API, failing if the envelope carries none.
    pub fn series(&self) -> Result<&[SeriesData], AppError> {
        let series = self
            .results
            .as_ref()
            .map(|r| r.series.as_slice())
            .unwrap_or_default();
        if series.is_empty() {
            return Err(AppError::Fetch("Response contains no series.".to_string()));
        }
        Ok(series)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlsResults {
    #[serde(default)]
    pub series: Vec<SeriesData>,
}

/// One series and its observations, newest first as the API returns them.
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesData {
    #[serde(rename = "seriesID")]
    pub series_id: String,
    #[serde(default)]
    pub data: Vec<Observation>,
}

/// One reported value. Missing string fields deserialize empty and are
/// rejected as data-shape errors where they are used.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub period: String,
    #[serde(rename = "periodName", default)]
    pub period_name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub latest: Option<String>,
    #[serde(default)]
    pub footnotes: Vec<Footnote>,
}

impl Observation {
    pub fn is_latest(&self) -> bool {
        self.latest.as_deref() == Some("true")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Footnote {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// A fetched response: the raw body plus its parsed form.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub body: String,
    pub response: BlsResponse,
}

pub struct BlsClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl BlsClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_client(Client::new(), endpoint, api_key)
    }

    /// Use a preconfigured HTTP client (proxy, timeouts, ...).
    pub fn with_client(client: Client, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn fetch(&self, series_ids: &[&str], start_year: i32, end_year: i32) -> Result<Fetched, AppError> {
        if series_ids.is_empty() {
            return Err(AppError::Fetch("No series identifiers to request.".to_string()));
        }

        let request = TimeseriesRequest {
            seriesid: series_ids,
            startyear: start_year.to_string(),
            endyear: end_year.to_string(),
            registrationkey: self.api_key.as_deref(),
        };

        tracing::info!(
            endpoint = %self.endpoint,
            series = series_ids.len(),
            start_year,
            end_year,
            registered = self.api_key.is_some(),
            "Requesting BLS timeseries"
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .map_err(|e| AppError::Fetch(format!("BLS request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::Fetch(format!(
                "BLS request failed with status {}.",
                resp.status()
            )));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::Fetch(format!("Failed to read BLS response body: {e}")))?;
        let response = parse_response(&body)?;

        Ok(Fetched { body, response })
    }
}

/// Parse and validate a response body.
///
/// Non-fatal API messages on a successful request are logged as warnings.
pub fn parse_response(body: &str) -> Result<BlsResponse, AppError> {
    let response: BlsResponse = serde_json::from_str(body)
        .map_err(|e| AppError::Fetch(format!("Failed to parse BLS response: {e}")))?;

    if response.status != STATUS_SUCCEEDED {
        let detail = if response.message.is_empty() {
            "no message".to_string()
        } else {
            response.message.join("; ")
        };
        return Err(AppError::Fetch(format!(
            "BLS returned status {}: {detail}",
            response.status
        )));
    }

    for message in &response.message {
        tracing::warn!("BLS: {message}");
    }

    response.series()?;
    Ok(response)
}

/// Check a year range against the API's per-request limits.
pub fn validate_year_range(start_year: i32, end_year: i32, registered: bool) -> Result<(), AppError> {
    if start_year > end_year {
        return Err(AppError::Config(format!(
            "Start year {start_year} is after end year {end_year}."
        )));
    }
    let limit = if registered {
        MAX_YEARS_REGISTERED
    } else {
        MAX_YEARS_ANONYMOUS
    };
    let span = end_year - start_year + 1;
    if span > limit {
        let hint = if registered { "" } else { " (set BLS_API_KEY to allow 20)" };
        return Err(AppError::Config(format!(
            "Year range {start_year}-{end_year} spans {span} years; the API allows at most {limit}{hint}."
        )));
    }
    Ok(())
}
