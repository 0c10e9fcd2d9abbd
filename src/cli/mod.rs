//! Command-line parsing for the BLS slide builder.
//!
//! Parsing and dispatch stay separate from the fetch/reshape/render code;
//! `app` turns these arguments into a `RunConfig`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::bls::DEFAULT_ENDPOINT;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "bls-deck", version, about = "Build a labor-market slide from BLS data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the series and add the labor-market slide to a template deck.
    Build(BuildArgs),
    /// Print the latest value of every series.
    Latest(FetchArgs),
    /// Print the merged trend table used for the chart.
    Trend(TrendArgs),
}

/// Options shared by every command that needs the API data.
#[derive(Debug, Args, Clone)]
pub struct FetchArgs {
    /// First year requested (defaults to nine years before the end year).
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Last year requested (defaults to the current year).
    #[arg(long)]
    pub end_year: Option<i32>,

    /// Read a saved API response instead of calling the API.
    #[arg(long, value_name = "JSON")]
    pub response: Option<PathBuf>,

    /// Save the raw API response body.
    #[arg(long, value_name = "JSON")]
    pub save_response: Option<PathBuf>,

    /// Timeseries endpoint.
    #[arg(long, env = "BLS_API_URL", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Registration key; raises the year-span limit from 10 to 20.
    #[arg(long, env = "BLS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

/// Options for the trend table.
#[derive(Debug, Args, Clone)]
pub struct TrendOptions {
    /// Export the merged trend table to CSV.
    #[arg(long = "export-trend", value_name = "CSV")]
    pub export_trend: Option<PathBuf>,

    /// Fail when the join drops periods that only one series reports.
    #[arg(long)]
    pub strict_join: bool,
}

#[derive(Debug, Args, Clone)]
pub struct TrendArgs {
    #[command(flatten)]
    pub fetch: FetchArgs,

    #[command(flatten)]
    pub trend: TrendOptions,
}

#[derive(Debug, Args, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub fetch: FetchArgs,

    #[command(flatten)]
    pub trend: TrendOptions,

    /// Template presentation.
    #[arg(long, value_name = "PPTX", default_value = "BLS Template Presentation.pptx")]
    pub template: PathBuf,

    /// Output presentation; overwritten if present.
    #[arg(short, long, value_name = "PPTX", default_value = "BLS Labor Market.pptx")]
    pub output: PathBuf,

    /// Index of the slide layout in the first slide master.
    #[arg(long, default_value_t = 2)]
    pub layout_index: usize,

    /// Placeholder text for the commentary box.
    #[arg(long, default_value = "::Your Commentary Here::")]
    pub commentary: String,
}
