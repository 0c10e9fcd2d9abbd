//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments into a `RunConfig`
//! - runs the fetch/extract/reshape pipeline
//! - prints reports and writes the deck and optional exports

use chrono::Datelike;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{BuildArgs, Command, FetchArgs, TrendArgs, TrendOptions};
use crate::deck::{SlideContent, SlideGeometry};
use crate::domain::{DeckConfig, RunConfig, SeriesCatalog, SlidePlan};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `bls-deck` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is normal; the key can come from the real environment.
    let _ = dotenvy::dotenv();
    init_tracing();

    // `bls-deck` and `bls-deck --start-year 2020` behave like `bls-deck build ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Build(args) => handle_build(args),
        Command::Latest(args) => handle_latest(args),
        Command::Trend(args) => handle_trend(args),
    }
}

/// Log to stderr so stdout carries only reports. `RUST_LOG` overrides the `info` default.
fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn handle_build(args: BuildArgs) -> Result<(), AppError> {
    let config = build_config(&args)?;
    let run = pipeline::run(&config)?;

    let deck = config
        .deck
        .as_ref()
        .ok_or_else(|| AppError::Config("build requires deck options".to_string()))?;
    let content = SlideContent::from_run(&config.plan, &run.latest, &run.trend, &deck.commentary)?;
    let summary = crate::deck::render_deck(
        &deck.template,
        &deck.output,
        deck.layout_index,
        &SlideGeometry::default(),
        &content,
    )?;

    println!(
        "{}",
        crate::report::format_build_summary(&config, &content.scalars, &run.trend, &summary)
    );
    Ok(())
}

fn handle_latest(args: FetchArgs) -> Result<(), AppError> {
    let config = run_config(&args, None, None)?;
    let fetched = pipeline::fetch(&config)?;
    let latest = pipeline::latest(&config, &fetched)?;

    print!("{}", crate::report::format_latest(&config.catalog, &latest));
    Ok(())
}

fn handle_trend(args: TrendArgs) -> Result<(), AppError> {
    let config = run_config(&args.fetch, Some(&args.trend), None)?;
    let fetched = pipeline::fetch(&config)?;
    let trend = pipeline::trend(&config, &fetched)?;

    print!("{}", crate::report::format_trend(&trend));
    Ok(())
}

pub fn build_config(args: &BuildArgs) -> Result<RunConfig, AppError> {
    let deck = DeckConfig {
        template: args.template.clone(),
        output: args.output.clone(),
        layout_index: args.layout_index,
        commentary: args.commentary.clone(),
    };
    run_config(&args.fetch, Some(&args.trend), Some(deck))
}

/// Resolve CLI arguments into a run configuration with default years filled in.
pub fn run_config(
    fetch: &FetchArgs,
    trend: Option<&TrendOptions>,
    deck: Option<DeckConfig>,
) -> Result<RunConfig, AppError> {
    let (start_year, end_year) = resolve_years(fetch.start_year, fetch.end_year, chrono::Local::now().year())?;

    Ok(RunConfig {
        catalog: SeriesCatalog::labor_market(),
        plan: SlidePlan::default(),
        start_year,
        end_year,
        endpoint: fetch.endpoint.clone(),
        api_key: fetch.api_key.clone().filter(|k| !k.trim().is_empty()),
        response_path: fetch.response.clone(),
        save_response: fetch.save_response.clone(),
        export_trend: trend.and_then(|t| t.export_trend.clone()),
        strict_join: trend.is_some_and(|t| t.strict_join),
        deck,
    })
}

/// Fill in missing years: end defaults to `current_year`, start to nine years before end.
fn resolve_years(start: Option<i32>, end: Option<i32>, current_year: i32) -> Result<(i32, i32), AppError> {
    let end = end.unwrap_or(current_year);
    let start = start.unwrap_or(end - 9);
    if start > end {
        return Err(AppError::Config(format!(
            "Start year {start} is after end year {end}."
        )));
    }
    Ok((start, end))
}

/// Rewrite argv so `bls-deck` defaults to `bls-deck build`.
///
/// Rules:
/// - `bls-deck`                      -> `bls-deck build`
/// - `bls-deck --end-year 2024 ...`  -> `bls-deck build --end-year 2024 ...`
/// - `bls-deck --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("build".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "build" | "latest" | "trend");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "build flags".
    if arg1.starts_with('-') {
        argv.insert(1, "build".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_build() {
        assert_eq!(rewrite_args(argv(&["bls-deck"])), argv(&["bls-deck", "build"]));
        assert_eq!(
            rewrite_args(argv(&["bls-deck", "--end-year", "2024"])),
            argv(&["bls-deck", "build", "--end-year", "2024"])
        );
        assert_eq!(rewrite_args(argv(&["bls-deck", "--help"])), argv(&["bls-deck", "--help"]));
        assert_eq!(rewrite_args(argv(&["bls-deck", "trend"])), argv(&["bls-deck", "trend"]));
    }

    #[test]
    fn years_default_to_ten_year_window() {
        assert_eq!(resolve_years(None, None, 2026).unwrap(), (2017, 2026));
        assert_eq!(resolve_years(None, Some(2020), 2026).unwrap(), (2011, 2020));
        assert_eq!(resolve_years(Some(2019), None, 2026).unwrap(), (2019, 2026));
        assert!(matches!(resolve_years(Some(2025), Some(2020), 2026), Err(AppError::Config(_))));
    }

    #[test]
    fn build_args_resolve_into_run_config() {
        let cli = Cli::parse_from(argv(&[
            "bls-deck",
            "build",
            "--start-year",
            "2015",
            "--end-year",
            "2024",
            "--template",
            "t.pptx",
            "--output",
            "o.pptx",
            "--strict-join",
            "--api-key",
            " ",
        ]));
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        let config = build_config(&args).unwrap();
        assert_eq!((config.start_year, config.end_year), (2015, 2024));
        assert!(config.strict_join);
        assert_eq!(config.api_key, None);
        let deck = config.deck.unwrap();
        assert_eq!(deck.template, std::path::PathBuf::from("t.pptx"));
        assert_eq!(deck.layout_index, 2);
    }
}
