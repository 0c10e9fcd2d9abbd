//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - run configuration (`RunConfig`, `SeriesCatalog`, `SlidePlan`)
//! - extracted latest values (`LatestValue`)
//! - the merged trend table (`MergedTrend`, `TrendRow`)

pub mod types;

pub use types::*;
