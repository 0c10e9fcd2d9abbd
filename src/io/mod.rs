//! File input/output helpers.
//!
//! - trend table export to CSV (`export`)
//! - raw API response save/replay (`response`)

pub mod export;
pub mod response;

pub use export::*;
pub use response::*;
