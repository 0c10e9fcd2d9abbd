//! External data sources.

pub mod bls;

pub use bls::{BlsClient, BlsResponse, Fetched, Observation, SeriesData};
