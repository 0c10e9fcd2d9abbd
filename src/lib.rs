//! `bls-deck` library crate.
//!
//! The binary (`bls-deck`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the fetch, reshape and render stages can be reused on their own

pub mod app;
pub mod cli;
pub mod data;
pub mod deck;
pub mod domain;
pub mod error;
pub mod extract;
pub mod io;
pub mod report;
pub mod reshape;
