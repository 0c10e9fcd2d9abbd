//! Terminal reports for the `latest`, `trend` and `build` commands.

pub mod format;

pub use format::*;
