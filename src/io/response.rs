//! Save and replay raw API responses.
//!
//! A saved body is parsed exactly like a live one, so a replayed run goes
//! through the same status and shape checks.

use std::path::Path;

use crate::data::bls::{Fetched, parse_response};
use crate::error::AppError;

/// Write the raw response body as returned by the API.
pub fn save_response(path: &Path, body: &str) -> Result<(), AppError> {
    std::fs::write(path, body)
        .map_err(|e| AppError::Fetch(format!("Failed to save response '{}': {e}", path.display())))?;
    tracing::info!(path = %path.display(), bytes = body.len(), "Saved API response");
    Ok(())
}

/// Load a response saved with `save_response`.
pub fn load_response(path: &Path) -> Result<Fetched, AppError> {
    let body = std::fs::read_to_string(path)
        .map_err(|e| AppError::Fetch(format!("Failed to read response '{}': {e}", path.display())))?;
    let response = parse_response(&body)?;
    tracing::info!(path = %path.display(), "Loaded saved API response");
    Ok(Fetched { body, response })
}
