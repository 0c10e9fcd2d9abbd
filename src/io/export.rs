//! Export the merged trend table to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::MergedTrend;
use crate::error::AppError;

/// Write the merged trend rows, in chart order, to a CSV file.
pub fn write_trend_csv(path: &Path, trend: &MergedTrend) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::Render(format!("Failed to create trend CSV '{}': {e}", path.display())))?;
    write_trend(BufWriter::new(file), trend)
        .map_err(|e| AppError::Render(format!("Failed to write trend CSV '{}': {e}", path.display())))?;

    tracing::info!(path = %path.display(), rows = trend.rows.len(), "Exported trend table");
    Ok(())
}

fn write_trend<W: Write>(mut out: W, trend: &MergedTrend) -> std::io::Result<()> {
    writeln!(
        out,
        "year,period,period_name,month,date,label,{},{}",
        csv_field(&trend.left_label),
        csv_field(&trend.right_label)
    )?;

    for row in &trend.rows {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{}",
            row.key.year,
            row.key.period,
            csv_field(&row.key.period_name),
            row.month,
            row.date,
            csv_field(&row.label),
            csv_field(&row.left.raw),
            csv_field(&row.right.raw),
        )?;
    }
    out.flush()
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
