//! Formatted terminal output.
//!
//! Formatting lives here so the fetch/reshape/render code stays free of
//! presentation concerns and output changes stay localized.

use std::collections::BTreeMap;

use crate::deck::RenderSummary;
use crate::domain::{JoinReport, LatestValue, MergedTrend, RunConfig, SeriesCatalog};

/// Latest value of every catalog series, in catalog order.
pub fn format_latest(catalog: &SeriesCatalog, latest: &BTreeMap<String, LatestValue>) -> String {
    let mut out = String::new();
    out.push_str(format!("{:<24} {:<24} {:>12} {:<16}", "series", "label", "value", "period").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<24} {:-<24} {:-<12} {:-<16}", "", "", "", "").trim_end());
    out.push('\n');

    for spec in &catalog.series {
        let Some(value) = latest.get(&spec.label) else {
            continue;
        };
        out.push_str(
            format!(
                "{:<24} {:<24} {:>12} {:<16}",
                truncate(&spec.id, 24),
                truncate(&spec.label, 24),
                value.value,
                value.label,
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// The merged trend table followed by the join report.
pub fn format_trend(trend: &MergedTrend) -> String {
    let mut out = String::new();

    match trend.date_range() {
        Some((first, last)) => out.push_str(&format!(
            "{} vs {} | {} - {} | rows={}\n\n",
            trend.left_label,
            trend.right_label,
            first.format("%b %Y"),
            last.format("%b %Y"),
            trend.rows.len()
        )),
        None => out.push_str(&format!("{} vs {} | no rows\n\n", trend.left_label, trend.right_label)),
    }

    out.push_str(
        format!(
            "{:<16} {:<10} {:>14} {:>14}",
            "period",
            "date",
            truncate(&trend.left_label, 14),
            truncate(&trend.right_label, 14)
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<16} {:-<10} {:-<14} {:-<14}", "", "", "", "").trim_end());
    out.push('\n');

    for row in &trend.rows {
        out.push_str(
            format!(
                "{:<16} {:<10} {:>14} {:>14}",
                row.label, row.date, row.left.raw, row.right.raw
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&format_join_report(&trend.join, &trend.left_label, &trend.right_label));
    out
}

/// Periods dropped by the inner join, per side.
pub fn format_join_report(join: &JoinReport, left_label: &str, right_label: &str) -> String {
    if join.is_clean() {
        return "Join: all periods matched\n".to_string();
    }

    let mut out = format!("Join: dropped {} period(s)\n", join.dropped());
    for (label, keys) in [(left_label, &join.left_only), (right_label, &join.right_only)] {
        if keys.is_empty() {
            continue;
        }
        let names: Vec<String> = keys.iter().map(|k| k.label()).collect();
        out.push_str(&format!("- only in {label}: {}\n", names.join(", ")));
    }
    out
}

/// One-screen summary after a deck is written.
pub fn format_build_summary(
    config: &RunConfig,
    scalars: &[String; 2],
    trend: &MergedTrend,
    summary: &RenderSummary,
) -> String {
    let mut out = String::new();
    out.push_str("=== bls-deck ===\n");
    out.push_str(&format!("Years: {}-{}\n", config.start_year, config.end_year));
    for (spec, text) in config.plan.scalars.iter().zip(scalars) {
        out.push_str(&format!("{}: {text}\n", spec.label));
    }
    out.push_str(&format!(
        "Chart: {} vs {} ({} points, {} dropped by join)\n",
        trend.left_label,
        trend.right_label,
        trend.rows.len(),
        trend.join.dropped()
    ));
    if let Some(deck) = &config.deck {
        out.push_str(&format!(
            "Slide: {} (id {}, layout {})\n",
            summary.slide_part, summary.slide_id, summary.layout_part
        ));
        out.push_str(&format!("Wrote: {}\n", deck.output.display()));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
