//! Slide rendering into a PowerPoint template.
//!
//! The template is loaded as an OPC package, one slide is appended using a
//! layout of the first slide master, and the package is written back out:
//!
//! - `package`: zip parts, relationships, content types
//! - `presentation`: master/layout lookup, slide list, notes master
//! - `slide`, `chart`, `notes`: XML for the new parts

use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::{LatestValue, MergedTrend, SlidePlan};
use crate::error::AppError;
use crate::extract::require_latest;

pub mod chart;
pub mod notes;
pub mod package;
pub mod presentation;
pub mod slide;
pub mod xml;

#[cfg(test)]
pub(crate) mod fixtures;

pub use chart::{ChartSeries, ChartStyle, LineChart};
pub use slide::Frame;

use package::{
    CT_CHART, CT_NOTES_SLIDE, CT_SLIDE, Package, REL_CHART, REL_NOTES_MASTER, REL_NOTES_SLIDE, REL_SLIDE,
    REL_SLIDE_LAYOUT,
};
use presentation::PresentationParts;
use slide::{ChartFrame, SlideShape, TextBox};

pub const HEADLINE_PT: f64 = 60.0;

/// Fixed positions of the inserted shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideGeometry {
    pub upper_scalar: Frame,
    pub lower_scalar: Frame,
    pub chart: Frame,
    pub commentary: Frame,
}

impl Default for SlideGeometry {
    fn default() -> Self {
        Self {
            upper_scalar: Frame::inches(1.25, 2.2, 2.6, 1.0),
            lower_scalar: Frame::inches(1.25, 4.45, 2.6, 1.0),
            chart: Frame::inches(5.4, 1.55, 7.0, 4.4),
            commentary: Frame::inches(0.81, 6.21, 11.72, 1.0),
        }
    }
}

/// Everything placed on the new slide.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideContent {
    pub scalars: [String; 2],
    pub chart: LineChart,
    pub commentary: String,
    pub notes: Vec<String>,
}

impl SlideContent {
    /// Assemble slide text, chart data and notes from the extracted values.
    pub fn from_run(
        plan: &SlidePlan,
        latest: &BTreeMap<String, LatestValue>,
        merged: &MergedTrend,
        commentary: &str,
    ) -> Result<Self, AppError> {
        let (first, last) = merged
            .date_range()
            .ok_or_else(|| AppError::data_shape("trend", "merged trend table is empty"))?;

        let upper = require_latest(latest, &plan.scalars[0].label)?;
        let lower = require_latest(latest, &plan.scalars[1].label)?;

        let chart = LineChart {
            title: vec![
                format!("{} vs {}", merged.left_label, merged.right_label),
                format!("{} - {}", first.format("%b %Y"), last.format("%b %Y")),
            ],
            categories: merged.rows.iter().map(|r| r.label.clone()).collect(),
            series: vec![
                ChartSeries {
                    name: merged.left_label.clone(),
                    values: merged.rows.iter().map(|r| r.left.number).collect(),
                },
                ChartSeries {
                    name: merged.right_label.clone(),
                    values: merged.rows.iter().map(|r| r.right.number).collect(),
                },
            ],
            style: ChartStyle::default(),
        };

        let notes = plan
            .scalars
            .iter()
            .zip([upper, lower])
            .map(|(spec, value)| format!("{} Data: {} ({})", spec.label, value.label, value.value))
            .collect();

        Ok(Self {
            scalars: [plan.scalars[0].display(&upper.value), plan.scalars[1].display(&lower.value)],
            chart,
            commentary: commentary.to_string(),
            notes,
        })
    }
}

/// Where the new slide landed in the output package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    pub slide_part: String,
    pub slide_id: u32,
    pub layout_part: String,
}

/// Open `template`, append one slide built from `content`, and save to `output`.
pub fn render_deck(
    template: &Path,
    output: &Path,
    layout_index: usize,
    geometry: &SlideGeometry,
    content: &SlideContent,
) -> Result<RenderSummary, AppError> {
    let mut pkg = Package::open(template)?;
    let summary = add_slide(&mut pkg, layout_index, geometry, content)?;
    pkg.save(output)?;

    tracing::info!(
        output = %output.display(),
        slide = %summary.slide_part,
        layout = %summary.layout_part,
        "Wrote deck"
    );
    Ok(summary)
}

/// Append the slide, its chart and its notes to an open package.
pub fn add_slide(
    pkg: &mut Package,
    layout_index: usize,
    geometry: &SlideGeometry,
    content: &SlideContent,
) -> Result<RenderSummary, AppError> {
    let mut parts = PresentationParts::inspect(pkg)?;
    let layout = parts.layout(layout_index)?.to_string();

    let slide_part = pkg.next_part_name("ppt/slides/slide");
    let chart_part = pkg.next_part_name("ppt/charts/chart");
    let notes_part = pkg.next_part_name("ppt/notesSlides/notesSlide");

    // Relationships first so the slide XML can reference the chart id.
    pkg.add_relationship(&slide_part, REL_SLIDE_LAYOUT, &layout)?;
    let chart_rid = pkg.add_relationship(&slide_part, REL_CHART, &chart_part)?;

    let mut shapes: Vec<SlideShape> = slide::layout_placeholders(pkg.xml_part(&layout)?)?
        .into_iter()
        .map(SlideShape::Placeholder)
        .collect();
    let first_id = shapes.len() as u32 + 2;
    shapes.extend([
        SlideShape::TextBox(TextBox::headline(
            &format!("TextBox {}", first_id - 1),
            geometry.upper_scalar,
            &content.scalars[0],
            HEADLINE_PT,
        )),
        SlideShape::TextBox(TextBox::headline(
            &format!("TextBox {first_id}"),
            geometry.lower_scalar,
            &content.scalars[1],
            HEADLINE_PT,
        )),
        SlideShape::Chart(ChartFrame {
            name: format!("Chart {}", first_id + 1),
            frame: geometry.chart,
            rel_id: chart_rid,
        }),
        SlideShape::TextBox(TextBox::plain(
            &format!("TextBox {}", first_id + 2),
            geometry.commentary,
            &content.commentary,
        )),
    ]);

    pkg.set_part(&slide_part, slide::slide_xml(&shapes)?);
    pkg.register_override(&slide_part, CT_SLIDE)?;

    pkg.set_part(&chart_part, content.chart.to_xml()?);
    pkg.register_override(&chart_part, CT_CHART)?;

    let notes_master = presentation::ensure_notes_master(pkg, &mut parts)?;
    pkg.set_part(&notes_part, notes::notes_slide_xml(&content.notes)?);
    pkg.add_relationship(&notes_part, REL_NOTES_MASTER, &notes_master)?;
    pkg.add_relationship(&notes_part, REL_SLIDE, &slide_part)?;
    pkg.add_relationship(&slide_part, REL_NOTES_SLIDE, &notes_part)?;
    pkg.register_override(&notes_part, CT_NOTES_SLIDE)?;

    let slide_id = presentation::add_slide(pkg, &parts, &slide_part)?;

    Ok(RenderSummary {
        slide_part,
        slide_id,
        layout_part: layout,
    })
}
