//! Line chart part XML.
//!
//! Category and value data are written as literals (`c:strLit` / `c:numLit`)
//! so the chart needs no embedded workbook.

use std::fmt::Write as FmtWrite;

use crate::deck::xml::{escape, xml_error};
use crate::error::AppError;

const CAT_AXIS_ID: u32 = 2_094_734_552;
const VAL_AXIS_ID: u32 = 2_094_734_553;

/// One chart series. `None` values are left as gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Font sizes in points and the value axis number format.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub title_pt: f64,
    pub legend_pt: f64,
    pub tick_label_pt: f64,
    pub value_format: String,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            title_pt: 14.0,
            legend_pt: 12.0,
            tick_label_pt: 11.0,
            value_format: "#,##0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    /// Title paragraphs.
    pub title: Vec<String>,
    pub categories: Vec<String>,
    pub series: Vec<ChartSeries>,
    pub style: ChartStyle,
}

fn hundredths(pt: f64) -> u32 {
    (pt * 100.0).round() as u32
}

fn text_props(xml: &mut String, pt: f64) -> Result<(), AppError> {
    write!(
        xml,
        r#"<c:txPr><a:bodyPr/><a:lstStyle/><a:p><a:pPr><a:defRPr sz="{}"/></a:pPr><a:endParaRPr lang="en-US"/></a:p></c:txPr>"#,
        hundredths(pt)
    )
    .map_err(xml_error)
}

impl LineChart {
    pub fn to_xml(&self) -> Result<String, AppError> {
        let points = self.categories.len();
        let mut xml = String::with_capacity(4096 + points * 96 * (self.series.len() + 1));

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(r#"<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" "#);
        xml.push_str(r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#);
        xml.push_str(r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
        xml.push_str(r#"<c:date1904 val="0"/><c:lang val="en-US"/><c:roundedCorners val="0"/>"#);
        xml.push_str("<c:chart>");

        self.write_title(&mut xml)?;
        xml.push_str(r#"<c:autoTitleDeleted val="0"/>"#);

        xml.push_str("<c:plotArea><c:layout/>");
        xml.push_str(r#"<c:lineChart><c:grouping val="standard"/><c:varyColors val="0"/>"#);
        for (idx, series) in self.series.iter().enumerate() {
            self.write_series(&mut xml, idx, series)?;
        }
        xml.push_str(r#"<c:marker val="1"/>"#);
        write!(xml, r#"<c:axId val="{CAT_AXIS_ID}"/><c:axId val="{VAL_AXIS_ID}"/>"#).map_err(xml_error)?;
        xml.push_str("</c:lineChart>");

        self.write_category_axis(&mut xml)?;
        self.write_value_axis(&mut xml)?;
        xml.push_str("</c:plotArea>");

        // Legend at the bottom, outside the plot area.
        xml.push_str(r#"<c:legend><c:legendPos val="b"/><c:overlay val="0"/>"#);
        text_props(&mut xml, self.style.legend_pt)?;
        xml.push_str("</c:legend>");

        xml.push_str(r#"<c:plotVisOnly val="1"/><c:dispBlanksAs val="gap"/>"#);
        xml.push_str("</c:chart>");
        xml.push_str("</c:chartSpace>");
        Ok(xml)
    }

    fn write_title(&self, xml: &mut String) -> Result<(), AppError> {
        let sz = hundredths(self.style.title_pt);
        xml.push_str("<c:title><c:tx><c:rich><a:bodyPr/><a:lstStyle/>");
        for line in &self.title {
            write!(
                xml,
                r#"<a:p><a:pPr><a:defRPr sz="{sz}"/></a:pPr><a:r><a:rPr lang="en-US" sz="{sz}"/><a:t>{}</a:t></a:r></a:p>"#,
                escape(line)
            )
            .map_err(xml_error)?;
        }
        xml.push_str(r#"</c:rich></c:tx><c:overlay val="0"/></c:title>"#);
        Ok(())
    }

    fn write_series(&self, xml: &mut String, idx: usize, series: &ChartSeries) -> Result<(), AppError> {
        xml.push_str("<c:ser>");
        write!(xml, r#"<c:idx val="{idx}"/><c:order val="{idx}"/>"#).map_err(xml_error)?;
        write!(xml, "<c:tx><c:v>{}</c:v></c:tx>", escape(&series.name)).map_err(xml_error)?;
        xml.push_str(r#"<c:marker><c:symbol val="none"/></c:marker>"#);

        xml.push_str("<c:cat><c:strLit>");
        write!(xml, r#"<c:ptCount val="{}"/>"#, self.categories.len()).map_err(xml_error)?;
        for (i, category) in self.categories.iter().enumerate() {
            write!(xml, r#"<c:pt idx="{i}"><c:v>{}</c:v></c:pt>"#, escape(category)).map_err(xml_error)?;
        }
        xml.push_str("</c:strLit></c:cat>");

        xml.push_str("<c:val><c:numLit><c:formatCode>General</c:formatCode>");
        write!(xml, r#"<c:ptCount val="{}"/>"#, series.values.len()).map_err(xml_error)?;
        for (i, value) in series.values.iter().enumerate() {
            if let Some(v) = value {
                write!(xml, r#"<c:pt idx="{i}"><c:v>{v}</c:v></c:pt>"#).map_err(xml_error)?;
            }
        }
        xml.push_str("</c:numLit></c:val>");

        xml.push_str(r#"<c:smooth val="0"/>"#);
        xml.push_str("</c:ser>");
        Ok(())
    }

    fn write_category_axis(&self, xml: &mut String) -> Result<(), AppError> {
        xml.push_str("<c:catAx>");
        write!(xml, r#"<c:axId val="{CAT_AXIS_ID}"/>"#).map_err(xml_error)?;
        xml.push_str(r#"<c:scaling><c:orientation val="minMax"/></c:scaling>"#);
        xml.push_str(r#"<c:delete val="0"/><c:axPos val="b"/>"#);
        xml.push_str(r#"<c:majorTickMark val="out"/><c:minorTickMark val="none"/><c:tickLblPos val="nextTo"/>"#);
        text_props(xml, self.style.tick_label_pt)?;
        write!(xml, r#"<c:crossAx val="{VAL_AXIS_ID}"/>"#).map_err(xml_error)?;
        xml.push_str(r#"<c:crosses val="autoZero"/><c:auto val="1"/><c:lblAlgn val="ctr"/>"#);
        xml.push_str(r#"<c:lblOffset val="100"/><c:noMultiLvlLbl val="0"/>"#);
        xml.push_str("</c:catAx>");
        Ok(())
    }

    fn write_value_axis(&self, xml: &mut String) -> Result<(), AppError> {
        xml.push_str("<c:valAx>");
        write!(xml, r#"<c:axId val="{VAL_AXIS_ID}"/>"#).map_err(xml_error)?;
        xml.push_str(r#"<c:scaling><c:orientation val="minMax"/></c:scaling>"#);
        xml.push_str(r#"<c:delete val="0"/><c:axPos val="l"/><c:majorGridlines/>"#);
        write!(
            xml,
            r#"<c:numFmt formatCode="{}" sourceLinked="0"/>"#,
            escape(&self.style.value_format)
        )
        .map_err(xml_error)?;
        xml.push_str(r#"<c:majorTickMark val="out"/><c:minorTickMark val="none"/><c:tickLblPos val="nextTo"/>"#);
        text_props(xml, self.style.tick_label_pt)?;
        write!(xml, r#"<c:crossAx val="{CAT_AXIS_ID}"/>"#).map_err(xml_error)?;
        xml.push_str(r#"<c:crosses val="autoZero"/><c:crossBetween val="between"/>"#);
        xml.push_str("</c:valAx>");
        Ok(())
    }
}
