//! Slide part XML: cloned layout placeholders, text boxes and the chart frame.

use std::fmt::Write as FmtWrite;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::deck::xml::{self, escape, xml_error};
use crate::error::AppError;

pub const EMU_PER_INCH: f64 = 914_400.0;

/// Placeholder types that belong to the master chrome, not to slide content.
const SKIPPED_PLACEHOLDERS: [&str; 3] = ["dt", "ftr", "sldNum"];
/// Placeholder types that hold graphics rather than text.
const GRAPHIC_PLACEHOLDERS: [&str; 6] = ["pic", "chart", "tbl", "dgm", "media", "clipArt"];
/// `p:ph` attributes carried over from the layout.
const PLACEHOLDER_ATTRS: [&str; 4] = ["type", "orient", "sz", "idx"];

/// Shape position and size in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Frame {
    pub fn inches(x: f64, y: f64, width: f64, height: f64) -> Self {
        let emu = |v: f64| (v * EMU_PER_INCH).round() as i64;
        Self {
            x: emu(x),
            y: emu(y),
            cx: emu(width),
            cy: emu(height),
        }
    }

    fn write_xfrm(&self, xml: &mut String) -> Result<(), AppError> {
        write!(
            xml,
            r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
            self.x, self.y, self.cx, self.cy
        )
        .map_err(xml_error)
    }
}

/// How a text body relates to its shape size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFit {
    /// Grow the shape to fit the text (`a:spAutoFit`).
    ShapeToFit,
    /// Shrink the text when it overflows the shape (`a:normAutofit`).
    ShrinkOnOverflow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub name: String,
    pub frame: Frame,
    pub paragraphs: Vec<String>,
    pub size_pt: Option<f64>,
    pub centered: bool,
    pub anchor_middle: bool,
    pub wrap: bool,
    pub fit: TextFit,
}

impl TextBox {
    /// A plain text box, sized to its text, like a freshly inserted one.
    pub fn plain(name: &str, frame: Frame, text: &str) -> Self {
        Self {
            name: name.to_string(),
            frame,
            paragraphs: text.split('\n').map(str::to_string).collect(),
            size_pt: None,
            centered: false,
            anchor_middle: false,
            wrap: false,
            fit: TextFit::ShapeToFit,
        }
    }

    /// A large centered figure that shrinks to stay inside its box.
    pub fn headline(name: &str, frame: Frame, text: &str, size_pt: f64) -> Self {
        Self {
            size_pt: Some(size_pt),
            centered: true,
            anchor_middle: true,
            wrap: true,
            fit: TextFit::ShrinkOnOverflow,
            ..Self::plain(name, frame, text)
        }
    }

    fn write(&self, xml: &mut String, id: u32) -> Result<(), AppError> {
        xml.push_str("<p:sp><p:nvSpPr>");
        write!(xml, r#"<p:cNvPr id="{id}" name="{}"/>"#, escape(&self.name)).map_err(xml_error)?;
        xml.push_str(r#"<p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#);

        xml.push_str("<p:spPr>");
        self.frame.write_xfrm(xml)?;
        xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#);

        xml.push_str("<p:txBody>");
        write!(xml, r#"<a:bodyPr wrap="{}" rtlCol="0""#, if self.wrap { "square" } else { "none" })
            .map_err(xml_error)?;
        if self.anchor_middle {
            xml.push_str(r#" anchor="ctr""#);
        }
        xml.push('>');
        xml.push_str(match self.fit {
            TextFit::ShapeToFit => "<a:spAutoFit/>",
            TextFit::ShrinkOnOverflow => "<a:normAutofit/>",
        });
        xml.push_str("</a:bodyPr><a:lstStyle/>");

        for paragraph in &self.paragraphs {
            xml.push_str("<a:p>");
            if self.centered {
                xml.push_str(r#"<a:pPr algn="ctr"/>"#);
            }
            xml.push_str("<a:r>");
            match self.size_pt {
                Some(pt) => write!(xml, r#"<a:rPr lang="en-US" sz="{}" dirty="0"/>"#, (pt * 100.0).round() as u32)
                    .map_err(xml_error)?,
                None => xml.push_str(r#"<a:rPr lang="en-US" dirty="0"/>"#),
            }
            write!(xml, "<a:t>{}</a:t>", escape(paragraph)).map_err(xml_error)?;
            xml.push_str("</a:r></a:p>");
        }
        xml.push_str("</p:txBody></p:sp>");
        Ok(())
    }
}

/// A content placeholder inherited from the slide layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    /// `p:ph` attributes, in `type, orient, sz, idx` order.
    pub ph: Vec<(String, String)>,
}

impl Placeholder {
    fn ph_type(&self) -> &str {
        self.ph
            .iter()
            .find(|(k, _)| k == "type")
            .map(|(_, v)| v.as_str())
            .unwrap_or("obj")
    }

    fn write(&self, xml: &mut String, id: u32) -> Result<(), AppError> {
        xml.push_str("<p:sp><p:nvSpPr>");
        write!(xml, r#"<p:cNvPr id="{id}" name="{}"/>"#, escape(&self.name)).map_err(xml_error)?;
        xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph"#);
        for (key, value) in &self.ph {
            write!(xml, r#" {key}="{}""#, escape(value)).map_err(xml_error)?;
        }
        xml.push_str("/></p:nvPr></p:nvSpPr><p:spPr/>");
        if !GRAPHIC_PLACEHOLDERS.contains(&self.ph_type()) {
            xml.push_str(r#"<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody>"#);
        }
        xml.push_str("</p:sp>");
        Ok(())
    }
}

/// Content placeholders declared by a layout, in document order.
pub fn layout_placeholders(layout_xml: &str) -> Result<Vec<Placeholder>, AppError> {
    let mut reader = Reader::from_str(layout_xml);
    let mut out = Vec::new();
    let mut sp_depth = 0usize;
    let mut name = String::new();
    let mut ph: Option<Vec<(String, String)>> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) if e.local_name().as_ref() == b"sp" => {
                sp_depth += 1;
                if sp_depth == 1 {
                    name.clear();
                    ph = None;
                }
            }
            Event::Start(e) | Event::Empty(e) if sp_depth == 1 => match e.local_name().as_ref() {
                b"cNvPr" => {
                    if let Some(n) = xml::attributes(&e)?.remove("name") {
                        name = n;
                    }
                }
                b"ph" => {
                    let attrs = xml::attributes(&e)?;
                    ph = Some(
                        PLACEHOLDER_ATTRS
                            .iter()
                            .filter_map(|k| attrs.get(*k).map(|v| (k.to_string(), v.clone())))
                            .collect(),
                    );
                }
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"sp" => {
                sp_depth = sp_depth.saturating_sub(1);
                if sp_depth == 0
                    && let Some(attrs) = ph.take()
                {
                    let placeholder = Placeholder {
                        name: std::mem::take(&mut name),
                        ph: attrs,
                    };
                    if !SKIPPED_PLACEHOLDERS.contains(&placeholder.ph_type()) {
                        out.push(placeholder);
                    }
                }
            }
            Event::Eof => return Ok(out),
            _ => {}
        }
    }
}

/// A chart graphic frame referencing a chart part through `rel_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartFrame {
    pub name: String,
    pub frame: Frame,
    pub rel_id: String,
}

impl ChartFrame {
    fn write(&self, xml: &mut String, id: u32) -> Result<(), AppError> {
        xml.push_str("<p:graphicFrame><p:nvGraphicFramePr>");
        write!(xml, r#"<p:cNvPr id="{id}" name="{}"/>"#, escape(&self.name)).map_err(xml_error)?;
        xml.push_str(r#"<p:cNvGraphicFramePr><a:graphicFrameLocks noGrp="1"/></p:cNvGraphicFramePr><p:nvPr/>"#);
        xml.push_str("</p:nvGraphicFramePr>");
        write!(
            xml,
            r#"<p:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></p:xfrm>"#,
            self.frame.x, self.frame.y, self.frame.cx, self.frame.cy
        )
        .map_err(xml_error)?;
        xml.push_str(r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart">"#);
        write!(
            xml,
            r#"<c:chart xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" r:id="{}"/>"#,
            escape(&self.rel_id)
        )
        .map_err(xml_error)?;
        xml.push_str("</a:graphicData></a:graphic></p:graphicFrame>");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlideShape {
    Placeholder(Placeholder),
    TextBox(TextBox),
    Chart(ChartFrame),
}

/// Slide XML with shapes in z-order. Shape ids start at 2; the tree root is 1.
pub fn slide_xml(shapes: &[SlideShape]) -> Result<String, AppError> {
    let mut xml = String::with_capacity(4096);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#);
    xml.push_str(r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#);
    xml.push_str(r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">"#);
    xml.push_str("<p:cSld><p:spTree>");
    xml.push_str(r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#);
    xml.push_str(r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#);
    xml.push_str(r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#);

    for (shape, id) in shapes.iter().zip(2u32..) {
        match shape {
            SlideShape::Placeholder(p) => p.write(&mut xml, id)?,
            SlideShape::TextBox(t) => t.write(&mut xml, id)?,
            SlideShape::Chart(c) => c.write(&mut xml, id)?,
        }
    }

    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>"#);
    xml.push_str("</p:sld>");
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::fixtures;

    #[test]
    fn frame_converts_inches_to_emu() {
        let f = Frame::inches(1.25, 2.2, 2.6, 1.0);
        assert_eq!(f, Frame { x: 1_143_000, y: 2_011_680, cx: 2_377_440, cy: 914_400 });
    }

    #[test]
    fn headline_box_is_centered_anchored_and_shrinks() {
        let shapes = [SlideShape::TextBox(TextBox::headline(
            "TextBox 1",
            Frame::inches(1.25, 2.2, 2.6, 1.0),
            "3.9%",
            60.0,
        ))];
        let xml = slide_xml(&shapes).unwrap();
        assert!(xml.contains(r#"<a:bodyPr wrap="square" rtlCol="0" anchor="ctr"><a:normAutofit/></a:bodyPr>"#));
        assert!(xml.contains(r#"<a:pPr algn="ctr"/><a:r><a:rPr lang="en-US" sz="6000" dirty="0"/><a:t>3.9%</a:t>"#));
        assert!(xml.contains(r#"<p:cNvPr id="2" name="TextBox 1"/>"#));
    }

    #[test]
    fn plain_box_escapes_text() {
        let shapes = [SlideShape::TextBox(TextBox::plain(
            "TextBox 3",
            Frame::inches(0.81, 6.21, 11.72, 1.0),
            "Jobs & <wages>",
        ))];
        let xml = slide_xml(&shapes).unwrap();
        assert!(xml.contains("<a:t>Jobs &amp; &lt;wages&gt;</a:t>"));
        assert!(xml.contains("<a:spAutoFit/>"));
    }

    #[test]
    fn chart_frame_references_relationship() {
        let shapes = [SlideShape::Chart(ChartFrame {
            name: "Chart 1".to_string(),
            frame: Frame::inches(5.4, 1.55, 7.0, 4.4),
            rel_id: "rId2".to_string(),
        })];
        let xml = slide_xml(&shapes).unwrap();
        assert!(xml.contains(r#"r:id="rId2"/>"#));
        assert!(xml.contains("<p:graphicFrame>"));
    }

    #[test]
    fn layout_placeholders_skip_master_chrome() {
        let placeholders = layout_placeholders(fixtures::SECTION_HEADER_LAYOUT).unwrap();
        let names: Vec<&str> = placeholders.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Title 1", "Text Placeholder 2"]);
        assert_eq!(placeholders[0].ph, vec![("type".to_string(), "title".to_string())]);
        assert_eq!(
            placeholders[1].ph,
            vec![("type".to_string(), "body".to_string()), ("idx".to_string(), "1".to_string())]
        );

        let xml = slide_xml(&[SlideShape::Placeholder(placeholders[1].clone())]).unwrap();
        assert!(xml.contains(r#"<p:ph type="body" idx="1"/>"#));
        assert!(xml.contains("<p:txBody>"));
    }
}
