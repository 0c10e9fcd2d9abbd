//! Presentation-level structure: master, layouts, slide list and notes master.

use crate::deck::notes;
use crate::deck::package::{
    CT_NOTES_MASTER, CT_THEME, Package, REL_NOTES_MASTER, REL_OFFICE_DOCUMENT, REL_SLIDE, REL_THEME,
};
use crate::deck::xml::{self, ElementSpan, escape};
use crate::error::AppError;

/// Slide ids start at 256 per the PresentationML schema.
const MIN_SLIDE_ID: u32 = 256;

/// The parts of a template that slide creation depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationParts {
    pub main: String,
    pub master: String,
    /// Layouts of the first slide master, in master order.
    pub layouts: Vec<String>,
    pub notes_master: Option<String>,
}

impl PresentationParts {
    pub fn inspect(pkg: &Package) -> Result<Self, AppError> {
        let main = pkg
            .related_part("", REL_OFFICE_DOCUMENT)?
            .ok_or_else(|| AppError::Render("Package has no main presentation part".to_string()))?;
        let pres_xml = pkg.xml_part(&main)?;

        let master_rid = first_rel_id(pres_xml, "sldMasterId")?
            .ok_or_else(|| AppError::Render("Presentation has no slide master".to_string()))?;
        let master = target_by_id(pkg, &main, &master_rid)?;

        let master_xml = pkg.xml_part(&master)?;
        let layouts = xml::collect_attributes(master_xml, "sldLayoutId")?
            .into_iter()
            .filter_map(|attrs| attrs.get("r:id").cloned())
            .map(|rid| target_by_id(pkg, &master, &rid))
            .collect::<Result<Vec<_>, _>>()?;

        let notes_master = match first_rel_id(pres_xml, "notesMasterId")? {
            Some(rid) => Some(target_by_id(pkg, &main, &rid)?),
            None => None,
        };

        tracing::debug!(%main, %master, layouts = layouts.len(), "Inspected template");
        Ok(Self {
            main,
            master,
            layouts,
            notes_master,
        })
    }

    pub fn layout(&self, index: usize) -> Result<&str, AppError> {
        self.layouts.get(index).map(String::as_str).ok_or_else(|| {
            AppError::Render(format!(
                "Layout index {index} out of range; template master has {} layout(s)",
                self.layouts.len()
            ))
        })
    }
}

fn first_rel_id(xml: &str, local: &str) -> Result<Option<String>, AppError> {
    Ok(xml::collect_attributes(xml, local)?
        .into_iter()
        .find_map(|mut attrs| attrs.remove("r:id")))
}

fn target_by_id(pkg: &Package, source: &str, rid: &str) -> Result<String, AppError> {
    pkg.relationships(source)?
        .into_iter()
        .find(|r| r.id == rid)
        .map(|r| crate::deck::package::resolve_target(source, &r.target))
        .ok_or_else(|| AppError::Render(format!("{source} references missing relationship {rid}")))
}

/// Namespace prefix (with colon) of the element at `span`, e.g. `p:`.
fn prefix_at(xml: &str, span: &ElementSpan) -> String {
    let name: String = xml[span.start + 1..]
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '>' && *c != '/')
        .collect();
    match name.split_once(':') {
        Some((prefix, _)) => format!("{prefix}:"),
        None => String::new(),
    }
}

/// Append `slide` to the presentation's slide list and return its slide id.
pub fn add_slide(pkg: &mut Package, parts: &PresentationParts, slide: &str) -> Result<u32, AppError> {
    let rid = pkg.add_relationship(&parts.main, REL_SLIDE, slide)?;
    let pres_xml = pkg.xml_part(&parts.main)?;

    let slide_id = xml::collect_attributes(pres_xml, "sldId")?
        .iter()
        .filter_map(|attrs| attrs.get("id")?.parse::<u32>().ok())
        .max()
        .map_or(MIN_SLIDE_ID, |max| (max + 1).max(MIN_SLIDE_ID));

    let master_span = xml::find_element(pres_xml, "sldMasterIdLst")?
        .ok_or_else(|| AppError::Render("Presentation has no sldMasterIdLst".to_string()))?;
    let p = prefix_at(pres_xml, &master_span);
    let entry = format!(r#"<{p}sldId id="{slide_id}" r:id="{}"/>"#, escape(&rid));

    let updated = match xml::append_child(pres_xml, "sldIdLst", &entry)? {
        Some(updated) => updated,
        None => {
            // sldIdLst follows the master id lists.
            let mut after = master_span.end;
            for local in ["notesMasterIdLst", "handoutMasterIdLst"] {
                if let Some(span) = xml::find_element(pres_xml, local)? {
                    after = after.max(span.end);
                }
            }
            xml::splice(pres_xml, after, &format!("<{p}sldIdLst>{entry}</{p}sldIdLst>"))
        }
    };
    pkg.set_part(&parts.main, updated);

    tracing::debug!(slide, slide_id, %rid, "Registered slide");
    Ok(slide_id)
}

/// Return the notes master, creating one when the template has none.
///
/// A new notes master gets its own copy of the slide master's theme.
pub fn ensure_notes_master(pkg: &mut Package, parts: &mut PresentationParts) -> Result<String, AppError> {
    if let Some(existing) = &parts.notes_master {
        return Ok(existing.clone());
    }

    let theme_source = pkg
        .related_part(&parts.master, REL_THEME)?
        .ok_or_else(|| AppError::Render(format!("{} has no theme", parts.master)))?;
    let theme_data = pkg
        .part(&theme_source)
        .ok_or_else(|| AppError::Render(format!("Template is missing part '{theme_source}'")))?
        .to_vec();
    let theme = pkg.next_part_name("ppt/theme/theme");
    pkg.set_part(&theme, theme_data);
    pkg.register_override(&theme, CT_THEME)?;

    let notes_master = pkg.next_part_name("ppt/notesMasters/notesMaster");
    pkg.set_part(&notes_master, notes::notes_master_xml());
    pkg.add_relationship(&notes_master, REL_THEME, &theme)?;
    pkg.register_override(&notes_master, CT_NOTES_MASTER)?;

    let rid = pkg.add_relationship(&parts.main, REL_NOTES_MASTER, &notes_master)?;
    let pres_xml = pkg.xml_part(&parts.main)?;
    let master_span = xml::find_element(pres_xml, "sldMasterIdLst")?
        .ok_or_else(|| AppError::Render("Presentation has no sldMasterIdLst".to_string()))?;
    let p = prefix_at(pres_xml, &master_span);
    let fragment = format!(
        r#"<{p}notesMasterIdLst><{p}notesMasterId r:id="{}"/></{p}notesMasterIdLst>"#,
        escape(&rid)
    );
    let updated = xml::splice(pres_xml, master_span.end, &fragment);
    pkg.set_part(&parts.main, updated);

    tracing::info!(%notes_master, "Template had no notes master; created one");
    parts.notes_master = Some(notes_master.clone());
    Ok(notes_master)
}
