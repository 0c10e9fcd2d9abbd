//! OPC package access: zip parts, relationships and content types.

use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::deck::xml::{self, escape, xml_error};
use crate::error::AppError;

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub const REL_NOTES_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster";
pub const REL_NOTES_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
pub const REL_CHART: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
pub const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";

pub const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
pub const CT_NOTES_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml";
pub const CT_NOTES_MASTER: &str = "application/vnd.openxmlformats-officedocument.presentationml.notesMaster+xml";
pub const CT_CHART: &str = "application/vnd.openxmlformats-officedocument.drawingml.chart+xml";
pub const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";

/// A relationship entry from a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

/// An in-memory OPC package. Part names carry no leading slash.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::Render(format!("Failed to open template '{}': {e}", path.display())))?;
        Self::from_reader(file)
            .map_err(|e| AppError::Render(format!("Template '{}' is not a valid package: {e}", path.display())))
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, AppError> {
        let mut archive = ZipArchive::new(reader).map_err(|e| AppError::Render(e.to_string()))?;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|e| AppError::Render(e.to_string()))?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut data)
                .map_err(|e| AppError::Render(format!("Failed to read part '{name}': {e}")))?;
            parts.push((name, data));
        }
        if !parts.iter().any(|(n, _)| n == CONTENT_TYPES_PART) {
            return Err(AppError::Render(format!("missing {CONTENT_TYPES_PART}")));
        }
        tracing::debug!(parts = parts.len(), "Loaded package");
        Ok(Self { parts })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|(n, _)| n == name)
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// A part decoded as UTF-8 XML.
    pub fn xml_part(&self, name: &str) -> Result<&str, AppError> {
        let data = self
            .part(name)
            .ok_or_else(|| AppError::Render(format!("Template is missing part '{name}'")))?;
        std::str::from_utf8(data).map_err(|e| AppError::Render(format!("Part '{name}' is not UTF-8: {e}")))
    }

    pub fn set_part(&mut self, name: &str, data: impl Into<Vec<u8>>) {
        let data = data.into();
        match self.parts.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = data,
            None => {
                tracing::debug!(part = name, "Adding part");
                self.parts.push((name.to_string(), data));
            }
        }
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(n, _)| n.as_str())
    }

    /// First unused part name of the form `{stem}{n}.xml`, counting from 1.
    pub fn next_part_name(&self, stem: &str) -> String {
        (1..)
            .map(|n| format!("{stem}{n}.xml"))
            .find(|name| !self.contains(name))
            .unwrap_or_else(|| format!("{stem}.xml"))
    }

    /// Relationships of a part (`""` for the package root). Missing `.rels` means none.
    pub fn relationships(&self, source: &str) -> Result<Vec<Relationship>, AppError> {
        let rels_name = rels_part_name(source);
        if !self.contains(&rels_name) {
            return Ok(Vec::new());
        }
        parse_relationships(self.xml_part(&rels_name)?)
    }

    /// Resolve the target part of the first relationship of `rel_type` from `source`.
    pub fn related_part(&self, source: &str, rel_type: &str) -> Result<Option<String>, AppError> {
        Ok(self
            .relationships(source)?
            .into_iter()
            .find(|r| r.rel_type == rel_type && !r.external)
            .map(|r| resolve_target(source, &r.target)))
    }

    /// Add a relationship from `source` to the part `target` and return its id.
    pub fn add_relationship(&mut self, source: &str, rel_type: &str, target: &str) -> Result<String, AppError> {
        let mut rels = self.relationships(source)?;
        let id = next_rel_id(&rels);
        rels.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: relative_target(source, target),
            external: false,
        });
        self.set_part(&rels_part_name(source), relationships_xml(&rels)?);
        Ok(id)
    }

    /// Register a content-type override for a new part.
    pub fn register_override(&mut self, part: &str, content_type: &str) -> Result<(), AppError> {
        let types = self.xml_part(CONTENT_TYPES_PART)?;
        let part_name = format!("/{part}");
        let known = xml::collect_attributes(types, "Override")?
            .iter()
            .any(|attrs| attrs.get("PartName").is_some_and(|p| p.eq_ignore_ascii_case(&part_name)));
        if known {
            return Ok(());
        }
        let fragment = format!(
            r#"<Override PartName="{}" ContentType="{}"/>"#,
            escape(&part_name),
            escape(content_type)
        );
        let updated = xml::append_child(types, "Types", &fragment)?
            .ok_or_else(|| AppError::Render(format!("{CONTENT_TYPES_PART} has no Types element")))?;
        self.set_part(CONTENT_TYPES_PART, updated);
        Ok(())
    }

    /// Serialize the package to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        let file = File::create(path)
            .map_err(|e| AppError::Render(format!("Failed to create '{}': {e}", path.display())))?;
        self.write_to(file)
            .map_err(|e| AppError::Render(format!("Failed to write '{}': {e}", path.display())))
    }

    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<(), AppError> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        // Content types first, as Office writes them.
        let ordered = self
            .parts
            .iter()
            .filter(|(n, _)| n == CONTENT_TYPES_PART)
            .chain(self.parts.iter().filter(|(n, _)| n != CONTENT_TYPES_PART));
        for (name, data) in ordered {
            zip.start_file(name.as_str(), options)
                .map_err(|e| AppError::Render(e.to_string()))?;
            zip.write_all(data).map_err(|e| AppError::Render(e.to_string()))?;
        }
        zip.finish().map_err(|e| AppError::Render(e.to_string()))?;
        Ok(())
    }
}

/// `ppt/slides/slide1.xml` -> `ppt/slides/_rels/slide1.xml.rels`; `""` -> `_rels/.rels`.
pub fn rels_part_name(source: &str) -> String {
    match source.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None if source.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{source}.rels"),
    }
}

fn base_dir(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve a relationship target against the directory of its source part.
pub fn resolve_target(source: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir(source).split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Relative path from the directory of `source` to `target`.
pub fn relative_target(source: &str, target: &str) -> String {
    let from: Vec<&str> = base_dir(source).split('/').filter(|s| !s.is_empty()).collect();
    let to: Vec<&str> = target.split('/').collect();
    let (to_dir, to_file) = to.split_at(to.len() - 1);

    let common = from.iter().zip(to_dir).take_while(|(a, b)| a == b).count();
    let mut parts: Vec<&str> = std::iter::repeat_n("..", from.len() - common).collect();
    parts.extend_from_slice(&to_dir[common..]);
    parts.extend_from_slice(to_file);
    parts.join("/")
}

pub fn parse_relationships(xml: &str) -> Result<Vec<Relationship>, AppError> {
    xml::collect_attributes(xml, "Relationship")?
        .into_iter()
        .map(|mut attrs| {
            let mut take = |key: &str| {
                attrs
                    .remove(key)
                    .ok_or_else(|| AppError::Render(format!("Relationship without {key}")))
            };
            let id = take("Id")?;
            let rel_type = take("Type")?;
            let target = take("Target")?;
            let external = attrs.get("TargetMode").is_some_and(|m| m == "External");
            Ok(Relationship {
                id,
                rel_type,
                target,
                external,
            })
        })
        .collect()
}

/// Next `rIdN` after the highest numeric id in use.
pub fn next_rel_id(rels: &[Relationship]) -> String {
    let max = rels
        .iter()
        .filter_map(|r| r.id.strip_prefix("rId")?.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("rId{}", max + 1)
}

pub fn relationships_xml(rels: &[Relationship]) -> Result<String, AppError> {
    let mut xml = String::with_capacity(256 + rels.len() * 160);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    for rel in rels {
        write!(
            xml,
            r#"<Relationship Id="{}" Type="{}" Target="{}""#,
            escape(&rel.id),
            escape(&rel.rel_type),
            escape(&rel.target)
        )
        .map_err(xml_error)?;
        if rel.external {
            xml.push_str(r#" TargetMode="External""#);
        }
        xml.push_str("/>");
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}
