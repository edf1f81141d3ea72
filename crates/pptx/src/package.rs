//! PPTX package access: the container reader.
//!
//! A `.pptx` file is a ZIP archive of XML parts linked by relationship
//! parts. [`Package`] owns the archive for the duration of one extraction
//! and lists the slide parts in presentation order.

use deck_core::{OpenError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

use crate::shapes::{self, Shape};

const PACKAGE_RELS: &str = "_rels/.rels";
const DEFAULT_PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Relationship type suffixes.
pub(crate) mod rel_types {
    pub const OFFICE_DOCUMENT: &str = "/officeDocument";
    pub const SLIDE: &str = "/slide";
    pub const NOTES_SLIDE: &str = "/notesSlide";
}

/// An open presentation package.
pub struct Package<R> {
    archive: ZipArchive<R>,
    slide_parts: Vec<String>,
}

impl Package<BufReader<File>> {
    /// Open a presentation from a file on disk.
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::open(BufReader::new(file))
    }
}

impl<R: Read + Seek> Package<R> {
    /// Open a presentation package from a reader.
    pub fn open(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| OpenError::Zip(format!("Failed to open ZIP: {}", e)))?;

        let mut package = Self {
            archive,
            slide_parts: Vec::new(),
        };

        let presentation_part = package.presentation_part()?;
        package.slide_parts = package.slide_order(&presentation_part)?;
        log::debug!(
            "Opened {} with {} slides",
            presentation_part,
            package.slide_parts.len()
        );

        Ok(package)
    }

    /// Number of slides in the presentation.
    pub fn slide_count(&self) -> usize {
        self.slide_parts.len()
    }

    /// Slide part names in presentation order.
    pub fn slide_parts(&self) -> &[String] {
        &self.slide_parts
    }

    /// Load the slide at `index` (0-based) together with its relationships.
    pub fn load_slide(&mut self, index: usize) -> Result<SlideContainer> {
        let part = self
            .slide_parts
            .get(index)
            .cloned()
            .ok_or_else(|| OpenError::MissingPart(format!("slide index {}", index)))?;

        let xml = self.read_part(&part)?;
        let relationships = self.read_relationships(&part, false)?;

        Ok(SlideContainer {
            part,
            xml,
            relationships,
        })
    }

    /// Read the raw bytes of a part.
    pub fn read_part(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut file = self.archive.by_name(name).map_err(|e| match e {
            zip::result::ZipError::FileNotFound => OpenError::MissingPart(name.to_string()),
            other => OpenError::Zip(format!("Failed to open '{}': {}", name, other)),
        })?;

        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Read the relationships of `part`.
    ///
    /// A missing relationships part means the part has no relationships,
    /// unless `required` is set.
    pub fn read_relationships(&mut self, part: &str, required: bool) -> Result<Relationships> {
        let rels_part = rels_part_name(part);
        match self.read_part(&rels_part) {
            Ok(xml) => parse_relationships(part, &xml).map_err(|reason| OpenError::Xml {
                part: rels_part,
                reason,
            }),
            Err(OpenError::MissingPart(_)) if !required => Ok(Relationships::default()),
            Err(e) => Err(e),
        }
    }

    /// Find the main presentation part through the package relationships.
    fn presentation_part(&mut self) -> Result<String> {
        let rels = self.read_relationships("", false)?;
        let part = rels
            .iter()
            .find(|r| r.rel_type.ends_with(rel_types::OFFICE_DOCUMENT) && !r.external)
            .map(|r| r.target.clone());

        match part {
            Some(part) => Ok(part),
            None => {
                log::debug!("No officeDocument relationship in {}, assuming default", PACKAGE_RELS);
                Ok(DEFAULT_PRESENTATION_PART.to_string())
            }
        }
    }

    /// Slide part names in `p:sldIdLst` order.
    fn slide_order(&mut self, presentation_part: &str) -> Result<Vec<String>> {
        let xml = self.read_part(presentation_part)?;
        let ids = slide_relationship_ids(&xml).map_err(|reason| OpenError::Xml {
            part: presentation_part.to_string(),
            reason,
        })?;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rels = self.read_relationships(presentation_part, true)?;
        let mut slides = Vec::with_capacity(ids.len());

        for id in ids {
            let rel = rels.get(&id).ok_or_else(|| OpenError::InvalidPart {
                part: presentation_part.to_string(),
                reason: format!("slide id refers to unknown relationship '{}'", id),
            })?;

            if rel.external || !rel.rel_type.ends_with(rel_types::SLIDE) {
                return Err(OpenError::InvalidPart {
                    part: presentation_part.to_string(),
                    reason: format!("relationship '{}' is not an internal slide", id),
                });
            }

            slides.push(rel.target.clone());
        }

        Ok(slides)
    }
}

/// One slide's XML and relationships, detached from the archive.
#[derive(Debug, Clone)]
pub struct SlideContainer {
    part: String,
    xml: Vec<u8>,
    relationships: Relationships,
}

impl SlideContainer {
    /// Part name of the slide, e.g. `ppt/slides/slide1.xml`.
    pub fn part(&self) -> &str {
        &self.part
    }

    pub fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    /// Shapes on the slide in document order.
    pub fn shapes(&self) -> Result<Vec<Shape>> {
        shapes::walk_shapes(&self.xml).map_err(|reason| OpenError::Xml {
            part: self.part.clone(),
            reason,
        })
    }
}

/// A relationship from a source part to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Resolved part name for internal targets, the raw target otherwise.
    pub target: String,
    pub external: bool,
}

/// Relationships of one source part, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    by_id: HashMap<String, Relationship>,
    order: Vec<String>,
}

impl Relationships {
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Relationships in the order they were declared.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    /// The first relationship whose type ends with `suffix`.
    pub fn find_by_type(&self, suffix: &str) -> Option<&Relationship> {
        self.iter().find(|r| r.rel_type.ends_with(suffix))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The first declaration of an id wins.
    fn insert(&mut self, rel: Relationship) {
        if let Entry::Vacant(slot) = self.by_id.entry(rel.id.clone()) {
            self.order.push(rel.id.clone());
            slot.insert(rel);
        }
    }
}

/// Parse a relationships part belonging to `source_part`.
fn parse_relationships(source_part: &str, xml: &[u8]) -> std::result::Result<Relationships, String> {
    let mut rels = Relationships::default();
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut rel_type = String::new();
                let mut target = String::new();
                let mut id = String::new();
                let mut external = false;

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Type" => {
                            rel_type = String::from_utf8_lossy(&attr.value).to_string();
                        }
                        b"Target" => {
                            target = String::from_utf8_lossy(&attr.value).to_string();
                        }
                        b"Id" => {
                            id = String::from_utf8_lossy(&attr.value).to_string();
                        }
                        b"TargetMode" => {
                            external = attr.value.as_ref() == b"External";
                        }
                        _ => {}
                    }
                }

                if !id.is_empty() {
                    let target = if external {
                        target
                    } else {
                        resolve_target(source_part, &target)
                    };

                    rels.insert(Relationship {
                        id,
                        rel_type,
                        target,
                        external,
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("Error parsing relationships: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Relationship ids of `p:sldId` entries, in document order.
fn slide_relationship_ids(xml: &[u8]) -> std::result::Result<Vec<String>, String> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut in_list = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"sldIdLst" => {
                in_list = true;
            }
            Ok(Event::End(ref e)) if local_name(e.name().as_ref()) == b"sldIdLst" => {
                in_list = false;
            }
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if in_list && local_name(e.name().as_ref()) == b"sldId" =>
            {
                let id = e
                    .attributes()
                    .flatten()
                    .find(|attr| is_prefixed(attr.key.as_ref(), b"id"))
                    .map(|attr| String::from_utf8_lossy(&attr.value).to_string());

                match id {
                    Some(id) => ids.push(id),
                    None => return Err("slide id without relationship id".to_string()),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("Error parsing presentation: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(ids)
}

/// Name of the relationships part for `part`; `""` is the package itself.
pub(crate) fn rels_part_name(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None if part.is_empty() => PACKAGE_RELS.to_string(),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the directory of `source_part`.
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    let joined = if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else {
        match source_part.rsplit_once('/') {
            Some((dir, _)) => format!("{}/{}", dir, target),
            None => target.to_string(),
        }
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Extract the local name from a potentially namespaced XML name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Whether `name` is a prefixed name with the given local part, e.g. `r:id`.
pub(crate) fn is_prefixed(name: &[u8], local: &[u8]) -> bool {
    name.contains(&b':') && local_name(name) == local
}
