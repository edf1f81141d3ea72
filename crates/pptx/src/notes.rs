//! Speaker notes for a slide.

use deck_core::NotesError;
use std::io::{Read, Seek};

use crate::package::{rel_types, Package, Relationships};
use crate::shapes;

/// Placeholder type that holds the notes text on a notes slide.
const NOTES_PLACEHOLDER: &str = "body";

/// Read the notes text linked from a slide, if it has any.
///
/// The text of the notes slide's body placeholders is joined with newlines.
/// Blank notes are treated as absent.
pub fn read_speaker_notes<R: Read + Seek>(
    package: &mut Package<R>,
    relationships: &Relationships,
) -> Result<Option<String>, NotesError> {
    let rel = match relationships.find_by_type(rel_types::NOTES_SLIDE) {
        Some(rel) => rel,
        None => return Ok(None),
    };

    if rel.external {
        return Err(NotesError::External(rel.target.clone()));
    }

    let xml = package
        .read_part(&rel.target)
        .map_err(|e| NotesError::Unreadable {
            part: rel.target.clone(),
            reason: e.to_string(),
        })?;

    let shapes = shapes::walk_shapes(&xml).map_err(|reason| NotesError::Malformed {
        part: rel.target.clone(),
        reason,
    })?;

    let mut parts = Vec::new();
    for shape in shapes
        .iter()
        .filter(|s| s.placeholder.as_deref() == Some(NOTES_PLACEHOLDER))
    {
        match shape.text() {
            Some(Ok(text)) if !text.trim().is_empty() => parts.push(text),
            Some(Err(e)) => log::warn!("Skipping notes text in {}: {}", rel.target, e),
            _ => {}
        }
    }

    if parts.is_empty() {
        Ok(None)
    } else {
        Ok(Some(parts.join("\n")))
    }
}
