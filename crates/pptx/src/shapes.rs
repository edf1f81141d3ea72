//! Shape walking for slide XML.
//!
//! Yields the shapes of a slide's shape tree in document order. Group shapes
//! are flattened into their children and `mc:Fallback` content is skipped so
//! alternate content is seen once.

use deck_core::ShapeTextError;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::package::{is_prefixed, local_name};

/// The element a shape came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// `p:sp`: text boxes, placeholders, autoshapes.
    AutoShape,
    /// `p:pic`
    Picture,
    /// `p:cxnSp`
    Connector,
    /// `p:graphicFrame`: tables, charts, diagrams.
    GraphicFrame,
}

impl ShapeKind {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"sp" => Some(Self::AutoShape),
            b"pic" => Some(Self::Picture),
            b"cxnSp" => Some(Self::Connector),
            b"graphicFrame" => Some(Self::GraphicFrame),
            _ => None,
        }
    }
}

/// Reference from a picture to its image relationship.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PictureRef {
    /// The `r:embed` relationship id, if the picture has one.
    pub embed: Option<String>,
}

/// A visual element on a slide.
///
/// Capabilities are data: a shape has text when it carries a text body and
/// a picture when it is a `p:pic`. Either, both or neither may be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    pub kind: ShapeKind,
    pub id: Option<u32>,
    pub name: String,
    /// Placeholder type (`p:ph/@type`), if the shape is a placeholder.
    pub placeholder: Option<String>,
    text: Option<TextBody>,
    picture: Option<PictureRef>,
}

impl Shape {
    fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            id: None,
            name: String::new(),
            placeholder: None,
            text: None,
            picture: (kind == ShapeKind::Picture).then(PictureRef::default),
        }
    }

    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }

    pub fn has_picture(&self) -> bool {
        self.picture.is_some()
    }

    pub fn picture(&self) -> Option<&PictureRef> {
        self.picture.as_ref()
    }

    /// Decoded text of the shape, or `None` if it has no text body.
    ///
    /// Paragraphs are joined with `\n`, as are explicit line breaks.
    pub fn text(&self) -> Option<Result<String, ShapeTextError>> {
        self.text.as_ref().map(|body| body.decode(self))
    }

    /// Short description used in diagnostics.
    pub fn label(&self) -> String {
        let name = if self.name.is_empty() {
            format!("{:?}", self.kind)
        } else {
            self.name.clone()
        };
        match self.id {
            Some(id) => format!("{} (id {})", name, id),
            None => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Run {
    /// Escaped character data from `a:t`.
    Text(Vec<u8>),
    /// CDATA content, taken literally.
    Literal(Vec<u8>),
    Break,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TextBody {
    paragraphs: Vec<Vec<Run>>,
}

impl TextBody {
    fn current_paragraph(&mut self) -> &mut Vec<Run> {
        if self.paragraphs.is_empty() {
            self.paragraphs.push(Vec::new());
        }
        let last = self.paragraphs.len() - 1;
        &mut self.paragraphs[last]
    }

    fn decode(&self, shape: &Shape) -> Result<String, ShapeTextError> {
        let mut text = String::new();

        for (idx, paragraph) in self.paragraphs.iter().enumerate() {
            if idx > 0 {
                text.push('\n');
            }
            for run in paragraph {
                match run {
                    Run::Text(raw) => {
                        let raw = utf8(raw, shape)?;
                        let unescaped = unescape(raw).map_err(|e| ShapeTextError::Escape {
                            shape: shape.label(),
                            reason: e.to_string(),
                        })?;
                        text.push_str(&unescaped);
                    }
                    Run::Literal(raw) => text.push_str(utf8(raw, shape)?),
                    Run::Break => text.push('\n'),
                }
            }
        }

        Ok(text)
    }
}

fn utf8<'a>(raw: &'a [u8], shape: &Shape) -> Result<&'a str, ShapeTextError> {
    std::str::from_utf8(raw).map_err(|e| ShapeTextError::Encoding {
        shape: shape.label(),
        reason: e.to_string(),
    })
}

/// Walk state for the shape currently being read.
#[derive(Debug)]
struct OpenShape {
    shape: Shape,
    /// Shape elements of the same kind opened inside this one.
    nested: usize,
    in_text_body: bool,
    in_run: bool,
}

impl OpenShape {
    fn new(kind: ShapeKind) -> Self {
        Self {
            shape: Shape::new(kind),
            nested: 0,
            in_text_body: false,
            in_run: false,
        }
    }

    /// Handle a start or empty element inside the shape.
    fn element(&mut self, e: &BytesStart, empty: bool) {
        let name = e.name();
        match local_name(name.as_ref()) {
            b"cNvPr" if self.shape.id.is_none() && self.shape.name.is_empty() => {
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"id" => {
                            self.shape.id = String::from_utf8_lossy(&attr.value).parse().ok();
                        }
                        b"name" => {
                            self.shape.name = String::from_utf8_lossy(&attr.value).to_string();
                        }
                        _ => {}
                    }
                }
            }
            b"ph" => {
                let ph_type = e
                    .attributes()
                    .flatten()
                    .find(|attr| attr.key.as_ref() == b"type")
                    .map(|attr| String::from_utf8_lossy(&attr.value).to_string());
                self.shape.placeholder = Some(ph_type.unwrap_or_else(|| "obj".to_string()));
            }
            b"blip" => {
                if let Some(picture) = self.shape.picture.as_mut() {
                    if picture.embed.is_none() {
                        picture.embed = e
                            .attributes()
                            .flatten()
                            .find(|attr| is_prefixed(attr.key.as_ref(), b"embed"))
                            .map(|attr| String::from_utf8_lossy(&attr.value).to_string());
                    }
                }
            }
            b"txBody" => {
                // Tables carry one text body per cell; they accumulate.
                self.shape.text.get_or_insert_with(TextBody::default);
                self.in_text_body = !empty;
            }
            b"p" if self.in_text_body => {
                if let Some(body) = self.shape.text.as_mut() {
                    body.paragraphs.push(Vec::new());
                }
            }
            b"br" if self.in_text_body => {
                if let Some(body) = self.shape.text.as_mut() {
                    body.current_paragraph().push(Run::Break);
                }
            }
            b"t" if self.in_text_body => {
                self.in_run = !empty;
            }
            _ => {}
        }
    }

    fn end_element(&mut self, local: &[u8]) {
        match local {
            b"txBody" => {
                self.in_text_body = false;
                self.in_run = false;
            }
            b"t" => self.in_run = false,
            _ => {}
        }
    }

    fn push_run(&mut self, run: Run) {
        if !self.in_run {
            return;
        }
        if let Some(body) = self.shape.text.as_mut() {
            body.current_paragraph().push(run);
        }
    }
}

/// Walk the shape tree of a slide (or notes) part.
pub(crate) fn walk_shapes(xml: &[u8]) -> Result<Vec<Shape>, String> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();
    let mut shapes = Vec::new();
    let mut current: Option<OpenShape> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                if local == b"Fallback" {
                    let end = e.to_end().into_owned();
                    reader
                        .read_to_end_into(end.name(), &mut skip_buf)
                        .map_err(|e| format!("Error skipping fallback content: {}", e))?;
                    skip_buf.clear();
                } else if let Some(kind) = ShapeKind::from_local_name(local) {
                    match current.as_mut() {
                        Some(open) if open.shape.kind == kind => open.nested += 1,
                        Some(open) => open.element(e, false),
                        None => current = Some(OpenShape::new(kind)),
                    }
                } else if let Some(open) = current.as_mut() {
                    open.element(e, false);
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                match (current.as_mut(), ShapeKind::from_local_name(local)) {
                    (None, Some(kind)) => shapes.push(Shape::new(kind)),
                    (Some(open), _) => open.element(e, true),
                    (None, None) => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(open) = current.as_mut() {
                    open.push_run(Run::Text(e.to_vec()));
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(open) = current.as_mut() {
                    open.push_run(Run::Literal(e.to_vec()));
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                if let Some(open) = current.as_mut() {
                    if ShapeKind::from_local_name(local) == Some(open.shape.kind) {
                        if open.nested > 0 {
                            open.nested -= 1;
                        } else if let Some(done) = current.take() {
                            shapes.push(done.shape);
                        }
                    } else {
                        open.end_element(local);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "Error parsing shapes at position {}: {}",
                    reader.buffer_position(),
                    e
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(shapes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(tree: &str) -> Vec<u8> {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006">
<p:cSld><p:spTree>
<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>
<p:grpSpPr/>
{}
</p:spTree></p:cSld>
</p:sld>"#,
            tree
        )
        .into_bytes()
    }

    fn text_shape(id: u32, name: &str, body: &str) -> String {
        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{}</p:txBody></p:sp>"#,
            id, name, body
        )
    }

    fn picture(id: u32, embed: &str) -> String {
        format!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="{}" name="Picture {}" descr="logo"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr/></p:pic>"#,
            id, id, embed
        )
    }

    fn texts(shapes: &[Shape]) -> Vec<String> {
        shapes
            .iter()
            .filter_map(|s| s.text())
            .map(|t| t.unwrap())
            .collect()
    }

    #[test]
    fn test_document_order_and_capabilities() {
        let xml = slide(&format!(
            "{}{}{}",
            text_shape(2, "Title 1", "<a:p><a:r><a:t>Hello</a:t></a:r></a:p>"),
            picture(3, "rId2"),
            text_shape(4, "Body", "<a:p><a:r><a:t>World</a:t></a:r></a:p>"),
        ));

        let shapes = walk_shapes(&xml).unwrap();
        assert_eq!(shapes.len(), 3);

        assert_eq!(shapes[0].kind, ShapeKind::AutoShape);
        assert_eq!(shapes[0].id, Some(2));
        assert_eq!(shapes[0].name, "Title 1");
        assert!(shapes[0].has_text());
        assert!(!shapes[0].has_picture());

        assert_eq!(shapes[1].kind, ShapeKind::Picture);
        assert!(!shapes[1].has_text());
        assert_eq!(shapes[1].picture().unwrap().embed.as_deref(), Some("rId2"));
        assert_eq!(shapes[1].label(), "Picture 3 (id 3)");

        assert_eq!(texts(&shapes), vec!["Hello", "World"]);
    }

    #[test]
    fn test_runs_paragraphs_and_breaks() {
        let xml = slide(&text_shape(
            2,
            "Body",
            "<a:p><a:r><a:t>Hello </a:t></a:r><a:r><a:t>there</a:t></a:r><a:br/><a:r><a:t>friend</a:t></a:r></a:p>\
             <a:p><a:endParaRPr/></a:p>\
             <a:p><a:r><a:t>Fish &amp; chips</a:t></a:r></a:p>",
        ));

        let shapes = walk_shapes(&xml).unwrap();
        assert_eq!(texts(&shapes), vec!["Hello there\nfriend\n\nFish & chips"]);
    }

    #[test]
    fn test_empty_text_body_is_text_bearing() {
        let xml = slide(&text_shape(2, "Empty", "<a:p/>"));
        let shapes = walk_shapes(&xml).unwrap();

        assert!(shapes[0].has_text());
        assert_eq!(texts(&shapes), vec![""]);
    }

    #[test]
    fn test_shape_without_text_body() {
        let xml = slide(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="5" name="Rectangle"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/></p:sp>
<p:cxnSp><p:nvCxnSpPr><p:cNvPr id="6" name="Connector"/><p:cNvCxnSpPr/><p:nvPr/></p:nvCxnSpPr><p:spPr/></p:cxnSp>"#,
        );

        let shapes = walk_shapes(&xml).unwrap();
        assert_eq!(shapes.len(), 2);
        assert!(shapes.iter().all(|s| !s.has_text() && !s.has_picture()));
        assert_eq!(shapes[1].kind, ShapeKind::Connector);
    }

    #[test]
    fn test_groups_are_flattened() {
        let xml = slide(&format!(
            r#"{}<p:grpSp><p:nvGrpSpPr><p:cNvPr id="10" name="Group"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}{}</p:grpSp>{}"#,
            text_shape(2, "Before", "<a:p><a:r><a:t>one</a:t></a:r></a:p>"),
            text_shape(11, "Inner", "<a:p><a:r><a:t>two</a:t></a:r></a:p>"),
            picture(12, "rId3"),
            text_shape(3, "After", "<a:p><a:r><a:t>three</a:t></a:r></a:p>"),
        ));

        let shapes = walk_shapes(&xml).unwrap();
        let names: Vec<&str> = shapes.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Before", "Inner", "Picture 12", "After"]);
    }

    #[test]
    fn test_alternate_content_fallback_is_skipped() {
        let xml = slide(&format!(
            r#"<mc:AlternateContent><mc:Choice Requires="p14">{}</mc:Choice><mc:Fallback>{}</mc:Fallback></mc:AlternateContent>"#,
            text_shape(2, "Choice", "<a:p><a:r><a:t>new</a:t></a:r></a:p>"),
            text_shape(2, "Fallback", "<a:p><a:r><a:t>old</a:t></a:r></a:p>"),
        ));

        let shapes = walk_shapes(&xml).unwrap();
        assert_eq!(texts(&shapes), vec!["new"]);
    }

    #[test]
    fn test_table_cells_accumulate() {
        let xml = slide(
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="7" name="Table 6"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm/>
<a:graphic><a:graphicData><a:tbl><a:tr h="1">
<a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>A1</a:t></a:r></a:p></a:txBody></a:tc>
<a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>B1</a:t></a:r></a:p></a:txBody></a:tc>
</a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#,
        );

        let shapes = walk_shapes(&xml).unwrap();
        assert_eq!(shapes[0].kind, ShapeKind::GraphicFrame);
        assert_eq!(texts(&shapes), vec!["A1\nB1"]);
    }

    #[test]
    fn test_placeholder_type() {
        let xml = slide(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Notes"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>
<p:sp><p:nvSpPr><p:cNvPr id="3" name="Content"/><p:cNvSpPr/><p:nvPr><p:ph idx="2"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>"#,
        );

        let shapes = walk_shapes(&xml).unwrap();
        assert_eq!(shapes[0].placeholder.as_deref(), Some("body"));
        assert_eq!(shapes[1].placeholder.as_deref(), Some("obj"));
    }

    #[test]
    fn test_picture_without_embed() {
        let xml = slide(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="4" name="Broken"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip/></p:blipFill><p:spPr/></p:pic>"#,
        );

        let shapes = walk_shapes(&xml).unwrap();
        assert!(shapes[0].has_picture());
        assert_eq!(shapes[0].picture().unwrap().embed, None);
    }

    #[test]
    fn test_bad_escape_fails_only_that_shape() {
        let xml = slide(&format!(
            "{}{}",
            text_shape(2, "Bad", "<a:p><a:r><a:t>Tom &bogus; Jerry</a:t></a:r></a:p>"),
            text_shape(3, "Good", "<a:p><a:r><a:t>Fine</a:t></a:r></a:p>"),
        ));

        let shapes = walk_shapes(&xml).unwrap();
        let bad = shapes[0].text().unwrap().unwrap_err();
        assert!(matches!(bad, ShapeTextError::Escape { ref shape, .. } if shape == "Bad (id 2)"));
        assert_eq!(shapes[1].text().unwrap().unwrap(), "Fine");
    }

    #[test]
    fn test_invalid_utf8_fails_only_that_shape() {
        let mut xml = slide(&text_shape(2, "Bytes", "<a:p><a:r><a:t>MARKER</a:t></a:r></a:p>"));
        let pos = xml.windows(6).position(|w| w == b"MARKER").unwrap();
        xml[pos] = 0xFF;

        let shapes = walk_shapes(&xml).unwrap();
        assert!(matches!(
            shapes[0].text().unwrap(),
            Err(ShapeTextError::Encoding { .. })
        ));
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let xml = b"<p:sld><p:cSld><p:spTree><p:sp></p:spTree></p:cSld></p:sld>";
        assert!(walk_shapes(xml).is_err());
    }
}
