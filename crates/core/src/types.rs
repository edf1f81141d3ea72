//! Domain types for representing extracted presentation content.

use serde::{Deserialize, Serialize};

/// The outcome of a successful extraction.
///
/// Every slide in the document has a record. Recovered per-shape failures
/// are listed in `diagnostics`, so an empty `paragraphs` list on a clean
/// extraction can be told apart from one where text was lost.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// Slides in presentation order.
    pub slides: Vec<SlideRecord>,

    /// Failures that were recovered from while extracting.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    /// Create an empty extraction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next slide record.
    pub fn add_slide(&mut self, slide: SlideRecord) {
        self.slides.push(slide);
    }

    /// Record a recovered failure.
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Whether any content was skipped because of a recovered failure.
    pub fn is_degraded(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Discard diagnostics and keep only the slide records.
    pub fn into_slides(self) -> Vec<SlideRecord> {
        self.slides
    }
}

/// Structured content of a single slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideRecord {
    /// 1-based position of the slide in the presentation.
    pub slide_number: usize,

    /// The first short text on the slide, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Reserved; never assigned by the title heuristic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subheading: Option<String>,

    /// Remaining text in shape order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paragraphs: Vec<String>,

    /// Pictures in shape order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageRecord>,

    /// Speaker notes, only when notes extraction is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_notes: Option<String>,
}

impl SlideRecord {
    /// Create an empty record for the given slide number.
    pub fn new(slide_number: usize) -> Self {
        Self {
            slide_number,
            title: None,
            subheading: None,
            paragraphs: Vec::new(),
            images: Vec::new(),
            speaker_notes: None,
        }
    }

    /// Number of text fragments classified on this slide.
    pub fn text_fragment_count(&self) -> usize {
        self.paragraphs.len() + usize::from(self.title.is_some())
    }
}

/// An image extracted from a slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// File name the image was persisted under.
    pub src: String,

    /// Reserved alt text; not populated by extraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    /// Reserved pixel width; not populated by extraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Reserved pixel height; not populated by extraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Base64 (standard alphabet, padded) of the persisted bytes.
    pub base64: String,
}

impl ImageRecord {
    /// Create a record with only the required fields set.
    pub fn new(src: impl Into<String>, base64: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt: None,
            width: None,
            height: None,
            base64: base64.into(),
        }
    }
}

/// What part of the extraction a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A text-bearing shape was skipped.
    ShapeText,
    /// A picture was skipped.
    Image,
    /// Speaker notes could not be read.
    SpeakerNotes,
}

/// A recovered failure during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Slide the failure happened on.
    pub slide_number: usize,

    /// Whether text, an image or notes were skipped.
    pub kind: DiagnosticKind,

    /// Shape the failure is attributed to, e.g. `Picture 3 (id 4)`.
    pub shape: String,

    /// The error that caused the skip.
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(
        slide_number: usize,
        kind: DiagnosticKind,
        shape: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            slide_number,
            kind,
            shape: shape.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_count() {
        let mut slide = SlideRecord::new(1);
        assert_eq!(slide.text_fragment_count(), 0);

        slide.title = Some("Intro".to_string());
        slide.paragraphs.push("Body".to_string());
        assert_eq!(slide.text_fragment_count(), 2);
    }

    #[test]
    fn test_degraded_only_with_diagnostics() {
        let mut extraction = Extraction::new();
        extraction.add_slide(SlideRecord::new(1));
        assert!(!extraction.is_degraded());

        extraction.add_diagnostic(Diagnostic::new(1, DiagnosticKind::Image, "Picture 2", "boom"));
        assert!(extraction.is_degraded());
        assert_eq!(extraction.into_slides().len(), 1);
    }

    #[test]
    fn test_image_record_defaults() {
        let image = ImageRecord::new("image1.png", "AAEC");
        assert_eq!(image.src, "image1.png");
        assert!(image.alt.is_none());
        assert!(image.width.is_none());
        assert!(image.height.is_none());
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let mut slide = SlideRecord::new(3);
        slide.title = Some("Agenda".to_string());
        slide.images.push(ImageRecord::new("image2.jpeg", "/9j/"));

        let json = serde_json::to_value(&slide).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "slide_number": 3,
                "title": "Agenda",
                "images": [{ "src": "image2.jpeg", "base64": "/9j/" }]
            })
        );

        let back: SlideRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, slide);
    }
}
