//! Slide assembly: drives the package, shape walker, classifier and image
//! extractor to produce one record per slide.

use deck_core::{
    Diagnostic, DiagnosticKind, ExtractOptions, Extraction, FirstShortTitle, ImageStore, Result,
    SlideRecord, TextClassifier,
};
use std::io::{Read, Seek};
use std::path::Path;

use crate::images::ImageExtractor;
use crate::notes::read_speaker_notes;
use crate::package::{Package, SlideContainer};

/// Extracts slide records from PPTX files.
///
/// Only a document that cannot be opened fails the call. A shape whose text
/// cannot be decoded, a picture that cannot be stored, or unreadable notes
/// are skipped and reported as diagnostics on the returned [`Extraction`].
pub struct PptxExtractor<C = FirstShortTitle> {
    options: ExtractOptions,
    classifier: C,
}

impl PptxExtractor {
    /// Create an extractor with default options and the first-short-title rule.
    pub fn new() -> Self {
        Self {
            options: ExtractOptions::default(),
            classifier: FirstShortTitle::default(),
        }
    }
}

impl Default for PptxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TextClassifier> PptxExtractor<C> {
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the title classification rule.
    pub fn with_classifier<D: TextClassifier>(self, classifier: D) -> PptxExtractor<D> {
        PptxExtractor {
            options: self.options,
            classifier,
        }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract a presentation file on disk.
    pub fn extract_file<S>(&self, path: impl AsRef<Path>, store: &mut S) -> Result<Extraction>
    where
        S: ImageStore + ?Sized,
    {
        let mut package = Package::open_file(path)?;
        self.extract_package(&mut package, store)
    }

    /// Extract a presentation from a reader.
    pub fn extract<R, S>(&self, reader: R, store: &mut S) -> Result<Extraction>
    where
        R: Read + Seek,
        S: ImageStore + ?Sized,
    {
        let mut package = Package::open(reader)?;
        self.extract_package(&mut package, store)
    }

    /// Extract every slide of an open package, in order.
    pub fn extract_package<R, S>(&self, package: &mut Package<R>, store: &mut S) -> Result<Extraction>
    where
        R: Read + Seek,
        S: ImageStore + ?Sized,
    {
        let images = ImageExtractor::new(self.options.image_naming.clone());
        let mut extraction = Extraction::new();

        for index in 0..package.slide_count() {
            let slide = package.load_slide(index)?;
            let record = self.extract_slide(package, &slide, index + 1, &images, store, &mut extraction)?;
            extraction.add_slide(record);
        }

        if extraction.is_degraded() {
            log::warn!(
                "Extracted {} slides with {} skipped items",
                extraction.slides.len(),
                extraction.diagnostics.len()
            );
        } else {
            log::debug!("Extracted {} slides", extraction.slides.len());
        }

        Ok(extraction)
    }

    fn extract_slide<R, S>(
        &self,
        package: &mut Package<R>,
        slide: &SlideContainer,
        slide_number: usize,
        images: &ImageExtractor,
        store: &mut S,
        extraction: &mut Extraction,
    ) -> Result<SlideRecord>
    where
        R: Read + Seek,
        S: ImageStore + ?Sized,
    {
        let shapes = slide.shapes()?;
        log::debug!("Slide {} ({}): {} shapes", slide_number, slide.part(), shapes.len());

        let mut record = SlideRecord::new(slide_number);

        let mut fragments = Vec::new();
        for shape in shapes.iter().filter(|s| s.has_text()) {
            match shape.text() {
                Some(Ok(text)) => fragments.push(text),
                Some(Err(e)) => {
                    log::warn!("Slide {}: skipping text of {}: {}", slide_number, shape.label(), e);
                    extraction.add_diagnostic(Diagnostic::new(
                        slide_number,
                        DiagnosticKind::ShapeText,
                        shape.label(),
                        e.to_string(),
                    ));
                }
                None => {}
            }
        }

        let classified = self.classifier.classify(fragments);
        record.title = classified.title;
        record.paragraphs = classified.paragraphs;

        for shape in shapes.iter() {
            let Some(picture) = shape.picture() else {
                continue;
            };

            match images.extract(package, slide.relationships(), picture, store) {
                Ok(image) => record.images.push(image),
                Err(e) => {
                    log::warn!("Slide {}: skipping image {}: {}", slide_number, shape.label(), e);
                    extraction.add_diagnostic(Diagnostic::new(
                        slide_number,
                        DiagnosticKind::Image,
                        shape.label(),
                        e.to_string(),
                    ));
                }
            }
        }

        if self.options.speaker_notes {
            match read_speaker_notes(package, slide.relationships()) {
                Ok(notes) => record.speaker_notes = notes,
                Err(e) => {
                    log::warn!("Slide {}: skipping speaker notes: {}", slide_number, e);
                    extraction.add_diagnostic(Diagnostic::new(
                        slide_number,
                        DiagnosticKind::SpeakerNotes,
                        slide.part(),
                        e.to_string(),
                    ));
                }
            }
        }

        Ok(record)
    }
}
