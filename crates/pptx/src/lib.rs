//! PPTX (Office Open XML) backend for slide content extraction.
//!
//! Reads .pptx files, which are ZIP archives of XML parts, and produces one
//! [`deck_core::SlideRecord`] per slide with its title, paragraphs and images.

pub mod extractor;
pub mod images;
pub mod notes;
pub mod package;
pub mod shapes;

pub use extractor::PptxExtractor;
pub use images::ImageExtractor;
pub use package::{Package, Relationship, Relationships, SlideContainer};
pub use shapes::{PictureRef, Shape, ShapeKind};
