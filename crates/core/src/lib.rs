//! Core domain types, title classification, and image storage
//! for presentation content extraction.

pub mod classify;
pub mod config;
pub mod error;
pub mod storage;
pub mod types;

pub use classify::{ClassifiedText, FirstShortTitle, TextClassifier, DEFAULT_TITLE_THRESHOLD};
pub use config::ExtractOptions;
pub use error::{ImageExtractionError, NotesError, OpenError, Result, ShapeTextError};
pub use storage::{DirectoryStore, ImageNaming, ImageStore, MemoryStore};
pub use types::{Diagnostic, DiagnosticKind, Extraction, ImageRecord, SlideRecord};
