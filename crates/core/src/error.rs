//! Error types for presentation content extraction.
//!
//! Only [`OpenError`] is fatal to an extraction call. The other errors are
//! recovered where they occur and surface as diagnostics.

use thiserror::Error;

/// Result type alias for operations that fail only when the document
/// cannot be opened.
pub type Result<T> = std::result::Result<T, OpenError>;

/// The presentation container could not be opened or is not a valid package.
#[derive(Error, Debug)]
pub enum OpenError {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    Zip(String),

    /// XML parsing error in a structural part.
    #[error("XML parsing error in '{part}': {reason}")]
    Xml { part: String, reason: String },

    /// A part the package requires is not present in the archive.
    #[error("Missing part: {0}")]
    MissingPart(String),

    /// A part is present but its content does not make sense.
    #[error("Invalid part '{part}': {reason}")]
    InvalidPart { part: String, reason: String },
}

/// Text could not be decoded from a single shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeTextError {
    /// A text run is not valid UTF-8.
    #[error("Text in shape '{shape}' is not valid UTF-8: {reason}")]
    Encoding { shape: String, reason: String },

    /// A text run contains a malformed character or entity reference.
    #[error("Text in shape '{shape}' has a malformed escape: {reason}")]
    Escape { shape: String, reason: String },
}

/// A single picture could not be turned into an image record.
#[derive(Error, Debug)]
pub enum ImageExtractionError {
    /// The picture carries no `r:embed` reference.
    #[error("Picture has no embedded image reference")]
    MissingEmbed,

    /// The embed reference does not name a relationship of the slide.
    #[error("Unknown image relationship '{0}'")]
    UnknownRelationship(String),

    /// The picture links to an image outside the package.
    #[error("Image is linked externally: {0}")]
    ExternalImage(String),

    /// The referenced media part is not in the archive or cannot be read.
    #[error("Media part '{part}' could not be read: {reason}")]
    MissingMedia { part: String, reason: String },

    /// The media target does not reduce to a usable file name.
    #[error("Invalid image file name derived from '{0}'")]
    InvalidFileName(String),

    /// Writing the image to storage failed.
    #[error("Failed to persist image '{name}': {source}")]
    Persist {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading the persisted image back failed.
    #[error("Failed to load persisted image '{name}': {source}")]
    Load {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Speaker notes for a slide could not be read.
#[derive(Error, Debug)]
pub enum NotesError {
    /// The notes part is linked externally.
    #[error("Notes part is linked externally: {0}")]
    External(String),

    /// The notes part is missing or unreadable.
    #[error("Notes part '{part}' could not be read: {reason}")]
    Unreadable { part: String, reason: String },

    /// The notes part is not well-formed XML.
    #[error("Notes part '{part}' is malformed: {reason}")]
    Malformed { part: String, reason: String },
}
