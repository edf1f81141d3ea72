//! Extraction options.

use crate::storage::ImageNaming;

/// Options controlling what an extraction produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// How stored image file names are derived.
    pub image_naming: ImageNaming,

    /// Whether to read speaker notes from each slide's notes part.
    pub speaker_notes: bool,
}

impl ExtractOptions {
    /// Create options with the defaults: base-name image naming, no notes.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image_naming(mut self, naming: ImageNaming) -> Self {
        self.image_naming = naming;
        self
    }

    pub fn with_speaker_notes(mut self, enabled: bool) -> Self {
        self.speaker_notes = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ExtractOptions::new();
        assert_eq!(options.image_naming, ImageNaming::BaseName);
        assert!(!options.speaker_notes);
    }

    #[test]
    fn test_builder() {
        let options = ExtractOptions::new()
            .with_image_naming(ImageNaming::ContentHash)
            .with_speaker_notes(true);
        assert_eq!(options.image_naming, ImageNaming::ContentHash);
        assert!(options.speaker_notes);
    }
}
