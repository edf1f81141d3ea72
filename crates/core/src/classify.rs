//! Title classification for slide text.
//!
//! Splits the ordered text fragments of one slide into an optional title
//! and the remaining paragraphs. The rule is pluggable through
//! [`TextClassifier`]; [`FirstShortTitle`] is the default.

/// Length (in characters) below which a fragment may become the title.
pub const DEFAULT_TITLE_THRESHOLD: usize = 50;

/// Text of one slide after classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedText {
    pub title: Option<String>,
    pub paragraphs: Vec<String>,
}

/// Maps the ordered text fragments of a slide to a title and paragraphs.
pub trait TextClassifier {
    fn classify(&self, fragments: Vec<String>) -> ClassifiedText;
}

impl<F> TextClassifier for F
where
    F: Fn(Vec<String>) -> ClassifiedText,
{
    fn classify(&self, fragments: Vec<String>) -> ClassifiedText {
        self(fragments)
    }
}

/// The first fragment shorter than the threshold becomes the title.
///
/// Every other fragment is a paragraph, in the order given. Empty fragments
/// are candidates too and will claim the title if they come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirstShortTitle {
    threshold: usize,
}

impl Default for FirstShortTitle {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_TITLE_THRESHOLD,
        }
    }
}

impl FirstShortTitle {
    /// Create a classifier with the default 50 character threshold.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom threshold.
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    fn is_title_candidate(&self, text: &str) -> bool {
        text.chars().count() < self.threshold
    }
}

impl TextClassifier for FirstShortTitle {
    fn classify(&self, fragments: Vec<String>) -> ClassifiedText {
        let mut classified = ClassifiedText::default();

        for text in fragments {
            if classified.title.is_none() && self.is_title_candidate(&text) {
                classified.title = Some(text);
            } else {
                classified.paragraphs.push(text);
            }
        }

        classified
    }
}
