//! Text rules used while re-walking the raw transcript.
//!
//! Two patterns drive segmentation:
//! - a sentence-break pattern whose match end marks the start of a new sentence
//! - a word-cleaning pattern whose matches are deleted from caption text when
//!   punctuation is not preserved

use std::collections::HashSet;

use regex::Regex;

use crate::core::CoreResult;

/// Terminal punctuation followed by whitespace ends a sentence
pub const DEFAULT_SENTENCE_BREAK_PATTERN: &str = r"[.!?]+\s+";

/// Everything except word characters, whitespace, dashes, underscores and quotes
pub const DEFAULT_WORD_CLEANING_PATTERN: &str = r#"[^\w\s\-_"']"#;

/// Compiled sentence-break and word-cleaning patterns
#[derive(Clone, Debug)]
pub struct TextRules {
    sentence_break: Regex,
    word_cleaner: Regex,
}

impl TextRules {
    /// Compiles custom patterns
    pub fn new(sentence_break_pattern: &str, word_cleaning_pattern: &str) -> CoreResult<Self> {
        Ok(Self {
            sentence_break: Regex::new(sentence_break_pattern)?,
            word_cleaner: Regex::new(word_cleaning_pattern)?,
        })
    }

    /// Compiles the default patterns
    pub fn standard() -> CoreResult<Self> {
        Self::new(DEFAULT_SENTENCE_BREAK_PATTERN, DEFAULT_WORD_CLEANING_PATTERN)
    }

    /// Strips punctuation from a single word
    pub fn clean_word(&self, word: &str) -> String {
        self.word_cleaner.replace_all(word, "").into_owned()
    }

    /// Byte offsets in `text` at which a new sentence begins.
    ///
    /// Each offset is the first byte after a sentence-break match. A match that
    /// runs to the end of the text opens nothing.
    pub fn sentence_starts(&self, text: &str) -> HashSet<usize> {
        self.sentence_break
            .find_iter(text)
            .map(|m| m.end())
            .filter(|&end| end < text.len())
            .collect()
    }
}

/// Length in chars, the unit every caption budget is measured in
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}
