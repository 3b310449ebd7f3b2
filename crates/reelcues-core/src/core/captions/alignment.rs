//! Transcript Alignment Input
//!
//! Word-level forced-alignment output produced by the external transcriber.
//! The JSON shape mirrors what timestamped Whisper front-ends emit:
//!
//! ```text
//! {
//!   "text": " Bananas are berries.",
//!   "segments": [
//!     { "words": [ { "text": "Bananas", "start": 0.0, "end": 0.5 }, ... ] }
//!   ]
//! }
//! ```
//!
//! Extra fields (language, confidences, segment ids) are ignored.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{CoreError, CoreResult, TimeSec};

// =============================================================================
// Word Timestamp
// =============================================================================

/// One transcribed word and when it finished being spoken
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WordTimestamp {
    /// Word text as emitted by the transcriber (may carry punctuation)
    pub text: String,
    /// End of the word in seconds
    #[serde(rename = "end", alias = "end_time", alias = "endTime")]
    pub end_time: TimeSec,
    /// Start of the word in seconds, when the transcriber reports it
    #[serde(
        rename = "start",
        alias = "start_time",
        alias = "startTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<TimeSec>,
    /// Recognition confidence in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl WordTimestamp {
    /// Creates a word with only an end time
    pub fn new(text: &str, end_time: TimeSec) -> Self {
        Self {
            text: text.to_string(),
            end_time,
            start_time: None,
            confidence: None,
        }
    }
}

// =============================================================================
// Alignment Segment
// =============================================================================

/// One transcriber segment (roughly a phrase) with its aligned words
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentSegment {
    /// Words in speech order
    #[serde(default)]
    pub words: Vec<WordTimestamp>,
}

impl AlignmentSegment {
    /// Creates a segment from its words
    pub fn new(words: Vec<WordTimestamp>) -> Self {
        Self { words }
    }
}

// =============================================================================
// Transcript Alignment
// =============================================================================

/// Full transcriber output for one audio file
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptAlignment {
    /// Raw transcript text, re-walked during segmentation
    #[serde(rename = "text", alias = "full_text", alias = "fullText", default)]
    pub full_text: String,
    /// Segments in speech order
    #[serde(default)]
    pub segments: Vec<AlignmentSegment>,
}

impl TranscriptAlignment {
    /// Creates an alignment from its parts
    pub fn new(full_text: &str, segments: Vec<AlignmentSegment>) -> Self {
        Self {
            full_text: full_text.to_string(),
            segments,
        }
    }

    /// Builds a single-segment alignment whose text is the words joined by spaces
    pub fn from_words(words: &[(&str, TimeSec)]) -> Self {
        let full_text = words
            .iter()
            .map(|(text, _)| *text)
            .collect::<Vec<_>>()
            .join(" ");
        let segment = AlignmentSegment::new(
            words
                .iter()
                .map(|(text, end)| WordTimestamp::new(text, *end))
                .collect(),
        );
        Self::new(&full_text, vec![segment])
    }

    /// Parses and validates an alignment JSON document
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let alignment: Self = serde_json::from_str(json)?;
        alignment.validate()?;
        Ok(alignment)
    }

    /// Loads and validates an alignment JSON file
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = crate::core::fs::read_input_file(path)?;
        let alignment = Self::from_json_str(&content)?;
        debug!(
            path = %path.display(),
            segments = alignment.segments.len(),
            words = alignment.word_count(),
            "Loaded transcript alignment"
        );
        Ok(alignment)
    }

    /// Iterates over every word of every segment in speech order
    pub fn words(&self) -> impl Iterator<Item = &WordTimestamp> {
        self.segments.iter().flat_map(|s| s.words.iter())
    }

    /// Total number of aligned words
    pub fn word_count(&self) -> usize {
        self.segments.iter().map(|s| s.words.len()).sum()
    }

    /// Returns true if the alignment carries no words
    pub fn is_empty(&self) -> bool {
        self.word_count() == 0
    }

    /// End time of the last aligned word
    pub fn last_end_time(&self) -> Option<TimeSec> {
        self.words().last().map(|w| w.end_time)
    }

    /// Checks word timestamps.
    ///
    /// Negative or non-finite end times are rejected. Out-of-order end times
    /// inside a segment are tolerated (alignment jitter) and only logged.
    pub fn validate(&self) -> CoreResult<()> {
        for (segment_index, segment) in self.segments.iter().enumerate() {
            let mut previous_end: Option<TimeSec> = None;
            for word in &segment.words {
                if !word.end_time.is_finite() || word.end_time < 0.0 {
                    return Err(CoreError::InvalidAlignment(format!(
                        "word '{}' in segment {} has invalid end time {}",
                        word.text, segment_index, word.end_time
                    )));
                }
                if let Some(prev) = previous_end {
                    if word.end_time < prev {
                        warn!(
                            segment = segment_index,
                            word = %word.text,
                            end_time = word.end_time,
                            previous_end = prev,
                            "Word end time goes backwards"
                        );
                    }
                }
                previous_end = Some(word.end_time);
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_words_builds_single_segment() {
        let alignment =
            TranscriptAlignment::from_words(&[("Bananas", 0.5), ("are", 0.8), ("berries.", 1.3)]);

        assert_eq!(alignment.full_text, "Bananas are berries.");
        assert_eq!(alignment.segments.len(), 1);
        assert_eq!(alignment.word_count(), 3);
        assert_eq!(alignment.last_end_time(), Some(1.3));
    }

    #[test]
    fn test_parse_timestamped_whisper_json() {
        let json = r#"{
            "text": " Hello there. General Kenobi!",
            "language": "en",
            "segments": [
                {
                    "id": 0,
                    "start": 0.0,
                    "end": 0.9,
                    "text": " Hello there.",
                    "words": [
                        {"text": "Hello", "start": 0.0, "end": 0.4, "confidence": 0.98},
                        {"text": "there.", "start": 0.4, "end": 0.9, "confidence": 0.91}
                    ]
                },
                {
                    "words": [
                        {"text": "General", "start": 1.1, "end": 1.5},
                        {"text": "Kenobi!", "start": 1.5, "end": 2.2}
                    ]
                }
            ]
        }"#;

        let alignment = TranscriptAlignment::from_json_str(json).unwrap();
        assert_eq!(alignment.full_text, " Hello there. General Kenobi!");
        assert_eq!(alignment.word_count(), 4);

        let words: Vec<&WordTimestamp> = alignment.words().collect();
        assert_eq!(words[1].text, "there.");
        assert_eq!(words[1].end_time, 0.9);
        assert_eq!(words[1].start_time, Some(0.4));
        assert_eq!(words[0].confidence, Some(0.98));
        assert_eq!(words[3].confidence, None);
    }

    #[test]
    fn test_parse_accepts_spelled_out_field_names() {
        let json = r#"{"full_text": "hi", "segments": [{"words": [{"text": "hi", "end_time": 0.3}]}]}"#;
        let alignment = TranscriptAlignment::from_json_str(json).unwrap();
        assert_eq!(alignment.full_text, "hi");
        assert_eq!(alignment.last_end_time(), Some(0.3));
    }

    #[test]
    fn test_empty_alignment() {
        let alignment = TranscriptAlignment::from_json_str(r#"{"text": "", "segments": []}"#)
            .unwrap();
        assert!(alignment.is_empty());
        assert_eq!(alignment.last_end_time(), None);
    }

    #[test]
    fn test_negative_end_time_is_rejected() {
        let json = r#"{"text": "oops", "segments": [{"words": [{"text": "oops", "end": -1.0}]}]}"#;
        let result = TranscriptAlignment::from_json_str(json);
        assert!(matches!(result, Err(CoreError::InvalidAlignment(_))));
    }

    #[test]
    fn test_backwards_end_times_are_tolerated() {
        let alignment = TranscriptAlignment::from_words(&[("one", 1.0), ("two", 0.8)]);
        assert!(alignment.validate().is_ok());
    }

    #[test]
    fn test_malformed_json_is_a_json_error() {
        let result = TranscriptAlignment::from_json_str("{not json");
        assert!(matches!(result, Err(CoreError::JsonError(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("alignment.json");
        let alignment = TranscriptAlignment::from_words(&[("Hi", 0.2)]);
        std::fs::write(&path, serde_json::to_string(&alignment).unwrap()).unwrap();

        let loaded = TranscriptAlignment::load(&path).unwrap();
        assert_eq!(loaded, alignment);
    }
}
