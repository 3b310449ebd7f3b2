//! Caption Data Models
//!
//! Defines the cue types handed to the renderer.
//!
//! # Overview
//!
//! A [`CaptionSequence`] is the ordered output of one segmentation run:
//! - Cues are ordered by time and contiguous (each cue starts where the
//!   previous one ended)
//! - Cue text is trimmed and non-empty
//! - The sequence is immutable once returned; post-processing passes consume
//!   it and produce a new one

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::TimeSec;

// =============================================================================
// Caption Cue
// =============================================================================

/// One on-screen caption unit with text and timing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionCue {
    /// Start time in seconds
    pub start_sec: TimeSec,
    /// End time in seconds
    pub end_sec: TimeSec,
    /// Caption text
    pub text: String,
}

impl CaptionCue {
    /// Creates a new cue with the given timing and text
    pub fn new(start_sec: TimeSec, end_sec: TimeSec, text: &str) -> Self {
        Self {
            start_sec,
            end_sec,
            text: text.to_string(),
        }
    }

    /// Returns the `(start, end)` interval
    pub fn interval(&self) -> (TimeSec, TimeSec) {
        (self.start_sec, self.end_sec)
    }

    /// Returns the duration of this cue in seconds
    pub fn duration(&self) -> TimeSec {
        self.end_sec - self.start_sec
    }

    /// Number of whitespace-separated words in the cue text
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Length of the cue text in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

// =============================================================================
// Caption Sequence
// =============================================================================

/// Ordered list of cues for one script
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptionSequence {
    cues: Vec<CaptionCue>,
}

impl CaptionSequence {
    /// Creates an empty sequence
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already ordered list of cues
    pub fn from_cues(cues: Vec<CaptionCue>) -> Self {
        Self { cues }
    }

    /// Returns the cues in time order
    pub fn cues(&self) -> &[CaptionCue] {
        &self.cues
    }

    /// Consumes the sequence and returns the owned cues
    pub fn into_cues(self) -> Vec<CaptionCue> {
        self.cues
    }

    /// Iterates over the cues in time order
    pub fn iter(&self) -> std::slice::Iter<'_, CaptionCue> {
        self.cues.iter()
    }

    /// Returns the first cue, if any
    pub fn first(&self) -> Option<&CaptionCue> {
        self.cues.first()
    }

    /// Returns the last cue, if any
    pub fn last(&self) -> Option<&CaptionCue> {
        self.cues.last()
    }

    /// Returns the end time of the last cue
    pub fn duration(&self) -> TimeSec {
        self.cues.last().map(|c| c.end_sec).unwrap_or(0.0)
    }

    /// Returns the text of all cues joined by spaces
    pub fn full_text(&self) -> String {
        self.cues
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns true if every cue starts exactly where the previous one ended
    pub fn is_contiguous(&self) -> bool {
        self.cues
            .windows(2)
            .all(|pair| pair[0].end_sec == pair[1].start_sec)
    }

    /// Returns the number of cues
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Returns true if the sequence has no cues
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

impl<'a> IntoIterator for &'a CaptionSequence {
    type Item = &'a CaptionCue;
    type IntoIter = std::slice::Iter<'a, CaptionCue>;

    fn into_iter(self) -> Self::IntoIter {
        self.cues.iter()
    }
}

impl IntoIterator for CaptionSequence {
    type Item = CaptionCue;
    type IntoIter = std::vec::IntoIter<CaptionCue>;

    fn into_iter(self) -> Self::IntoIter {
        self.cues.into_iter()
    }
}

/// Human-readable listing, one cue per line: `  (0.00, 1.30): text`
impl fmt::Display for CaptionSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "timed_captions:")?;
        for cue in &self.cues {
            writeln!(
                f,
                "  ({:.2}, {:.2}): {}",
                cue.start_sec, cue.end_sec, cue.text
            )?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
