//! Caption Segmenter
//!
//! Converts a [`TranscriptAlignment`] into a [`CaptionSequence`].
//!
//! # Algorithm
//!
//! ```text
//! alignment words ──► CharOffsetTimeMap   (offset range → word end time)
//!
//! raw transcript ──► tokens (+ offsets) ──► sentences ──► budget chunks
//!                                                             │
//!                       running position += len(chunk) + 1 ◄──┘
//!                       end = map.interpolate_time(position)
//!                       cue = (previous_end, end, chunk)
//! ```
//!
//! The raw transcript and the per-segment word list are not guaranteed to be
//! identical, so time resolution is approximate. Chunks whose position cannot
//! be resolved are dropped and recorded in a [`SegmentationReport`].

use serde::Serialize;
use tracing::{debug, info, warn};

use super::alignment::TranscriptAlignment;
use super::models::{CaptionCue, CaptionSequence};
use super::text::{
    char_len, TextRules, DEFAULT_SENTENCE_BREAK_PATTERN, DEFAULT_WORD_CLEANING_PATTERN,
};
use crate::core::{CaptionLayout, CharOffset, CoreError, CoreResult, TimeSec};

/// Default caption character budget, the budget of the default layout
pub const DEFAULT_MAX_CAPTION_CHARS: usize = CaptionLayout::Landscape.default_max_chars();

// =============================================================================
// Offset → Time Map
// =============================================================================

/// Character range owned by one aligned word
#[derive(Clone, Debug, PartialEq)]
pub struct OffsetRange {
    /// First offset of the word
    pub start: CharOffset,
    /// One past the separator that follows the word
    pub end: CharOffset,
    /// End time of the word in seconds
    pub end_time: TimeSec,
}

impl OffsetRange {
    /// Whether a flush position belongs to this word.
    ///
    /// The end offset is inclusive: a chunk ending on this word produces a
    /// position of exactly `end`.
    pub fn contains(&self, position: CharOffset) -> bool {
        self.start <= position && position <= self.end
    }
}

/// Ordered, contiguous offset ranges built from the aligned words
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CharOffsetTimeMap {
    ranges: Vec<OffsetRange>,
}

impl CharOffsetTimeMap {
    /// Returns the ranges in offset order
    pub fn ranges(&self) -> &[OffsetRange] {
        &self.ranges
    }

    /// Offset just past the last word
    pub fn total_len(&self) -> CharOffset {
        self.ranges.last().map(|r| r.end).unwrap_or(0)
    }

    /// Returns the number of ranges
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Returns true if no words were mapped
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Resolves a position to the end time of the first range containing it
    pub fn interpolate_time(&self, position: CharOffset) -> Option<TimeSec> {
        self.ranges
            .iter()
            .find(|range| range.contains(position))
            .map(|range| range.end_time)
    }
}

/// Walks every aligned word and assigns it `[cursor, cursor + len + 1)`.
pub fn build_offset_time_map(alignment: &TranscriptAlignment) -> CharOffsetTimeMap {
    let mut cursor: CharOffset = 0;
    let mut ranges = Vec::with_capacity(alignment.word_count());

    for word in alignment.words() {
        let end = cursor + char_len(&word.text) + 1;
        ranges.push(OffsetRange {
            start: cursor,
            end,
            end_time: word.end_time,
        });
        cursor = end;
    }

    CharOffsetTimeMap { ranges }
}

/// Looks up `position` in `map`; `None` is a soft miss, not an error.
pub fn interpolate_time(position: CharOffset, map: &CharOffsetTimeMap) -> Option<TimeSec> {
    map.interpolate_time(position)
}

// =============================================================================
// Budget Chunking
// =============================================================================

/// Greedily packs words into space-joined chunks of at most `max_chars`.
///
/// Once a chunk has grown to half the budget it stops, provided more words
/// remain, which yields more evenly sized captions. A word longer than the
/// budget becomes a chunk of its own.
pub fn chunk_words_by_budget<S: AsRef<str>>(words: &[S], max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut remaining = words.iter().map(|word| word.as_ref()).peekable();

    while let Some(first) = remaining.next() {
        let mut chunk = first.to_string();
        let mut chunk_len = char_len(first);

        while let Some(&next) = remaining.peek() {
            let grown_len = chunk_len + 1 + char_len(next);
            if grown_len > max_chars {
                break;
            }
            chunk.push(' ');
            chunk.push_str(next);
            chunk_len = grown_len;
            remaining.next();

            if chunk_len * 2 >= max_chars && remaining.peek().is_some() {
                break;
            }
        }

        chunks.push(chunk);
    }

    chunks
}

// =============================================================================
// Segmentation Report
// =============================================================================

/// Why a chunk did not become a cue
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DropReason {
    /// The flush position fell outside every mapped range
    Unresolvable,
    /// The resolved end time was not after the previous cue's end
    NonIncreasing { resolved_end: TimeSec },
    /// Nothing was left after punctuation cleaning
    EmptyAfterCleaning,
}

/// A chunk that was discarded during segmentation
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedChunk {
    /// Chunk text as it would have been displayed
    pub text: String,
    /// Running position at the time of the flush
    pub position: CharOffset,
    /// Reason for the drop
    pub reason: DropReason,
}

/// Per-run accumulator of segmentation diagnostics.
///
/// Returned to the caller instead of being logged piecemeal; the caller
/// flushes it once with [`SegmentationReport::log_summary`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentationReport {
    /// Number of aligned words in the input
    pub aligned_words: usize,
    /// Number of whitespace-delimited words in the raw transcript
    pub transcript_words: usize,
    /// Number of cues produced
    pub cues_emitted: usize,
    /// Chunks that were discarded
    pub dropped: Vec<DroppedChunk>,
}

impl SegmentationReport {
    fn record_drop(&mut self, text: String, position: CharOffset, reason: DropReason) {
        debug!(text = %text, position, reason = ?reason, "Dropping caption chunk");
        self.dropped.push(DroppedChunk {
            text,
            position,
            reason,
        });
    }

    /// Number of dropped chunks
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }

    /// True if every chunk became a cue
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }

    /// True if the raw transcript and the aligned word list disagree on word count
    pub fn word_count_mismatch(&self) -> bool {
        self.aligned_words != self.transcript_words
    }

    /// Logs the accumulated diagnostics once
    pub fn log_summary(&self) {
        info!(
            cues = self.cues_emitted,
            dropped = self.dropped.len(),
            aligned_words = self.aligned_words,
            transcript_words = self.transcript_words,
            "Caption segmentation finished"
        );
        if self.word_count_mismatch() {
            warn!(
                aligned_words = self.aligned_words,
                transcript_words = self.transcript_words,
                "Transcript text and aligned words differ; caption timing is approximate"
            );
        }
        for chunk in &self.dropped {
            warn!(
                text = %chunk.text,
                position = chunk.position,
                reason = ?chunk.reason,
                "Caption chunk dropped"
            );
        }
    }
}

// =============================================================================
// Segmenter Configuration
// =============================================================================

/// Inputs that shape segmentation
#[derive(Clone, Debug, PartialEq)]
pub struct SegmenterConfig {
    /// Maximum characters per caption; must be positive
    pub max_chars: usize,
    /// Keep punctuation in caption text
    pub preserve_punctuation: bool,
    /// Pattern whose match end opens a new sentence
    pub sentence_break_pattern: String,
    /// Pattern whose matches are removed from words when punctuation is stripped
    pub word_cleaning_pattern: String,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CAPTION_CHARS,
            preserve_punctuation: false,
            sentence_break_pattern: DEFAULT_SENTENCE_BREAK_PATTERN.to_string(),
            word_cleaning_pattern: DEFAULT_WORD_CLEANING_PATTERN.to_string(),
        }
    }
}

impl SegmenterConfig {
    /// Default patterns with the given budget and punctuation handling
    pub fn with_budget(max_chars: usize, preserve_punctuation: bool) -> Self {
        Self {
            max_chars,
            preserve_punctuation,
            ..Default::default()
        }
    }
}

// =============================================================================
// Caption Segmenter
// =============================================================================

/// Raw transcript word with its byte offset in the transcript
#[derive(Debug)]
struct Token<'a> {
    text: &'a str,
    offset: usize,
}

/// Sentence-aware caption segmenter
#[derive(Clone, Debug)]
pub struct CaptionSegmenter {
    max_chars: usize,
    preserve_punctuation: bool,
    rules: TextRules,
}

impl CaptionSegmenter {
    /// Validates the configuration and compiles its patterns.
    ///
    /// A zero budget is rejected here, before any segmentation runs.
    pub fn new(config: &SegmenterConfig) -> CoreResult<Self> {
        if config.max_chars == 0 {
            return Err(CoreError::InvalidConfig(
                "max_chars must be greater than zero".to_string(),
            ));
        }

        let rules = TextRules::new(
            &config.sentence_break_pattern,
            &config.word_cleaning_pattern,
        )?;

        Ok(Self {
            max_chars: config.max_chars,
            preserve_punctuation: config.preserve_punctuation,
            rules,
        })
    }

    /// Returns the caption character budget
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Returns whether punctuation is kept in caption text
    pub fn preserve_punctuation(&self) -> bool {
        self.preserve_punctuation
    }

    /// Segments an alignment, discarding diagnostics
    pub fn segment(&self, alignment: &TranscriptAlignment) -> CaptionSequence {
        self.segment_with_report(alignment).0
    }

    /// Segments an alignment and returns the run's diagnostics alongside the cues
    pub fn segment_with_report(
        &self,
        alignment: &TranscriptAlignment,
    ) -> (CaptionSequence, SegmentationReport) {
        let map = build_offset_time_map(alignment);
        let text = alignment.full_text.as_str();
        let tokens = tokenize(text);

        let mut report = SegmentationReport {
            aligned_words: map.len(),
            transcript_words: tokens.len(),
            ..Default::default()
        };

        if map.is_empty() || tokens.is_empty() {
            debug!("Alignment has no words; nothing to segment");
            return (CaptionSequence::new(), report);
        }

        let sentence_starts = self.rules.sentence_starts(text);
        let mut emitter = CueEmitter::new(&map);

        let mut sentence: Vec<&str> = Vec::new();
        for token in &tokens {
            if !sentence.is_empty() && sentence_starts.contains(&token.offset) {
                self.flush_sentence(&sentence, &mut emitter, &mut report);
                sentence.clear();
            }
            sentence.push(token.text);
        }
        self.flush_sentence(&sentence, &mut emitter, &mut report);

        let cues = emitter.finish();
        report.cues_emitted = cues.len();
        debug!(
            cues = cues.len(),
            dropped = report.dropped_count(),
            max_chars = self.max_chars,
            "Segmented transcript into captions"
        );
        (cues, report)
    }

    fn flush_sentence(
        &self,
        sentence: &[&str],
        emitter: &mut CueEmitter<'_>,
        report: &mut SegmentationReport,
    ) {
        for chunk in chunk_words_by_budget(sentence, self.max_chars) {
            let display = self.display_text(&chunk);
            emitter.flush(display, report);
        }
    }

    fn display_text(&self, chunk: &str) -> String {
        if self.preserve_punctuation {
            return chunk.to_string();
        }
        chunk
            .split(' ')
            .map(|word| self.rules.clean_word(word))
            .filter(|word| !word.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Finds each whitespace-delimited word by forward search from the last match,
/// so repeated words resolve to successive occurrences.
fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut search_from = 0;

    for word in text.split_whitespace() {
        let offset = text[search_from..]
            .find(word)
            .map(|relative| search_from + relative)
            .unwrap_or(search_from);
        search_from = offset + word.len();
        tokens.push(Token { text: word, offset });
    }

    tokens
}

/// Turns chunks into contiguous cues, tracking the running position
struct CueEmitter<'a> {
    map: &'a CharOffsetTimeMap,
    position: CharOffset,
    previous_end: TimeSec,
    cues: Vec<CaptionCue>,
}

impl<'a> CueEmitter<'a> {
    fn new(map: &'a CharOffsetTimeMap) -> Self {
        Self {
            map,
            position: 0,
            previous_end: 0.0,
            cues: Vec::new(),
        }
    }

    fn flush(&mut self, text: String, report: &mut SegmentationReport) {
        let text = text.trim().to_string();
        if text.is_empty() {
            report.record_drop(text, self.position, DropReason::EmptyAfterCleaning);
            return;
        }

        self.position += char_len(&text) + 1;

        match self.map.interpolate_time(self.position) {
            None => report.record_drop(text, self.position, DropReason::Unresolvable),
            Some(end) if end <= self.previous_end => report.record_drop(
                text,
                self.position,
                DropReason::NonIncreasing { resolved_end: end },
            ),
            Some(end) => {
                self.cues.push(CaptionCue::new(self.previous_end, end, &text));
                self.previous_end = end;
            }
        }
    }

    fn finish(self) -> CaptionSequence {
        CaptionSequence::from_cues(self.cues)
    }
}

/// One-shot segmentation with default patterns.
///
/// Fails only when `max_chars` is zero.
pub fn segment_with_sentence_awareness(
    alignment: &TranscriptAlignment,
    max_chars: usize,
    preserve_punctuation: bool,
) -> CoreResult<CaptionSequence> {
    let segmenter =
        CaptionSegmenter::new(&SegmenterConfig::with_budget(max_chars, preserve_punctuation))?;
    Ok(segmenter.segment(alignment))
}

// =============================================================================
// Tests
// =============================================================================
