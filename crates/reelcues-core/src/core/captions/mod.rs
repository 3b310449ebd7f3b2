//! Caption Segmentation Module
//!
//! Turns word-level transcript alignments into short, timed caption cues for
//! short-form vertical video:
//! - Alignment input (words with end times, plus the raw transcript text)
//! - Sentence-aware segmentation under a per-cue character budget
//! - Post-processing of the cue tail against the audio duration
//! - SRT, VTT and JSON hand-off to the renderer
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Caption Pipeline                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  alignment.rs   - Transcriber output (segments, word timestamps) │
//! │  text.rs        - Sentence-break and word-cleaning patterns      │
//! │  segmenter.rs   - Offset/time map, chunking, cue emission        │
//! │  postprocess.rs - Duplicate tail removal, tail gap extension     │
//! │  models.rs      - Cue and cue sequence                           │
//! │  formats.rs     - SRT/VTT/JSON parsing and export                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use reelcues_core::core::captions::{
//!     postprocess, segment_with_sentence_awareness, export_srt, TailExtensionPolicy,
//!     TranscriptAlignment,
//! };
//!
//! let alignment = TranscriptAlignment::load(Path::new("alignment.json"))?;
//! let cues = segment_with_sentence_awareness(&alignment, 20, false)?;
//! let cues = postprocess(cues, 42.0, &TailExtensionPolicy::default());
//! std::fs::write("captions.srt", export_srt(&cues))?;
//! ```

pub mod alignment;
pub mod formats;
pub mod models;
pub mod postprocess;
pub mod segmenter;
pub mod text;

pub use alignment::{AlignmentSegment, TranscriptAlignment, WordTimestamp};
pub use formats::{export_srt, export_vtt, parse_srt, parse_vtt, CaptionFormat, ParseError};
pub use models::{CaptionCue, CaptionSequence};
pub use postprocess::{merge_by_duration, postprocess, TailExtensionPolicy};
pub use segmenter::{
    build_offset_time_map, chunk_words_by_budget, interpolate_time,
    segment_with_sentence_awareness, CaptionSegmenter, CharOffsetTimeMap, DropReason,
    DroppedChunk, OffsetRange, SegmentationReport, SegmenterConfig, DEFAULT_MAX_CAPTION_CHARS,
};
pub use text::{TextRules, DEFAULT_SENTENCE_BREAK_PATTERN, DEFAULT_WORD_CLEANING_PATTERN};
