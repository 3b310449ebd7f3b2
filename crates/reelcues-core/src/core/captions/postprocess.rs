//! Caption Post-Processing
//!
//! Fixups applied once after segmentation, before the cues reach the renderer:
//! - duplicate-tail removal (alignment sometimes double-counts the last phrase)
//! - tail-gap extension (transcriber end times trail the real audio end)
//!
//! Plus duration-based merging for callers that schedule footage per group of
//! captions.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::models::{CaptionCue, CaptionSequence};
use crate::core::TimeSec;

// =============================================================================
// Tail Extension Policy
// =============================================================================

/// How far the last cue may be stretched toward the end of the audio
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailExtensionPolicy {
    /// Extend only when the tail gap is at least this long
    #[serde(default = "default_threshold_sec")]
    pub threshold_sec: TimeSec,
    /// Amount added to the last cue's end (never past the audio end)
    #[serde(default = "default_buffer_sec")]
    pub buffer_sec: TimeSec,
    /// Refuse to extend a final cue holding a single word
    #[serde(default = "default_multi_word_only")]
    pub multi_word_only: bool,
    /// Extend only when the tail gap is shorter than this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_gap_sec: Option<TimeSec>,
}

fn default_threshold_sec() -> TimeSec {
    1.0
}

fn default_buffer_sec() -> TimeSec {
    0.3
}

fn default_multi_word_only() -> bool {
    true
}

impl Default for TailExtensionPolicy {
    fn default() -> Self {
        Self {
            threshold_sec: default_threshold_sec(),
            buffer_sec: default_buffer_sec(),
            multi_word_only: default_multi_word_only(),
            max_gap_sec: None,
        }
    }
}

impl TailExtensionPolicy {
    /// Fixed buffer once the gap reaches `threshold_sec`, any word count
    pub fn buffered(threshold_sec: TimeSec, buffer_sec: TimeSec) -> Self {
        Self {
            threshold_sec,
            buffer_sec,
            multi_word_only: false,
            max_gap_sec: None,
        }
    }

    /// Close only short gaps (< 0.5s), and only for multi-word captions
    pub fn strict() -> Self {
        Self {
            threshold_sec: 0.0,
            buffer_sec: 0.5,
            multi_word_only: true,
            max_gap_sec: Some(0.5),
        }
    }

    /// Never extend
    pub fn disabled() -> Self {
        Self {
            threshold_sec: default_threshold_sec(),
            buffer_sec: 0.0,
            multi_word_only: true,
            max_gap_sec: None,
        }
    }

    /// Returns the new end time for `last`, or `None` when the policy declines
    fn extended_end(&self, last: &CaptionCue, audio_duration: TimeSec) -> Option<TimeSec> {
        if !audio_duration.is_finite() || self.buffer_sec <= 0.0 {
            return None;
        }

        let gap = audio_duration - last.end_sec;
        if gap <= 0.0 || gap < self.threshold_sec {
            return None;
        }
        if self.max_gap_sec.is_some_and(|max_gap| gap >= max_gap) {
            return None;
        }
        if self.multi_word_only && last.word_count() < 2 {
            return None;
        }

        Some((last.end_sec + self.buffer_sec).min(audio_duration))
    }
}

// =============================================================================
// Post-Processing Passes
// =============================================================================

/// Runs duplicate-tail removal, then tail-gap extension
pub fn postprocess(
    cues: CaptionSequence,
    audio_duration: TimeSec,
    policy: &TailExtensionPolicy,
) -> CaptionSequence {
    let mut cues = cues.into_cues();
    remove_duplicate_tail(&mut cues);
    extend_tail_gap(&mut cues, audio_duration, policy);
    CaptionSequence::from_cues(cues)
}

/// Drops the last cue when its trimmed text repeats the previous cue's
fn remove_duplicate_tail(cues: &mut Vec<CaptionCue>) -> bool {
    let [.., previous, last] = cues.as_slice() else {
        return false;
    };
    if last.text.trim() != previous.text.trim() {
        return false;
    }

    debug!(text = %last.text, "Removing duplicated final caption");
    cues.pop();
    true
}

fn extend_tail_gap(
    cues: &mut [CaptionCue],
    audio_duration: TimeSec,
    policy: &TailExtensionPolicy,
) -> bool {
    let Some(last) = cues.last_mut() else {
        return false;
    };
    let Some(new_end) = policy.extended_end(last, audio_duration) else {
        return false;
    };

    debug!(
        from = last.end_sec,
        to = new_end,
        audio_duration,
        "Extending final caption toward audio end"
    );
    last.end_sec = new_end;
    true
}

// =============================================================================
// Duration Merging
// =============================================================================

/// Merges adjacent cues into groups lasting at least `min_segment_sec`.
///
/// A group stops growing as soon as it reaches `max_segment_sec`. The last
/// group may be shorter than the minimum when the input runs out.
pub fn merge_by_duration(
    cues: &CaptionSequence,
    min_segment_sec: TimeSec,
    max_segment_sec: TimeSec,
) -> CaptionSequence {
    let cues = cues.cues();
    let mut merged = Vec::new();
    let mut index = 0;

    while index < cues.len() {
        let start = cues[index].start_sec;
        let mut end = cues[index].end_sec;
        let mut texts = vec![cues[index].text.as_str()];
        index += 1;

        while end - start < min_segment_sec && index < cues.len() {
            end = cues[index].end_sec;
            texts.push(cues[index].text.as_str());
            index += 1;
            if end - start >= max_segment_sec {
                break;
            }
        }

        merged.push(CaptionCue::new(start, end, &texts.join(" ")));
    }

    CaptionSequence::from_cues(merged)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(cues: &[(TimeSec, TimeSec, &str)]) -> CaptionSequence {
        CaptionSequence::from_cues(
            cues.iter()
                .map(|(start, end, text)| CaptionCue::new(*start, *end, text))
                .collect(),
        )
    }

    fn assert_close(actual: TimeSec, expected: TimeSec) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    // -------------------------------------------------------------------------
    // Duplicate Tail Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_duplicate_tail_is_removed() {
        let input = seq(&[
            (0.0, 1.0, "Hello world"),
            (1.0, 2.0, "the end"),
            (2.0, 2.4, " the end "),
        ]);
        let output = postprocess(input, 2.4, &TailExtensionPolicy::disabled());

        assert_eq!(output.len(), 2);
        // The removed cue's range is gone, not merged into the previous cue
        assert_eq!(output.last().unwrap().interval(), (1.0, 2.0));
    }

    #[test]
    fn test_distinct_tail_is_kept() {
        let input = seq(&[(0.0, 1.0, "one"), (1.0, 2.0, "two")]);
        let output = postprocess(input.clone(), 2.0, &TailExtensionPolicy::disabled());
        assert_eq!(output, input);
    }

    #[test]
    fn test_single_cue_is_never_deduplicated() {
        let mut cues = vec![CaptionCue::new(0.0, 1.0, "alone")];
        assert!(!remove_duplicate_tail(&mut cues));
        assert_eq!(cues.len(), 1);
    }

    #[test]
    fn test_only_the_final_pair_is_compared() {
        let mut cues = vec![
            CaptionCue::new(0.0, 1.0, "again"),
            CaptionCue::new(1.0, 2.0, "again"),
            CaptionCue::new(2.0, 3.0, "different"),
        ];
        assert!(!remove_duplicate_tail(&mut cues));
        assert_eq!(cues.len(), 3);
    }

    // -------------------------------------------------------------------------
    // Tail Extension Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_tail_extension_adds_buffer_not_full_gap() {
        let input = seq(&[(0.0, 4.0, "first caption"), (4.0, 9.0, "last words here")]);
        let output = postprocess(input, 10.0, &TailExtensionPolicy::buffered(1.0, 0.3));
        assert_close(output.last().unwrap().end_sec, 9.3);
    }

    #[test]
    fn test_tail_extension_capped_at_audio_duration() {
        let input = seq(&[(0.0, 9.8, "almost done")]);
        let policy = TailExtensionPolicy::buffered(0.1, 0.5);
        let output = postprocess(input, 10.0, &policy);
        assert_close(output.last().unwrap().end_sec, 10.0);
    }

    #[test]
    fn test_disabled_policy_never_extends() {
        let input = seq(&[(0.0, 2.0, "long silence after")]);
        let output = postprocess(input, 30.0, &TailExtensionPolicy::disabled());
        assert_eq!(output.last().unwrap().end_sec, 2.0);
    }

    #[test]
    fn test_disabled_policy_serializes_with_finite_values() {
        let json = serde_json::to_string(&TailExtensionPolicy::disabled()).unwrap();
        assert!(!json.contains("null"));

        let parsed: TailExtensionPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, TailExtensionPolicy::disabled());
    }

    #[test]
    fn test_small_gap_below_threshold_is_left_alone() {
        let input = seq(&[(0.0, 9.5, "two words")]);
        let output = postprocess(input, 10.0, &TailExtensionPolicy::buffered(1.0, 0.3));
        assert_eq!(output.last().unwrap().end_sec, 9.5);
    }

    #[test]
    fn test_multi_word_only_refuses_single_word_tail() {
        let policy = TailExtensionPolicy {
            multi_word_only: true,
            ..TailExtensionPolicy::buffered(1.0, 0.3)
        };

        let single = postprocess(seq(&[(0.0, 5.0, "Goodbye")]), 10.0, &policy);
        assert_eq!(single.last().unwrap().end_sec, 5.0);

        let multi = postprocess(seq(&[(0.0, 5.0, "Good bye")]), 10.0, &policy);
        assert_close(multi.last().unwrap().end_sec, 5.3);
    }

    #[test]
    fn test_strict_policy_only_closes_short_gaps() {
        let policy = TailExtensionPolicy::strict();

        let short_gap = postprocess(seq(&[(0.0, 9.7, "see you")]), 10.0, &policy);
        assert_close(short_gap.last().unwrap().end_sec, 10.0);

        let long_gap = postprocess(seq(&[(0.0, 8.0, "see you")]), 10.0, &policy);
        assert_eq!(long_gap.last().unwrap().end_sec, 8.0);
    }

    #[test]
    fn test_audio_shorter_than_captions_is_left_alone() {
        let input = seq(&[(0.0, 5.0, "over run")]);
        let output = postprocess(input, 4.0, &TailExtensionPolicy::buffered(0.0, 0.3));
        assert_eq!(output.last().unwrap().end_sec, 5.0);
    }

    #[test]
    fn test_dedup_runs_before_extension() {
        let input = seq(&[
            (0.0, 3.0, "so long"),
            (3.0, 6.0, "and thanks"),
            (6.0, 7.0, "and thanks"),
        ]);
        let output = postprocess(input, 10.0, &TailExtensionPolicy::buffered(1.0, 0.3));

        assert_eq!(output.len(), 2);
        assert_close(output.last().unwrap().end_sec, 6.3);
    }

    #[test]
    fn test_empty_sequence_passes_through() {
        let output = postprocess(CaptionSequence::new(), 10.0, &TailExtensionPolicy::default());
        assert!(output.is_empty());
    }

    #[test]
    fn test_policy_deserializes_with_defaults() {
        let policy: TailExtensionPolicy = serde_json::from_str(r#"{"bufferSec": 0.5}"#).unwrap();
        assert_eq!(policy.buffer_sec, 0.5);
        assert_eq!(policy.threshold_sec, 1.0);
        assert!(policy.multi_word_only);
        assert!(policy.max_gap_sec.is_none());
    }

    // -------------------------------------------------------------------------
    // Duration Merge Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_merge_by_duration_groups_short_cues() {
        let input = seq(&[
            (0.0, 2.0, "a"),
            (2.0, 4.0, "b"),
            (4.0, 6.0, "c"),
            (6.0, 8.0, "d"),
        ]);
        let merged = merge_by_duration(&input, 5.0, 10.0);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged.cues()[0], CaptionCue::new(0.0, 6.0, "a b c"));
        assert_eq!(merged.cues()[1], CaptionCue::new(6.0, 8.0, "d"));
    }

    #[test]
    fn test_merge_by_duration_stops_at_max() {
        let input = seq(&[(0.0, 1.0, "short"), (1.0, 12.0, "very long"), (12.0, 13.0, "x")]);
        let merged = merge_by_duration(&input, 5.0, 10.0);

        assert_eq!(merged.cues()[0], CaptionCue::new(0.0, 12.0, "short very long"));
        assert_eq!(merged.cues()[1].text, "x");
    }

    #[test]
    fn test_merge_keeps_long_cues_alone() {
        let input = seq(&[(0.0, 6.0, "long enough"), (6.0, 12.0, "also long")]);
        assert_eq!(merge_by_duration(&input, 5.0, 10.0), input);
    }
}
