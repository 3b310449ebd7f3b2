//! Caption Settings Persistence
//!
//! Provides persistent segmentation settings with:
//! - Atomic file writes (temp file + rename)
//! - Schema validation with defaults
//! - Migration support for schema changes
//!
//! Storage location: {config_dir}/settings.json

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::captions::{
    SegmenterConfig, TailExtensionPolicy, TextRules, DEFAULT_SENTENCE_BREAK_PATTERN,
    DEFAULT_WORD_CLEANING_PATTERN,
};
use crate::core::{fs as core_fs, CaptionLayout, CoreResult, TimeSec};

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Upper bound for the per-cue character budget
pub const MAX_CHARS_LIMIT: usize = 200;

// =============================================================================
// Caption Settings
// =============================================================================

/// Everything that shapes a segmentation run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaptionSettings {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// Target frame orientation; picks the budget when `max_chars` is unset
    #[serde(default)]
    pub layout: CaptionLayout,

    /// Explicit per-cue character budget
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chars: Option<usize>,

    /// Keep punctuation in caption text
    #[serde(default)]
    pub preserve_punctuation: bool,

    /// Sentence-break and word-cleaning patterns
    #[serde(default)]
    pub patterns: PatternSettings,

    /// Tail-gap extension policy
    #[serde(default)]
    pub tail: TailExtensionPolicy,

    /// Duration-based merging
    #[serde(default)]
    pub merge: MergeSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            layout: CaptionLayout::default(),
            max_chars: None,
            preserve_punctuation: false,
            patterns: PatternSettings::default(),
            tail: TailExtensionPolicy::default(),
            merge: MergeSettings::default(),
        }
    }
}

impl CaptionSettings {
    /// Normalizes and clamps settings so persisted state is always valid.
    ///
    /// Bad values are corrected rather than rejected, so a stale or
    /// hand-edited file never blocks a run.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        if let Some(max_chars) = self.max_chars {
            let clamped = max_chars.clamp(1, MAX_CHARS_LIMIT);
            if clamped != max_chars {
                warn!(max_chars, clamped, "Caption budget out of range, clamping");
            }
            self.max_chars = Some(clamped);
        }

        self.patterns.normalize();
        normalize_tail(&mut self.tail);
        self.merge.normalize();
    }

    /// Character budget after applying the layout default
    pub fn effective_max_chars(&self) -> usize {
        self.max_chars
            .unwrap_or_else(|| self.layout.default_max_chars())
    }

    /// Builds the segmenter configuration these settings describe
    pub fn segmenter_config(&self) -> SegmenterConfig {
        SegmenterConfig {
            max_chars: self.effective_max_chars(),
            preserve_punctuation: self.preserve_punctuation,
            sentence_break_pattern: self.patterns.sentence_break.clone(),
            word_cleaning_pattern: self.patterns.word_cleaning.clone(),
        }
    }
}

fn normalize_tail(tail: &mut TailExtensionPolicy) {
    let defaults = TailExtensionPolicy::default();
    tail.threshold_sec = non_negative_or(tail.threshold_sec, defaults.threshold_sec);
    tail.buffer_sec = non_negative_or(tail.buffer_sec, defaults.buffer_sec);
    if let Some(max_gap) = tail.max_gap_sec {
        if !max_gap.is_finite() || max_gap <= 0.0 {
            warn!(max_gap, "Invalid tail max gap, removing bound");
            tail.max_gap_sec = None;
        }
    }
}

fn non_negative_or(value: TimeSec, fallback: TimeSec) -> TimeSec {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        warn!(value, fallback, "Invalid duration setting, using default");
        fallback
    }
}

// =============================================================================
// Pattern Settings
// =============================================================================

/// Regular expressions used while re-walking the transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatternSettings {
    /// Pattern whose match end opens a new sentence
    #[serde(default = "default_sentence_break")]
    pub sentence_break: String,

    /// Pattern whose matches are stripped from words
    #[serde(default = "default_word_cleaning")]
    pub word_cleaning: String,
}

impl Default for PatternSettings {
    fn default() -> Self {
        Self {
            sentence_break: default_sentence_break(),
            word_cleaning: default_word_cleaning(),
        }
    }
}

impl PatternSettings {
    fn normalize(&mut self) {
        if let Err(e) = TextRules::new(&self.sentence_break, DEFAULT_WORD_CLEANING_PATTERN) {
            warn!("Invalid sentence break pattern, using default: {}", e);
            self.sentence_break = default_sentence_break();
        }
        if let Err(e) = TextRules::new(DEFAULT_SENTENCE_BREAK_PATTERN, &self.word_cleaning) {
            warn!("Invalid word cleaning pattern, using default: {}", e);
            self.word_cleaning = default_word_cleaning();
        }
    }
}

fn default_sentence_break() -> String {
    DEFAULT_SENTENCE_BREAK_PATTERN.to_string()
}

fn default_word_cleaning() -> String {
    DEFAULT_WORD_CLEANING_PATTERN.to_string()
}

// =============================================================================
// Merge Settings
// =============================================================================

/// Duration-based merging of adjacent cues
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MergeSettings {
    /// Merge cues after post-processing
    #[serde(default)]
    pub enabled: bool,

    /// A merged group grows until it lasts at least this long
    #[serde(default = "default_min_segment_sec")]
    pub min_segment_sec: TimeSec,

    /// A merged group stops growing once it lasts this long
    #[serde(default = "default_max_segment_sec")]
    pub max_segment_sec: TimeSec,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            min_segment_sec: default_min_segment_sec(),
            max_segment_sec: default_max_segment_sec(),
        }
    }
}

impl MergeSettings {
    fn normalize(&mut self) {
        self.min_segment_sec = non_negative_or(self.min_segment_sec, default_min_segment_sec());
        self.max_segment_sec = non_negative_or(self.max_segment_sec, default_max_segment_sec());
        if self.max_segment_sec < self.min_segment_sec {
            self.max_segment_sec = self.min_segment_sec;
        }
    }
}

fn default_min_segment_sec() -> TimeSec {
    5.0
}

fn default_max_segment_sec() -> TimeSec {
    10.0
}

// =============================================================================
// Settings Manager
// =============================================================================

/// Settings manager for loading, saving, and resetting settings
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a new settings manager rooted at the given config directory
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            settings_path: config_dir.join(SETTINGS_FILE),
        }
    }

    /// Create a settings manager for an explicit settings file
    pub fn with_file(settings_path: PathBuf) -> Self {
        Self { settings_path }
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Load settings from disk, returning defaults if the file is missing or corrupt
    pub fn load(&self) -> CaptionSettings {
        if !self.settings_path.exists() {
            info!("Settings file not found, using defaults");
            return CaptionSettings::default();
        }

        match self.read() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                CaptionSettings::default()
            }
        }
    }

    fn read(&self) -> CoreResult<CaptionSettings> {
        let content = core_fs::read_input_file(&self.settings_path)?;
        let mut settings: CaptionSettings = serde_json::from_str(&content)?;

        if settings.version < SETTINGS_VERSION {
            info!(
                "Migrating settings from version {} to {}",
                settings.version, SETTINGS_VERSION
            );
            settings = migrate(settings);
        }

        settings.normalize();
        Ok(settings)
    }

    /// Save settings to disk using an atomic write; returns what was persisted
    pub fn save(&self, settings: &CaptionSettings) -> CoreResult<CaptionSettings> {
        let mut normalized = settings.clone();
        normalized.normalize();

        core_fs::atomic_write_json_pretty(&self.settings_path, &normalized)?;
        info!("Settings saved to {:?}", self.settings_path);
        Ok(normalized)
    }

    /// Reset settings to defaults and delete the settings file
    pub fn reset(&self) -> CoreResult<CaptionSettings> {
        if self.settings_path.exists() {
            std::fs::remove_file(&self.settings_path)?;
            info!("Settings file deleted");
        }
        Ok(CaptionSettings::default())
    }
}

/// Migrate settings from an older schema version
fn migrate(mut settings: CaptionSettings) -> CaptionSettings {
    settings.version = SETTINGS_VERSION;
    settings
}

// =============================================================================
// Tests
// =============================================================================
