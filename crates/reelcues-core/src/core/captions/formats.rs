//! Caption Format Parsers and Exporters
//!
//! Hands cue sequences to the renderer in the formats burn-in tools accept:
//! - SRT (SubRip)
//! - VTT (WebVTT)
//! - JSON (the serde form of [`CaptionSequence`])
//!
//! SRT and VTT can also be parsed back so existing caption files can be
//! post-processed.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelcues_core::core::captions::{export_srt, parse_vtt};
//!
//! let cues = parse_vtt(&std::fs::read_to_string("captions.vtt")?)?;
//! let srt = export_srt(&cues);
//! ```

use std::path::Path;

use super::models::{CaptionCue, CaptionSequence};
use crate::core::CoreResult;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during caption parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Invalid timestamp format
    InvalidTimestamp(String),
    /// Invalid caption format
    InvalidFormat(String),
    /// Missing required data
    MissingData(String),
    /// Unexpected end of input
    UnexpectedEnd,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimestamp(s) => write!(f, "Invalid timestamp: {}", s),
            Self::InvalidFormat(s) => write!(f, "Invalid format: {}", s),
            Self::MissingData(s) => write!(f, "Missing data: {}", s),
            Self::UnexpectedEnd => write!(f, "Unexpected end of input"),
        }
    }
}

impl std::error::Error for ParseError {}

// =============================================================================
// Caption Format Selection
// =============================================================================

/// Output formats understood by the renderer hand-off
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CaptionFormat {
    /// SubRip (.srt)
    #[default]
    Srt,
    /// WebVTT (.vtt)
    Vtt,
    /// JSON list of cues (.json)
    Json,
    /// Human-readable listing
    Pretty,
}

impl CaptionFormat {
    /// Infers the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "srt" => Some(Self::Srt),
            "vtt" => Some(Self::Vtt),
            "json" => Some(Self::Json),
            "txt" => Some(Self::Pretty),
            _ => None,
        }
    }

    /// Returns the format name for logging/display
    pub fn name(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Vtt => "vtt",
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }

    /// Serializes a cue sequence in this format
    pub fn render(&self, cues: &CaptionSequence) -> CoreResult<String> {
        Ok(match self {
            Self::Srt => export_srt(cues),
            Self::Vtt => export_vtt(cues),
            Self::Json => serde_json::to_string_pretty(cues)?,
            Self::Pretty => cues.to_string(),
        })
    }

    /// Parses a document in this format
    pub fn parse(&self, content: &str) -> CoreResult<CaptionSequence> {
        Ok(match self {
            Self::Srt => parse_srt(content)?,
            Self::Vtt => parse_vtt(content)?,
            Self::Json => serde_json::from_str(content)?,
            Self::Pretty => {
                return Err(
                    ParseError::InvalidFormat("pretty listings cannot be parsed".into()).into(),
                )
            }
        })
    }
}

impl std::str::FromStr for CaptionFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "srt" => Ok(Self::Srt),
            "vtt" | "webvtt" => Ok(Self::Vtt),
            "json" => Ok(Self::Json),
            "pretty" | "txt" => Ok(Self::Pretty),
            _ => Err(format!("Unknown caption format: {}", s)),
        }
    }
}

// =============================================================================
// SRT Format
// =============================================================================

/// Parses SRT (SubRip) format content into a cue sequence
///
/// # SRT Format
///
/// ```text
/// 1
/// 00:00:01,000 --> 00:00:04,000
/// First caption text
///
/// 2
/// 00:00:05,500 --> 00:00:08,000
/// Second caption text
/// with multiple lines
/// ```
pub fn parse_srt(content: &str) -> Result<CaptionSequence, ParseError> {
    let mut cues = Vec::new();
    let mut lines = content.lines().peekable();

    while lines.peek().is_some() {
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }

        if lines.peek().is_none() {
            break;
        }

        // Sequence number (not validated)
        let _seq = lines.next().ok_or(ParseError::UnexpectedEnd)?;

        let timestamp_line = lines.next().ok_or(ParseError::UnexpectedEnd)?;
        let (start_sec, end_sec) = parse_timestamp_line(timestamp_line, parse_srt_timestamp)?;

        let text_lines = take_text_lines(&mut lines);
        if text_lines.is_empty() {
            return Err(ParseError::MissingData("Caption text".to_string()));
        }

        cues.push(CaptionCue::new(start_sec, end_sec, &text_lines.join("\n")));
    }

    Ok(CaptionSequence::from_cues(cues))
}

/// Parses an SRT timestamp (e.g., "00:01:23,456") into seconds
fn parse_srt_timestamp(ts: &str) -> Result<f64, ParseError> {
    let normalized = ts.replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();

    if parts.len() != 3 {
        return Err(ParseError::InvalidTimestamp(ts.to_string()));
    }

    let hours = parse_component(parts[0], ts)?;
    let minutes = parse_component(parts[1], ts)?;
    let seconds = parse_component(parts[2], ts)?;

    Ok(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Exports cues to SRT format
pub fn export_srt(cues: &CaptionSequence) -> String {
    let mut output = String::new();

    for (index, cue) in cues.iter().enumerate() {
        output.push_str(&format!("{}\n", index + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_timestamp(cue.start_sec, ','),
            format_timestamp(cue.end_sec, ',')
        ));
        output.push_str(&cue.text);
        output.push_str("\n\n");
    }

    output.trim_end().to_string()
}

// =============================================================================
// VTT Format
// =============================================================================

/// Parses WebVTT format content into a cue sequence
///
/// # VTT Format
///
/// ```text
/// WEBVTT
///
/// 00:00:01.000 --> 00:00:04.000
/// First caption text
///
/// 00:00:05.500 --> 00:00:08.000
/// Second caption text
/// ```
pub fn parse_vtt(content: &str) -> Result<CaptionSequence, ParseError> {
    let mut cues = Vec::new();
    let mut lines = content.lines().peekable();

    if let Some(first_line) = lines.next() {
        if !first_line.trim_start_matches('\u{feff}').starts_with("WEBVTT") {
            return Err(ParseError::InvalidFormat(
                "VTT file must start with WEBVTT".to_string(),
            ));
        }
    }

    // Header metadata runs until the first blank line
    while lines.peek().is_some_and(|l| !l.trim().is_empty()) {
        lines.next();
    }

    while lines.peek().is_some() {
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }

        if lines.peek().is_none() {
            break;
        }

        let first_line = lines.next().ok_or(ParseError::UnexpectedEnd)?;
        let timestamp_line = if first_line.contains("-->") {
            first_line
        } else {
            // Cue identifier; the timing line follows
            lines.next().ok_or(ParseError::UnexpectedEnd)?
        };

        let (start_sec, end_sec) = parse_timestamp_line(timestamp_line, parse_vtt_timestamp)?;

        let text_lines = take_text_lines(&mut lines);
        if text_lines.is_empty() {
            return Err(ParseError::MissingData("Caption text".to_string()));
        }

        let text = text_lines
            .iter()
            .map(|l| strip_vtt_tags(l))
            .collect::<Vec<_>>()
            .join("\n");
        cues.push(CaptionCue::new(start_sec, end_sec, &text));
    }

    Ok(CaptionSequence::from_cues(cues))
}

/// Parses a VTT timestamp (e.g., "00:01:23.456" or "01:23.456") into seconds
fn parse_vtt_timestamp(ts: &str) -> Result<f64, ParseError> {
    let parts: Vec<&str> = ts.split(':').collect();

    match parts.len() {
        2 => {
            let minutes = parse_component(parts[0], ts)?;
            let seconds = parse_component(parts[1], ts)?;
            Ok(minutes * 60.0 + seconds)
        }
        3 => {
            let hours = parse_component(parts[0], ts)?;
            let minutes = parse_component(parts[1], ts)?;
            let seconds = parse_component(parts[2], ts)?;
            Ok(hours * 3600.0 + minutes * 60.0 + seconds)
        }
        _ => Err(ParseError::InvalidTimestamp(ts.to_string())),
    }
}

/// Strips VTT formatting tags from text
fn strip_vtt_tags(text: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}

/// Exports cues to WebVTT format
pub fn export_vtt(cues: &CaptionSequence) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for cue in cues {
        output.push_str(&format!(
            "{} --> {}\n",
            format_timestamp(cue.start_sec, '.'),
            format_timestamp(cue.end_sec, '.')
        ));
        output.push_str(&cue.text);
        output.push_str("\n\n");
    }

    output.trim_end().to_string()
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Splits "start --> end [settings]" and parses both sides
fn parse_timestamp_line(
    line: &str,
    parse: fn(&str) -> Result<f64, ParseError>,
) -> Result<(f64, f64), ParseError> {
    let parts: Vec<&str> = line.split("-->").collect();
    if parts.len() != 2 {
        return Err(ParseError::InvalidFormat(format!(
            "Expected 'start --> end' format: {}",
            line
        )));
    }

    let start_str = parts[0].trim();
    let end_part = parts[1].trim();
    // VTT cue settings may follow the end timestamp
    let end_str = end_part.split_whitespace().next().unwrap_or(end_part);

    Ok((parse(start_str)?, parse(end_str)?))
}

fn parse_component(part: &str, ts: &str) -> Result<f64, ParseError> {
    part.trim()
        .parse()
        .map_err(|_| ParseError::InvalidTimestamp(ts.to_string()))
}

fn take_text_lines<'a, I>(lines: &mut std::iter::Peekable<I>) -> Vec<&'a str>
where
    I: Iterator<Item = &'a str>,
{
    let mut text_lines = Vec::new();
    while let Some(line) = lines.next_if(|l| !l.trim().is_empty()) {
        text_lines.push(line);
    }
    text_lines
}

/// Formats seconds as `HH:MM:SS<sep>mmm`
fn format_timestamp(seconds: f64, millis_separator: char) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        hours, mins, secs, millis_separator, ms
    )
}

// =============================================================================
// Tests
// =============================================================================
