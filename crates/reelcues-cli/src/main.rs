//! ReelCues command-line harness.
//!
//! Reads a word-level alignment JSON document, segments it into caption cues
//! and writes them as SRT, WebVTT, JSON or a pretty listing.
//!
//! ```text
//! reelcues segment alignment.json --layout portrait --audio-duration 42.5 -o captions.srt
//! reelcues postprocess captions.vtt --audio-duration 42.5 -o fixed.vtt
//! reelcues config init
//! ```

mod logging;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use reelcues_core::core::captions::{
    merge_by_duration, postprocess, CaptionFormat, CaptionSegmenter, CaptionSequence,
    SegmentationReport, TailExtensionPolicy, TranscriptAlignment,
};
use reelcues_core::core::settings::{CaptionSettings, SettingsManager};
use reelcues_core::core::{fs as core_fs, CaptionLayout, TimeSec};

// =============================================================================
// Arguments
// =============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "reelcues",
    version,
    about = "Turn word-level transcript alignments into timed captions"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Also write logs to a daily-rolling file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Settings file (defaults to <config dir>/reelcues/settings.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Segment an alignment JSON document into caption cues
    Segment(SegmentArgs),
    /// Re-run tail fixups (and optional merging) on an existing SRT/VTT/JSON file
    Postprocess(PostprocessArgs),
    /// Manage the settings file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Args)]
struct SegmentArgs {
    /// Alignment JSON produced by the transcriber
    input: PathBuf,

    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    tail: TailArgs,

    /// Maximum characters per caption (overrides the layout default)
    #[arg(long)]
    max_chars: Option<usize>,

    /// Frame orientation used to pick the default budget (portrait, landscape)
    #[arg(long)]
    layout: Option<CaptionLayout>,

    /// Keep punctuation in caption text
    #[arg(long)]
    preserve_punctuation: bool,

    /// Write the segmentation report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct PostprocessArgs {
    /// Existing caption file
    input: PathBuf,

    /// Input format (inferred from the extension when omitted)
    #[arg(long)]
    input_format: Option<CaptionFormat>,

    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    tail: TailArgs,
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: srt, vtt, json, pretty (inferred from --output when omitted)
    #[arg(short, long)]
    format: Option<CaptionFormat>,
}

#[derive(Debug, Args)]
struct TailArgs {
    /// Audio duration in seconds; enables tail-gap extension
    #[arg(long)]
    audio_duration: Option<TimeSec>,

    /// Tail-gap extension policy
    #[arg(long, value_enum)]
    tail: Option<TailMode>,

    /// Merge adjacent cues into groups of 5-10 seconds
    #[arg(long)]
    merge: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TailMode {
    /// Use the policy from the settings file
    Settings,
    /// Close only short gaps on multi-word captions
    Strict,
    /// Never extend the last caption
    Off,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Write the default settings file
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective settings as JSON
    Show,
    /// Delete the settings file
    Reset,
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
enum CliError {
    #[error("Cannot infer caption format of {0}; pass --input-format")]
    UnknownInputFormat(PathBuf),

    #[error("Audio duration must be a finite, non-negative number of seconds, got {0}")]
    InvalidAudioDuration(TimeSec),

    #[error("Settings file already exists at {0}; pass --force to overwrite")]
    SettingsExist(PathBuf),

    #[error("No config directory available on this platform; pass --config")]
    NoConfigDir,
}

// =============================================================================
// Run Summary
// =============================================================================

/// Machine-readable outcome of a `segment` run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    input: PathBuf,
    max_chars: usize,
    cue_count: usize,
    caption_duration_sec: TimeSec,
    report: SegmentationReport,
}

// =============================================================================
// Entry Point
// =============================================================================

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init_logging(cli.verbose, cli.log_dir.as_deref());

    let manager = settings_manager(cli.config.clone())?;

    match cli.command {
        Command::Segment(args) => {
            let settings = manager.load();
            run_segment(&args, settings)?;
        }
        Command::Postprocess(args) => {
            let settings = manager.load();
            run_postprocess(&args, settings)?;
        }
        Command::Config(command) => run_config(&manager, command)?,
    }

    Ok(())
}

fn settings_manager(config: Option<PathBuf>) -> Result<SettingsManager> {
    match config {
        Some(path) => Ok(SettingsManager::with_file(path)),
        None => {
            let dir = dirs::config_dir().ok_or(CliError::NoConfigDir)?;
            Ok(SettingsManager::new(dir.join("reelcues")))
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

fn run_segment(args: &SegmentArgs, mut settings: CaptionSettings) -> Result<RunSummary> {
    apply_segment_overrides(args, &mut settings);
    apply_tail_overrides(&args.tail, &mut settings);

    let config = settings.segmenter_config();
    let segmenter = CaptionSegmenter::new(&config).context("Invalid segmentation settings")?;

    let alignment = TranscriptAlignment::load(&args.input)
        .with_context(|| format!("Failed to load alignment {}", args.input.display()))?;

    info!(
        input = %args.input.display(),
        words = alignment.word_count(),
        max_chars = segmenter.max_chars(),
        preserve_punctuation = segmenter.preserve_punctuation(),
        "Segmenting transcript"
    );

    let (cues, report) = segmenter.segment_with_report(&alignment);
    report.log_summary();

    let cues = finish_cues(cues, &args.tail, &settings)?;
    write_cues(&cues, &args.output)?;

    let summary = RunSummary {
        input: args.input.clone(),
        max_chars: segmenter.max_chars(),
        cue_count: cues.len(),
        caption_duration_sec: cues.duration(),
        report,
    };

    if let Some(report_path) = &args.report {
        core_fs::atomic_write_json_pretty(report_path, &summary)
            .with_context(|| format!("Failed to write report {}", report_path.display()))?;
        debug!(path = %report_path.display(), "Wrote segmentation report");
    }

    Ok(summary)
}

fn run_postprocess(
    args: &PostprocessArgs,
    mut settings: CaptionSettings,
) -> Result<CaptionSequence> {
    apply_tail_overrides(&args.tail, &mut settings);

    let input_format = match args.input_format {
        Some(format) => format,
        None => CaptionFormat::from_path(&args.input)
            .ok_or_else(|| CliError::UnknownInputFormat(args.input.clone()))?,
    };

    let content = core_fs::read_input_file(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let cues = input_format.parse(&content).with_context(|| {
        format!(
            "Failed to parse {} as {}",
            args.input.display(),
            input_format.name()
        )
    })?;

    let cues = finish_cues(cues, &args.tail, &settings)?;
    write_cues(&cues, &args.output)?;
    Ok(cues)
}

fn run_config(manager: &SettingsManager, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Init { force } => {
            let path = manager.settings_path();
            if path.exists() && !force {
                return Err(CliError::SettingsExist(path.to_path_buf()).into());
            }
            manager
                .save(&CaptionSettings::default())
                .with_context(|| format!("Failed to write settings {}", path.display()))?;
            println!("{}", path.display());
        }
        ConfigCommand::Show => {
            let settings = manager.load();
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigCommand::Reset => {
            manager.reset().context("Failed to reset settings")?;
        }
    }
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn apply_segment_overrides(args: &SegmentArgs, settings: &mut CaptionSettings) {
    if let Some(layout) = args.layout {
        settings.layout = layout;
        // An explicit layout picks its own budget unless --max-chars is also given
        settings.max_chars = None;
    }
    if let Some(max_chars) = args.max_chars {
        settings.max_chars = Some(max_chars);
    }
    if args.preserve_punctuation {
        settings.preserve_punctuation = true;
    }
}

fn apply_tail_overrides(args: &TailArgs, settings: &mut CaptionSettings) {
    match args.tail {
        Some(TailMode::Strict) => settings.tail = TailExtensionPolicy::strict(),
        Some(TailMode::Off) => settings.tail = TailExtensionPolicy::disabled(),
        Some(TailMode::Settings) | None => {}
    }
    if args.merge {
        settings.merge.enabled = true;
    }
}

/// Post-processing and optional merging shared by both pipelines
fn finish_cues(
    cues: CaptionSequence,
    args: &TailArgs,
    settings: &CaptionSettings,
) -> Result<CaptionSequence> {
    let cues = match args.audio_duration {
        Some(duration) if !duration.is_finite() || duration < 0.0 => {
            return Err(CliError::InvalidAudioDuration(duration).into());
        }
        Some(duration) => postprocess(cues, duration, &settings.tail),
        None => postprocess(cues, TimeSec::NAN, &TailExtensionPolicy::disabled()),
    };

    if settings.merge.enabled {
        let merged = merge_by_duration(
            &cues,
            settings.merge.min_segment_sec,
            settings.merge.max_segment_sec,
        );
        debug!(before = cues.len(), after = merged.len(), "Merged cues by duration");
        return Ok(merged);
    }

    Ok(cues)
}

fn resolve_output_format(output: &OutputArgs) -> CaptionFormat {
    output
        .format
        .or_else(|| output.output.as_deref().and_then(CaptionFormat::from_path))
        .unwrap_or_default()
}

fn write_cues(cues: &CaptionSequence, output: &OutputArgs) -> Result<()> {
    let format = resolve_output_format(output);
    let rendered = format.render(cues).context("Failed to render captions")?;

    match &output.output {
        Some(path) => {
            write_document(path, &rendered)?;
            info!(
                path = %path.display(),
                format = format.name(),
                cues = cues.len(),
                "Wrote captions"
            );
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn write_document(path: &Path, content: &str) -> Result<()> {
    let mut document = content.to_string();
    if !document.ends_with('\n') {
        document.push('\n');
    }
    core_fs::atomic_write_str(path, &document)
        .with_context(|| format!("Failed to write {}", path.display()))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ALIGNMENT: &str = r#"{
        "text": "Bananas are berries. Strawberries are not berries at all.",
        "segments": [
            {"words": [
                {"text": "Bananas", "end": 0.5},
                {"text": "are", "end": 0.8},
                {"text": "berries.", "end": 1.3}
            ]},
            {"words": [
                {"text": "Strawberries", "end": 2.1},
                {"text": "are", "end": 2.3},
                {"text": "not", "end": 2.6},
                {"text": "berries", "end": 3.0},
                {"text": "at", "end": 3.2},
                {"text": "all.", "end": 3.6}
            ]}
        ]
    }"#;

    fn output_args(output: Option<PathBuf>, format: Option<CaptionFormat>) -> OutputArgs {
        OutputArgs { output, format }
    }

    fn tail_args(audio_duration: Option<TimeSec>) -> TailArgs {
        TailArgs {
            audio_duration,
            tail: None,
            merge: false,
        }
    }

    fn segment_args(input: PathBuf, output: PathBuf) -> SegmentArgs {
        SegmentArgs {
            input,
            output: output_args(Some(output), None),
            tail: tail_args(Some(5.0)),
            max_chars: None,
            layout: None,
            preserve_punctuation: false,
            report: None,
        }
    }

    #[test]
    fn test_cli_parses_segment_flags() {
        let cli = Cli::try_parse_from([
            "reelcues",
            "-v",
            "segment",
            "in.json",
            "--layout",
            "portrait",
            "--max-chars",
            "12",
            "--tail",
            "strict",
            "--audio-duration",
            "9.5",
            "-o",
            "out.vtt",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        let Command::Segment(args) = cli.command else {
            panic!("expected segment command");
        };
        assert_eq!(args.layout, Some(CaptionLayout::Portrait));
        assert_eq!(args.max_chars, Some(12));
        assert_eq!(args.tail.tail, Some(TailMode::Strict));
        assert_eq!(args.tail.audio_duration, Some(9.5));
        assert_eq!(resolve_output_format(&args.output), CaptionFormat::Vtt);
    }

    #[test]
    fn test_layout_flag_resets_budget_unless_explicit() {
        let mut settings = CaptionSettings {
            max_chars: Some(33),
            ..Default::default()
        };
        let mut args = segment_args(PathBuf::from("a.json"), PathBuf::from("b.srt"));
        args.layout = Some(CaptionLayout::Portrait);

        apply_segment_overrides(&args, &mut settings);
        assert_eq!(settings.effective_max_chars(), 20);

        args.max_chars = Some(15);
        apply_segment_overrides(&args, &mut settings);
        assert_eq!(settings.effective_max_chars(), 15);
    }

    #[test]
    fn test_segment_writes_srt_and_report() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("alignment.json");
        let output = dir.path().join("captions.srt");
        let report = dir.path().join("report.json");
        std::fs::write(&input, ALIGNMENT).unwrap();

        let mut args = segment_args(input, output.clone());
        args.report = Some(report.clone());
        let summary = run_segment(&args, CaptionSettings::default()).unwrap();

        assert_eq!(summary.max_chars, 40);
        assert_eq!(summary.cue_count, 3);
        assert!(summary.report.is_clean());

        let srt = std::fs::read_to_string(&output).unwrap();
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:01,300\nBananas are berries\n"));
        // Half-budget rule stops the second sentence after 20 chars
        assert!(srt.contains("2\n00:00:01,300 --> 00:00:02,600\nStrawberries are not\n"));
        // Tail extended from 3.6 by the default 0.3s buffer
        assert!(srt.contains("3\n00:00:02,600 --> 00:00:03,900\nberries at all\n"));

        let report_json = std::fs::read_to_string(&report).unwrap();
        assert!(report_json.contains("\"cueCount\": 3"));
    }

    #[test]
    fn test_segment_rejects_zero_budget() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("alignment.json");
        std::fs::write(&input, ALIGNMENT).unwrap();

        let mut args = segment_args(input, dir.path().join("out.srt"));
        args.max_chars = Some(0);
        assert!(run_segment(&args, CaptionSettings::default()).is_err());
    }

    #[test]
    fn test_segment_missing_input_fails() {
        let dir = TempDir::new().unwrap();
        let args = segment_args(dir.path().join("missing.json"), dir.path().join("out.srt"));
        assert!(run_segment(&args, CaptionSettings::default()).is_err());
    }

    #[test]
    fn test_postprocess_removes_duplicate_tail() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("captions.srt");
        let output = dir.path().join("fixed.json");
        std::fs::write(
            &input,
            "1\n00:00:00,000 --> 00:00:02,000\nsee you soon\n\n\
             2\n00:00:02,000 --> 00:00:03,000\nsee you soon\n",
        )
        .unwrap();

        let args = PostprocessArgs {
            input,
            input_format: None,
            output: output_args(Some(output.clone()), None),
            tail: tail_args(None),
        };
        let cues = run_postprocess(&args, CaptionSettings::default()).unwrap();

        assert_eq!(cues.len(), 1);
        assert_eq!(cues.cues()[0].end_sec, 2.0);
        let json = std::fs::read_to_string(&output).unwrap();
        assert!(json.contains("\"endSec\": 2.0"));
    }

    #[test]
    fn test_postprocess_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("captions.ass");
        std::fs::write(&input, "whatever").unwrap();

        let args = PostprocessArgs {
            input,
            input_format: None,
            output: output_args(None, None),
            tail: tail_args(None),
        };
        let err = run_postprocess(&args, CaptionSettings::default()).unwrap_err();
        assert!(err.downcast_ref::<CliError>().is_some());
    }

    #[test]
    fn test_invalid_audio_duration() {
        let cues = CaptionSequence::new();
        let result = finish_cues(cues, &tail_args(Some(-1.0)), &CaptionSettings::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_config_init_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let manager = SettingsManager::with_file(dir.path().join("settings.json"));

        run_config(&manager, ConfigCommand::Init { force: false }).unwrap();
        assert!(manager.settings_path().exists());
        assert!(run_config(&manager, ConfigCommand::Init { force: false }).is_err());
        assert!(run_config(&manager, ConfigCommand::Init { force: true }).is_ok());

        run_config(&manager, ConfigCommand::Reset).unwrap();
        assert!(!manager.settings_path().exists());
    }
}
