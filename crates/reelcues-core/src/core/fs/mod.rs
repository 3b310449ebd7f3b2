//! Filesystem utilities.
//!
//! Caption files and settings are written with an atomic replace so a crash
//! mid-write never leaves a renderer reading a truncated SRT or a corrupt
//! settings file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::{CoreError, CoreResult};

// =============================================================================
// Input Helpers
// =============================================================================

/// Reads a UTF-8 input file, mapping a missing file to [`CoreError::FileNotFound`].
pub fn read_input_file(path: &Path) -> CoreResult<String> {
    if !path.is_file() {
        return Err(CoreError::FileNotFound(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?)
}

// =============================================================================
// Atomic Writes
// =============================================================================

/// Write bytes to `path` using an atomic replace pattern.
///
/// Implementation notes:
/// - Write to a sibling temporary file.
/// - Flush and sync the temp file.
/// - Swap into place by renaming.
/// - If the destination exists, it is first moved aside as a `.bak` file, then removed.
pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = tmp_path_for(path);
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    atomic_replace(path, &tmp_path)?;
    Ok(())
}

/// Write a text document (SRT, VTT, ...) atomically.
pub fn atomic_write_str(path: &Path, content: &str) -> CoreResult<()> {
    atomic_write_bytes(path, content.as_bytes())
}

/// Write a JSON file atomically with pretty formatting.
pub fn atomic_write_json_pretty<T: serde::Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    atomic_write_bytes(path, &bytes)
}

fn tmp_path_for(path: &Path) -> PathBuf {
    sibling_with_suffix(path, "tmp")
}

fn bak_path_for(path: &Path) -> PathBuf {
    sibling_with_suffix(path, "bak")
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut sibling = path.to_path_buf();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| suffix.to_string());
    sibling.set_file_name(format!("{file_name}.{suffix}"));
    sibling
}

/// Moves `staged` over `dest`, parking any existing `dest` as a `.bak` sibling
/// until the swap succeeds so a failed rename can be rolled back.
fn atomic_replace(dest: &Path, staged: &Path) -> CoreResult<()> {
    if !dest.exists() {
        std::fs::rename(staged, dest)?;
        return Ok(());
    }

    let parked = bak_path_for(dest);
    if parked.exists() {
        std::fs::remove_file(&parked)?;
    }
    std::fs::rename(dest, &parked)?;

    if let Err(e) = std::fs::rename(staged, dest) {
        // Roll back to the previous document
        let _ = std::fs::rename(&parked, dest);
        let _ = std::fs::remove_file(staged);
        return Err(e.into());
    }

    let _ = std::fs::remove_file(&parked);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_bytes_creates_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("captions.srt");

        atomic_write_bytes(&path, b"one").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one");

        atomic_write_bytes(&path, b"two").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");

        // No temp or backup files are left behind
        assert!(!dir.path().join("captions.srt.tmp").exists());
        assert!(!dir.path().join("captions.srt.bak").exists());
    }

    #[test]
    fn atomic_write_creates_missing_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("nested").join("cues.json");

        atomic_write_json_pretty(&path, &vec![1, 2, 3]).unwrap();
        let parsed: Vec<i32> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, vec![1, 2, 3]);
    }

    #[test]
    fn read_input_file_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = read_input_file(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(CoreError::FileNotFound(_))));
    }

    #[test]
    fn tmp_and_bak_paths_are_siblings() {
        let path = Path::new("/tmp/out/captions.vtt");
        assert_eq!(tmp_path_for(path), PathBuf::from("/tmp/out/captions.vtt.tmp"));
        assert_eq!(bak_path_for(path), PathBuf::from("/tmp/out/captions.vtt.bak"));
    }
}
