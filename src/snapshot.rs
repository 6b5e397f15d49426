//! On-demand filesystem snapshots of the watched directory.
//!
//! Computed fresh for each newly connected viewer, never cached. The hub
//! sends the result once as a `filesystem_state` message and forgets it.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::record::system_time_iso;

/// One immediate entry of the watched directory.
#[derive(Debug, Clone, Serialize)]
pub struct DirEntryInfo {
    /// File or folder name (no path).
    pub name: String,
    /// `"file"` or `"folder"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Byte size for files, `null` for folders.
    pub size: Option<u64>,
    /// ISO-8601 modification time.
    pub modified: String,
}

/// List the immediate entries of `dir`, sorted by name.
///
/// # Errors
///
/// Returns an error if the directory cannot be read; callers treat this as
/// "snapshot unavailable" and omit it (logged, not fatal).
pub fn capture(dir: &Path) -> Result<Vec<DirEntryInfo>> {
    let read = fs::read_dir(dir)
        .with_context(|| format!("read watched directory {}", dir.display()))?;

    let mut entries = Vec::new();
    for entry in read {
        let entry = entry.context("read directory entry")?;
        let meta = entry
            .metadata()
            .with_context(|| format!("stat {}", entry.path().display()))?;
        let is_dir = meta.is_dir();
        entries.push(DirEntryInfo {
            name: entry.file_name().to_string_lossy().into_owned(),
            kind: if is_dir { "folder" } else { "file" }.to_string(),
            size: if is_dir { None } else { Some(meta.len()) },
            modified: meta
                .modified()
                .map(system_time_iso)
                .unwrap_or_default(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_lists_files_and_folders() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), b"0123456789").unwrap();
        fs::create_dir(tmp.path().join("b")).unwrap();

        let entries = capture(tmp.path()).unwrap();
        assert_eq!(entries.len(), 2);

        let file = entries.iter().find(|e| e.name == "a.txt").unwrap();
        assert_eq!(file.kind, "file");
        assert_eq!(file.size, Some(10));
        assert!(file.modified.contains('T'));

        let folder = entries.iter().find(|e| e.name == "b").unwrap();
        assert_eq!(folder.kind, "folder");
        assert_eq!(folder.size, None);
    }

    #[test]
    fn test_capture_serializes_null_size_for_folders() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("docs")).unwrap();

        let entries = capture(tmp.path()).unwrap();
        let json = serde_json::to_value(&entries).unwrap();
        assert_eq!(json[0]["name"], "docs");
        assert_eq!(json[0]["type"], "folder");
        assert!(json[0]["size"].is_null());
    }

    #[test]
    fn test_capture_missing_directory_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(capture(&missing).is_err());
    }

    #[test]
    fn test_capture_is_sorted_by_name() {
        let tmp = tempfile::TempDir::new().unwrap();
        for name in ["zebra.txt", "alpha.txt", "mid.txt"] {
            fs::write(tmp.path().join(name), b"x").unwrap();
        }
        let names: Vec<String> = capture(tmp.path())
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["alpha.txt", "mid.txt", "zebra.txt"]);
    }
}
