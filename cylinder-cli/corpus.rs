use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::{MatchError, MatchResult};

/// One fingerprint file of the corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    /// File name as it appears in the report
    pub name: String,
    pub path: PathBuf,
}

impl ImageEntry {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, path }
    }
}

/// Files directly inside `dir` whose extension matches `extension`
/// (case-insensitive, leading dot optional), sorted by file name.
/// Symlinks count when they resolve to a regular file.
pub fn list_images<P: AsRef<Path>>(dir: P, extension: &str) -> MatchResult<Vec<ImageEntry>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(MatchError::Corpus {
            dir: dir.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    let extension = extension.trim_start_matches('.');

    let mut images = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| MatchError::Corpus {
            dir: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !entry.path().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if matches {
            images.push(ImageEntry::new(entry.into_path()));
        }
    }

    debug!("{} *.{} files in {}", images.len(), extension, dir.display());
    Ok(images)
}
