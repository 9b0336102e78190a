//! # File Management Module
//!
//! Questo modulo gestisce le operazioni sui file e la discovery delle immagini.
//!
//! ## Responsabilità:
//! - Espansione dei pattern `{dir}/*.{jpg,jpeg,png}` (un solo livello, case-sensitive)
//! - Creazione idempotente della directory di output
//! - Lettura delle dimensioni dei file prodotti dall'optimizer
//! - Scrittura atomica nella directory di output (file temporaneo + rename)
//! - Formattazione delle dimensioni (KB con un decimale, formato leggibile)
//!
//! ## Esempio:
//! ```rust,ignore
//! let files = FileManager::expand_pattern("static/images/*.{jpg,png}")?;
//! for file in files {
//!     let size = FileManager::file_size(&file).await?;
//!     println!("{}: {}KB", file.display(), FileManager::format_kilobytes(size));
//! }
//! ```

use crate::error::SyncError;
use globset::GlobBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Create `dir` and its parents if missing. Returns true when something was created.
    pub async fn ensure_dir(dir: &Path) -> Result<bool, SyncError> {
        if dir.is_dir() {
            return Ok(false);
        }

        fs::create_dir_all(dir).await?;
        debug!("Created directory: {}", dir.display());
        Ok(true)
    }

    /// Expand a set of `{dir}/{file glob}` patterns into matching files.
    ///
    /// Only the direct children of each directory are considered. Files matched by
    /// more than one pattern are returned once, in the order first seen.
    pub fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>, SyncError> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for pattern in patterns {
            for file in Self::expand_pattern(pattern)? {
                if seen.insert(file.clone()) {
                    files.push(file);
                }
            }
        }

        Ok(files)
    }

    /// Expand a single `{dir}/{file glob}` pattern, sorted by file name
    pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>, SyncError> {
        let (dir, file_glob) = Self::split_pattern(pattern)?;

        let matcher = GlobBuilder::new(file_glob)
            .literal_separator(true)
            .build()?
            .compile_matcher();

        if !dir.is_dir() {
            warn!("Input directory does not exist: {}", dir.display());
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(std::io::Error::from)?;
            if Self::is_hidden(entry.file_name()) {
                continue;
            }
            if entry.file_type().is_file() && matcher.is_match(entry.file_name()) {
                files.push(entry.into_path());
            }
        }

        debug!("Pattern {} matched {} files", pattern, files.len());
        Ok(files)
    }

    /// Dot-files are never part of the input set
    fn is_hidden(name: &std::ffi::OsStr) -> bool {
        name.to_string_lossy().starts_with('.')
    }

    /// Split `static/images/*.{jpg,png}` into `static/images` and `*.{jpg,png}`
    fn split_pattern(pattern: &str) -> Result<(&Path, &str), SyncError> {
        let path = Path::new(pattern);
        let file_glob = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| SyncError::Validation(format!("Pattern has no file part: {}", pattern)))?;
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        Ok((dir, file_glob))
    }

    /// Path `source` lands at inside `destination`
    pub fn destination_for(source: &Path, destination: &Path) -> Result<PathBuf, SyncError> {
        let file_name = source
            .file_name()
            .ok_or_else(|| SyncError::Validation(format!("Invalid file name: {}", source.display())))?;
        Ok(destination.join(file_name))
    }

    /// Write `target` through a temporary file in the same directory, then rename it into place
    pub fn persist_into(temp: NamedTempFile, target: &Path) -> Result<(), SyncError> {
        temp.persist(target)?;
        Ok(())
    }

    /// Temporary file next to where `target` will be written
    pub fn temp_file_for(target: &Path) -> Result<NamedTempFile, SyncError> {
        let dir = target.parent().unwrap_or(Path::new("."));
        Ok(tempfile::Builder::new().prefix(".sync-").tempfile_in(dir)?)
    }

    /// Size of a file in bytes
    pub async fn file_size(path: &Path) -> Result<u64, SyncError> {
        Ok(fs::metadata(path).await?.len())
    }

    /// Size in kilobytes with one decimal place, e.g. `1536` → `"1.5"`.
    ///
    /// Ties round up, so `256` is `"0.3"`.
    pub fn format_kilobytes(size: u64) -> String {
        format!("{:.1}", (size as f64 * 10.0 / 1024.0).round() / 10.0)
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}
