//! Photo directory scanning.
//!
//! Walks a directory for image files and turns them into [`PhotoInput`]s.
//! Photo ids are paths relative to the scanned root, so the same folder
//! always yields the same ids in the same order.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::generate::{PhotoInput, PhotoSource};

/// Image containers the EXIF reader understands.
const PHOTO_GLOBS: [&str; 1] = ["**/*.{jpg,jpeg,heic,heif,png,tif,tiff,webp}"];

const DEFAULT_EXCLUDES: [&str; 3] = ["**/.git/**", "**/.thumbnails/**", "**/@eaDir/**"];

/// A photo file found by [`scan_photos`].
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoFile {
    /// Path relative to the scan root, `/`-separated.
    pub id: String,
    pub path: PathBuf,
    pub modified_at: DateTime<FixedOffset>,
}

/// Find every photo under `root`, sorted by id.
///
/// Hidden directories are skipped. `exclude_globs` are matched against the
/// relative path in addition to the built-in excludes.
pub fn scan_photos(root: &Path, exclude_globs: &[String]) -> Result<Vec<PhotoFile>> {
    if !root.is_dir() {
        bail!("Photo directory does not exist: {}", root.display());
    }

    let include_set = build_globset(PHOTO_GLOBS.iter().copied())?;
    let exclude_set = build_globset(
        DEFAULT_EXCLUDES
            .iter()
            .copied()
            .chain(exclude_globs.iter().map(String::as_str)),
    )?;

    let mut photos = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let id = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if id.split('/').any(|part| part.starts_with('.')) {
            continue;
        }
        if exclude_set.is_match(&id) || !include_set.is_match(&id) {
            continue;
        }

        photos.push(PhotoFile {
            id,
            path: path.to_path_buf(),
            modified_at: modified_at(path)?,
        });
    }

    photos.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(photos)
}

/// Read a photo's bytes into a generation input.
pub fn read_photo(file: &PhotoFile) -> Result<PhotoInput> {
    let bytes = std::fs::read(&file.path)
        .with_context(|| format!("Failed to read photo: {}", file.path.display()))?;
    Ok(PhotoInput {
        id: file.id.clone(),
        source: PhotoSource::Bytes(bytes),
        file_modified_at: file.modified_at,
    })
}

fn modified_at(path: &Path) -> Result<DateTime<FixedOffset>> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat photo: {}", path.display()))?;
    let modified = metadata.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH);
    Ok(DateTime::<Utc>::from(modified).fixed_offset())
}

fn build_globset<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(true)
            .build()
            .with_context(|| format!("Invalid glob pattern: '{}'", pattern))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
