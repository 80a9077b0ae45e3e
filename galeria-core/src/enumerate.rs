use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::{GalleryError, ImagePath, Result};

/// Extension matched (case-insensitively) by [`enumerate_photos`].
pub const PHOTO_EXTENSION: &str = "jpg";

/// Check if a path names a gallery photo based on its extension
pub fn is_photo_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PHOTO_EXTENSION))
}

/// Recursively collect every `*.jpg` file below `root`.
///
/// Entries are sorted by file name at every directory level, so repeated
/// runs over an unchanged tree yield the same order. Hidden entries (names
/// starting with `.`) are skipped along with everything below them.
/// Symlinked directories are not descended into; a symlink that resolves
/// to a regular `*.jpg` file is kept under its link path. Failure to read `root` itself is fatal; unreadable entries
/// further down are logged and skipped.
pub fn enumerate_photos(root: &Path) -> Result<Vec<ImagePath>> {
    info!("Enumerating photos under {}", root.display());

    let access_error = |source| GalleryError::DirectoryAccess {
        path: root.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(root).map_err(access_error)?;
    if !metadata.is_dir() {
        return Err(access_error(std::io::Error::new(
            std::io::ErrorKind::NotADirectory,
            "photo directory is not a directory",
        )));
    }
    // Probe readability up front; walkdir would otherwise report it lazily.
    std::fs::read_dir(root).map_err(access_error)?;

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    let mut photos = Vec::new();
    let mut skipped = 0usize;

    for entry in walker {
        match entry {
            Ok(entry) => {
                if is_photo_entry(&entry) {
                    photos.push(ImagePath::new(entry.into_path()));
                }
            }
            Err(err) if err.depth() == 0 => {
                let source = err.into_io_error().unwrap_or_else(|| {
                    std::io::Error::other("directory walk failed at root")
                });
                return Err(access_error(source));
            }
            Err(err) => {
                skipped += 1;
                warn!("Skipping unreadable entry while enumerating: {}", err);
            }
        }
    }

    info!(
        photos = photos.len(),
        skipped, "Photo enumeration complete"
    );
    Ok(photos)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().as_encoded_bytes().first() == Some(&b'.')
}

fn is_photo_entry(entry: &DirEntry) -> bool {
    let is_file = if entry.path_is_symlink() {
        match std::fs::metadata(entry.path()) {
            Ok(target) => target.is_file(),
            Err(err) => {
                warn!(
                    "Skipping dangling symlink {}: {}",
                    entry.path().display(),
                    err
                );
                false
            }
        }
    } else {
        entry.file_type().is_file()
    };
    if !is_file {
        return false;
    }
    let matched = is_photo_file(entry.path());
    if !matched {
        debug!("Ignoring non-photo file {}", entry.path().display());
    }
    matched
}
