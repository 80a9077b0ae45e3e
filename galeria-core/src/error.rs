use std::{fmt, path::PathBuf};

use thiserror::Error;

use crate::pipeline::PipelineState;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("cannot read photo directory {}: {source}", path.display())]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode JPEG: {0}")]
    Encode(String),

    #[error("thumbnail task for photo #{position} panicked")]
    TaskPanicked { position: usize },

    #[error(transparent)]
    Batch(#[from] BatchFailure),

    #[error("invalid pipeline transition {from:?} -> {to:?}")]
    InvalidTransition {
        from: PipelineState,
        to: PipelineState,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GalleryError {
    /// Classify an `image` error raised while reading `path`.
    ///
    /// Read failures surface as [`GalleryError::Io`]; everything else the
    /// decoder rejects is a [`GalleryError::Decode`].
    pub(crate) fn from_image(path: PathBuf, err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(source) => Self::Io { path, source },
            source => Self::Decode { path, source },
        }
    }
}

/// Outcome of a strict build in which at least one item failed.
///
/// Carries the first failure in enumeration order together with enough
/// bookkeeping to tell how much of the batch did succeed.
#[derive(Debug)]
pub struct BatchFailure {
    pub position: usize,
    pub first: Box<GalleryError>,
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} thumbnails failed ({} succeeded); first failure at photo #{}: {}",
            self.failed, self.total, self.succeeded, self.position, self.first
        )
    }
}

impl std::error::Error for BatchFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.first.as_ref())
    }
}

pub type Result<T> = std::result::Result<T, GalleryError>;
