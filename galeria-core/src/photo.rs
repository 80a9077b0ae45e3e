use bytes::Bytes;
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Path of one source JPEG as discovered by the enumerator.
///
/// Cheap to clone; the path itself is never mutated after enumeration.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ImagePath(Arc<Path>);

impl ImagePath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(Arc::from(path.into().into_boxed_path()))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Final path component, lossily converted for display purposes.
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl AsRef<Path> for ImagePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Debug for ImagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for ImagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Precomputed thumbnail for one source photo.
#[derive(Clone)]
pub struct ThumbnailRecord {
    pub source_path: ImagePath,
    /// Shared, so responses can hand out the buffer without copying.
    pub image_bytes: Bytes,
    pub width: u32,
    pub height: u32,
    /// SHA-256 hex digest of `image_bytes`, served as the ETag.
    pub validation_token: String,
}

impl fmt::Debug for ThumbnailRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThumbnailRecord")
            .field("source_path", &self.source_path)
            .field("image_bytes", &self.image_bytes.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("validation_token", &self.validation_token)
            .finish()
    }
}

/// One position in the [`PhotoIndex`].
#[derive(Debug, Clone)]
pub enum PhotoSlot {
    Ready(ThumbnailRecord),
    /// Thumbnail generation failed under the relaxed policy. The slot keeps
    /// its position so photo numbers stay aligned with enumeration order.
    Tombstone { source_path: ImagePath, reason: String },
}

impl PhotoSlot {
    pub fn source_path(&self) -> &ImagePath {
        match self {
            Self::Ready(record) => &record.source_path,
            Self::Tombstone { source_path, .. } => source_path,
        }
    }

    pub fn thumbnail(&self) -> Option<&ThumbnailRecord> {
        match self {
            Self::Ready(record) => Some(record),
            Self::Tombstone { .. } => None,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, Self::Tombstone { .. })
    }
}

/// Ordered photo collection; slot `i` always belongs to enumerated path `i`.
#[derive(Debug, Clone, Default)]
pub struct PhotoIndex {
    slots: Vec<PhotoSlot>,
}

impl PhotoIndex {
    pub(crate) fn from_slots(slots: Vec<PhotoSlot>) -> Self {
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Look up a photo by its number. Out-of-range numbers yield `None`.
    pub fn get(&self, number: usize) -> Option<&PhotoSlot> {
        self.slots.get(number)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &PhotoSlot> {
        self.slots.iter()
    }

    pub fn tombstones(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_tombstone()).count()
    }

    pub fn previous(&self, number: usize) -> Option<usize> {
        (number > 0 && number < self.slots.len()).then(|| number - 1)
    }

    pub fn next(&self, number: usize) -> Option<usize> {
        (number + 1 < self.slots.len()).then_some(number + 1)
    }
}
