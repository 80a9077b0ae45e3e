pub mod gallery;
pub mod images;

use galeria_core::{PhotoIndex, PhotoSlot};

use crate::infra::errors::{AppError, AppResult};

/// Resolve a `{photo_number}` path segment against the index.
///
/// Anything that is not a plain decimal position inside the index is a 404,
/// so probing for numbers reveals nothing beyond the gallery size.
pub fn resolve_photo<'a>(
    index: &'a PhotoIndex,
    raw: &str,
) -> AppResult<(usize, &'a PhotoSlot)> {
    let number = parse_photo_number(raw)
        .ok_or_else(|| AppError::not_found("No such photo"))?;
    let slot = index
        .get(number)
        .ok_or_else(|| AppError::not_found("No such photo"))?;
    Ok((number, slot))
}

pub fn parse_photo_number(raw: &str) -> Option<usize> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
