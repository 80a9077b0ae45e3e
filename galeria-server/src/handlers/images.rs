use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use galeria_core::thumbnail::{self, EncodedImage};
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::{
    handlers::resolve_photo,
    infra::{
        app_state::AppState,
        errors::{AppError, AppResult},
    },
};

const JPEG: &str = "image/jpeg";
const THUMB_CACHE_CONTROL: &str = "private, no-cache";

/// Widest rescale accepted on `/photos/{n}?width=`.
pub const MAX_RESCALE_WIDTH: u32 = 7680;

/// GET /thumbs/{photo_number} - precomputed thumbnail with ETag revalidation.
pub async fn thumbnail_handler(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(photo_number): Path<String>,
) -> AppResult<Response> {
    let (_, slot) = resolve_photo(&state.gallery, &photo_number)?;
    let record = slot
        .thumbnail()
        .ok_or_else(|| AppError::not_found("Thumbnail unavailable"))?;

    let etag = format!("\"{}\"", record.validation_token);

    if let Some(if_none_match) = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        && etag_matches(if_none_match, &etag)
    {
        return Ok((
            StatusCode::NOT_MODIFIED,
            [
                (header::ETAG, etag),
                (header::CACHE_CONTROL, THUMB_CACHE_CONTROL.to_string()),
            ],
        )
            .into_response());
    }

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, JPEG.to_string()),
            (header::ETAG, etag),
            (header::CACHE_CONTROL, THUMB_CACHE_CONTROL.to_string()),
        ],
        record.image_bytes.clone(),
    )
        .into_response())
}

fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match.split(',').map(str::trim).any(|candidate| {
        candidate == "*"
            || candidate == etag
            || candidate.strip_prefix("W/") == Some(etag)
    })
}

#[derive(Debug, Deserialize)]
pub struct PhotoQuery {
    width: Option<String>,
}

/// GET /photos/{photo_number}[?width=N] - the original file, or a
/// letterboxed rescale at the view aspect ratio.
pub async fn photo_handler(
    State(state): State<AppState>,
    Path(photo_number): Path<String>,
    Query(query): Query<PhotoQuery>,
) -> AppResult<Response> {
    let (number, slot) = resolve_photo(&state.gallery, &photo_number)?;
    let path = slot.source_path().clone();

    let Some(width) = parse_width(query.width.as_deref())? else {
        return stream_original(path.as_path()).await;
    };

    let height = thumbnail::view_height_for(width);
    let quality = state.config.gallery.thumbnail.quality;
    debug!(photo = number, width, height, "rescaling photo");

    // The rescale runs as its own task; a client that disconnects does not
    // stop it, but it still holds a limiter slot only until it finishes.
    let rendered: EncodedImage = state
        .rescale_limiter
        .schedule(async move {
            tokio::task::spawn_blocking(move || {
                thumbnail::render_contained(path.as_path(), width, height, quality)
            })
            .await
        })
        .join()
        .await?
        .map_err(|err| AppError::internal(format!("Rescale task failed: {err}")))??;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, JPEG)],
        rendered.bytes,
    )
        .into_response())
}

/// `None` and an empty value both mean "serve the original".
fn parse_width(raw: Option<&str>) -> AppResult<Option<u32>> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<u32>() {
        Ok(width) if (1..=MAX_RESCALE_WIDTH).contains(&width) => Ok(Some(width)),
        _ => Err(AppError::bad_request(format!(
            "width must be an integer between 1 and {MAX_RESCALE_WIDTH}"
        ))),
    }
}

async fn stream_original(path: &std::path::Path) -> AppResult<Response> {
    let file = tokio::fs::File::open(path).await?;
    let len = file.metadata().await?.len();
    let stream = ReaderStream::new(file);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, JPEG.to_string()),
            (header::CONTENT_LENGTH, len.to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
