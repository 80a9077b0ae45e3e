use axum::{
    extract::{Path, State},
    response::Html,
};

use crate::{
    handlers::resolve_photo, infra::app_state::AppState,
    infra::errors::AppResult, views,
};

/// GET / - thumbnail grid of every photo.
pub async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(views::render_index(&state.gallery).into_string())
}

/// GET /view/{photo_number} - single photo page with previous/next links.
pub async fn view_handler(
    State(state): State<AppState>,
    Path(photo_number): Path<String>,
) -> AppResult<Html<String>> {
    let (number, slot) = resolve_photo(&state.gallery, &photo_number)?;
    Ok(Html(views::render_view(&state.gallery, number, slot).into_string()))
}
