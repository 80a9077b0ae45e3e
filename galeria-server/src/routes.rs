use axum::{Router, middleware, routing::get};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    auth::require_basic_auth,
    handlers::{gallery, images},
    infra::app_state::AppState,
};

/// Build the full application router.
///
/// Every gallery route sits behind Basic auth; `/static` (when configured)
/// is served without it.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/", get(gallery::index_handler))
        .route("/view/{photo_number}", get(gallery::view_handler))
        .route("/thumbs/{photo_number}", get(images::thumbnail_handler))
        .route("/photos/{photo_number}", get(images::photo_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ));

    let mut router = Router::new().merge(protected);
    if let Some(dir) = state.config.gallery.static_dir.as_ref() {
        router = router.nest_service("/static", ServeDir::new(dir));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
