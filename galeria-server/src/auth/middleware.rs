use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::basic::{REALM, parse_basic_authorization};
use crate::infra::app_state::AppState;

/// Reject requests that do not carry the configured Basic credentials.
pub async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_basic_authorization)
        .is_some_and(|presented| state.credentials.verify(&presented));

    if !authorized {
        debug!(path = %request.uri().path(), "rejecting unauthenticated request");
        return unauthorized();
    }

    next.run(request).await
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [
            (header::WWW_AUTHENTICATE, format!("Basic realm=\"{REALM}\"")),
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
        ],
        "Authentication required",
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, http::Request as HttpRequest, routing::get};
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use clap::Parser;
    use galeria_core::{PhotoIndex, PipelineStatus};
    use tower::ServiceExt;

    use super::*;
    use crate::infra::config::{ConfigLoader, ServeArgs};

    fn app() -> Router {
        let args = ServeArgs::try_parse_from([
            "galeria-server",
            "--login",
            "guest",
            "--password",
            "pw",
        ])
        .unwrap();
        let config = ConfigLoader::new().load(args).unwrap().config;
        let state = AppState::new(PhotoIndex::default(), config, PipelineStatus::new());

        Router::new()
            .route("/", get(|| async { "ok" }))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                require_basic_auth,
            ))
            .with_state(state)
    }

    #[tokio::test]
    async fn missing_header_gets_a_challenge() {
        let response = app()
            .oneshot(HttpRequest::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"Galeria\""
        );
    }

    #[tokio::test]
    async fn valid_header_reaches_the_handler() {
        let response = app()
            .oneshot(
                HttpRequest::builder()
                    .uri("/")
                    .header(
                        header::AUTHORIZATION,
                        format!("Basic {}", STANDARD.encode("guest:pw")),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
