use std::sync::Arc;

use anyhow::{Context, Result};
use galeria_core::{IndexBuilder, PipelineStatus, ProgressSink};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{infra::app_state::AppState, infra::config::Config, routes};

/// Run the thumbnail pipeline and assemble the application state.
///
/// Nothing is served until this returns; a failed build is returned as-is
/// and the caller exits without binding.
pub async fn prepare(
    config: Config,
    progress: Arc<dyn ProgressSink>,
) -> Result<AppState> {
    let gallery = &config.gallery;
    info!(
        directory = %gallery.photo_directory.display(),
        concurrency = gallery.budget.get(),
        policy = %gallery.failure_policy,
        "Generating thumbnails"
    );

    let status = PipelineStatus::new();
    let builder = IndexBuilder::new(gallery.budget)
        .with_spec(gallery.thumbnail)
        .with_policy(gallery.failure_policy)
        .with_progress(progress)
        .with_status(status.clone());

    let index = builder.build_index(&gallery.photo_directory).await.with_context(|| {
        format!(
            "failed to build thumbnails for {}",
            gallery.photo_directory.display()
        )
    })?;

    if index.tombstones() > 0 {
        warn!(
            failed = index.tombstones(),
            total = index.len(),
            "Some photos could not be thumbnailed and will show a placeholder"
        );
    }
    info!(
        photos = index.len(),
        peak_concurrency = builder.limiter().peak(),
        "Thumbnails ready"
    );

    Ok(AppState::new(index, config, status))
}

/// Serve the gallery on `listener` until Ctrl-C.
pub async fn serve(state: AppState, listener: TcpListener) -> Result<()> {
    state.status.mark_serving()?;
    let app = routes::create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated unexpectedly")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
