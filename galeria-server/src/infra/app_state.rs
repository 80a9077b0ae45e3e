use std::{fmt, sync::Arc};

use galeria_core::{ConcurrencyLimiter, PhotoIndex, PipelineStatus};

use crate::auth::Credentials;
use crate::infra::config::Config;

/// Shared, read-only state handed to every request handler.
///
/// The index is frozen before the listener binds; handlers only read it.
#[derive(Clone)]
pub struct AppState {
    pub gallery: Arc<PhotoIndex>,
    pub config: Arc<Config>,
    pub credentials: Arc<Credentials>,
    /// Bounds request-time rescales with the same budget as the pipeline.
    pub rescale_limiter: ConcurrencyLimiter,
    pub status: PipelineStatus,
}

impl AppState {
    pub fn new(gallery: PhotoIndex, config: Config, status: PipelineStatus) -> Self {
        let credentials = Arc::new(config.auth.credentials());
        let rescale_limiter = ConcurrencyLimiter::new(config.gallery.budget);
        Self {
            gallery: Arc::new(gallery),
            config: Arc::new(config),
            credentials,
            rescale_limiter,
            status,
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("photos", &self.gallery.len())
            .field("status", &self.status.current())
            .finish_non_exhaustive()
    }
}
