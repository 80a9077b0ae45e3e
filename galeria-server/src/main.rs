use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use galeria_core::{ProgressSink, TracingProgress};
use galeria_server::{
    infra::{
        config::{ConfigLoader, ServeArgs},
        startup,
    },
    progress::TerminalProgress,
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "info,tower_http=warn";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal.
    dotenvy::dotenv().ok();

    let args = ServeArgs::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let load = ConfigLoader::new()
        .load(args)
        .context("invalid configuration")?;
    for warning in &load.warnings {
        match &warning.hint {
            Some(hint) => warn!("{} ({})", warning.message, hint),
            None => warn!("{}", warning.message),
        }
    }

    let config = load.config;
    if config.auth.password_generated {
        info!(
            login = %config.auth.login,
            password = %config.auth.password.as_str(),
            "Generated gallery credentials"
        );
    }

    let progress: Arc<dyn ProgressSink> = if config.show_progress {
        Arc::new(TerminalProgress::new())
    } else {
        Arc::new(TracingProgress::default())
    };

    let addr = (config.server.host.clone(), config.server.port);
    let state = startup::prepare(config, progress).await?;

    let listener = TcpListener::bind((addr.0.as_str(), addr.1))
        .await
        .with_context(|| format!("failed to bind {}:{}", addr.0, addr.1))?;
    info!(
        address = %listener.local_addr()?,
        photos = state.gallery.len(),
        "Thumbnails loaded - server is listening"
    );

    startup::serve(state, listener).await
}
