//! Runtime configuration.
//!
//! Settings come from command-line flags with environment fallbacks (a
//! `.env` file is read first by `main`). [`ConfigLoader`] validates them once
//! and produces an immutable [`Config`] that is handed to the application
//! state; nothing reads the environment after startup.

use std::{fmt, path::PathBuf};

use clap::Parser;
use galeria_core::{ConcurrencyBudget, FailurePolicy, ThumbnailSpec};
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::auth::Credentials;

/// Gallery server options.
#[derive(Parser, Debug, Clone)]
#[command(name = "galeria-server")]
pub struct ServeArgs {
    /// Directory scanned recursively for *.jpg photos
    #[arg(long, env = "PHOTO_DIRECTORY", default_value = "samples")]
    pub photo_directory: PathBuf,

    /// Address to bind
    #[arg(long, env = "HTTP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "HTTP_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Username for HTTP Basic authentication
    #[arg(long, env = "LOGIN", default_value = "guest")]
    pub login: String,

    /// Password for HTTP Basic authentication (random if unset)
    #[arg(long, env = "PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Maximum number of thumbnails generated at once (defaults to CPU count)
    #[arg(long, env = "GALERIA_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// What a corrupt photo does to startup: `strict` aborts, `relaxed` keeps a placeholder
    #[arg(long, env = "GALERIA_FAILURE_POLICY", default_value_t = FailurePolicy::Strict)]
    pub failure_policy: FailurePolicy,

    /// Thumbnail bounding box width
    #[arg(long, env = "GALERIA_THUMB_WIDTH", default_value_t = galeria_core::thumbnail::THUMB_WIDTH)]
    pub thumb_width: u32,

    /// Thumbnail bounding box height
    #[arg(long, env = "GALERIA_THUMB_HEIGHT", default_value_t = galeria_core::thumbnail::THUMB_HEIGHT)]
    pub thumb_height: u32,

    /// JPEG quality for thumbnails and rescaled photos (1-100)
    #[arg(long, env = "GALERIA_JPEG_QUALITY", default_value_t = galeria_core::thumbnail::DEFAULT_JPEG_QUALITY)]
    pub jpeg_quality: u8,

    /// Directory served without authentication under /static
    #[arg(long, env = "GALERIA_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Disable the terminal progress bar and log progress instead
    #[arg(long, env = "GALERIA_NO_PROGRESS", default_value_t = false)]
    pub no_progress: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct GalleryConfig {
    pub photo_directory: PathBuf,
    pub budget: ConcurrencyBudget,
    pub failure_policy: FailurePolicy,
    pub thumbnail: ThumbnailSpec,
    pub static_dir: Option<PathBuf>,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub login: String,
    pub password: Zeroizing<String>,
    pub password_generated: bool,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("password_generated", &self.password_generated)
            .finish()
    }
}

impl AuthConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.login.clone(), self.password.clone())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub gallery: GalleryConfig,
    pub auth: AuthConfig,
    pub show_progress: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: Vec<ConfigWarning>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigLoadError {
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("JPEG quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),
    #[error("thumbnail dimensions must be non-zero, got {width}x{height}")]
    InvalidThumbnailSize { width: u32, height: u32 },
    #[error("login must not be empty")]
    EmptyLogin,
    #[error("password must not be empty")]
    EmptyPassword,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self, args: ServeArgs) -> Result<ConfigLoad, ConfigLoadError> {
        let mut warnings = Vec::new();

        let budget = match args.concurrency {
            Some(limit) => {
                ConcurrencyBudget::new(limit).ok_or(ConfigLoadError::ZeroConcurrency)?
            }
            None => ConcurrencyBudget::available_parallelism(),
        };

        if !(1..=100).contains(&args.jpeg_quality) {
            return Err(ConfigLoadError::InvalidQuality(args.jpeg_quality));
        }
        if args.thumb_width == 0 || args.thumb_height == 0 {
            return Err(ConfigLoadError::InvalidThumbnailSize {
                width: args.thumb_width,
                height: args.thumb_height,
            });
        }

        let login = args.login.trim().to_string();
        if login.is_empty() {
            return Err(ConfigLoadError::EmptyLogin);
        }

        let (password, password_generated) = match args.password {
            Some(password) if password.is_empty() => {
                return Err(ConfigLoadError::EmptyPassword);
            }
            Some(password) => (Zeroizing::new(password), false),
            None => {
                warnings.push(ConfigWarning {
                    message: "PASSWORD not set; generated a random password".into(),
                    hint: Some("set PASSWORD to keep the same credentials across restarts".into()),
                });
                (random_password(), true)
            }
        };

        if let Some(dir) = &args.static_dir
            && !dir.is_dir()
        {
            warnings.push(ConfigWarning {
                message: format!("static directory {} does not exist", dir.display()),
                hint: Some("requests under /static will return 404".into()),
            });
        }

        let config = Config {
            server: ServerConfig {
                host: args.host,
                port: args.port,
            },
            gallery: GalleryConfig {
                photo_directory: args.photo_directory,
                budget,
                failure_policy: args.failure_policy,
                thumbnail: ThumbnailSpec {
                    width: args.thumb_width,
                    height: args.thumb_height,
                    quality: args.jpeg_quality,
                },
                static_dir: args.static_dir,
            },
            auth: AuthConfig {
                login,
                password,
                password_generated,
            },
            show_progress: !args.no_progress,
        };

        Ok(ConfigLoad { config, warnings })
    }
}

/// 16 random bytes, hex encoded.
fn random_password() -> Zeroizing<String> {
    let mut bytes = Zeroizing::new([0u8; 16]);
    rand::rng().fill_bytes(bytes.as_mut());
    Zeroizing::new(hex::encode(bytes.as_ref()))
}
