#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;
use axum_test::TestServer;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use clap::Parser;
use galeria_core::NoopProgress;
use galeria_server::{
    AppState,
    infra::{
        config::{ConfigLoader, ServeArgs},
        startup,
    },
    routes,
};
use image::{Rgb, RgbImage};
use tempfile::TempDir;

pub const LOGIN: &str = "guest";
pub const PASSWORD: &str = "correct horse";

pub struct TestGallery {
    pub server: TestServer,
    pub state: AppState,
    pub photos: TempDir,
}

pub fn basic(login: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{login}:{password}")))
}

pub fn authorization() -> String {
    basic(LOGIN, PASSWORD)
}

pub fn write_jpeg(dir: &Path, relative: &str, width: u32, height: u32, seed: u8) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture dir");
    }
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            seed.wrapping_add((x % 251) as u8),
            seed.wrapping_mul(7).wrapping_add((y % 241) as u8),
            128,
        ])
    });
    let bytes = galeria_core::thumbnail::encode_jpeg(&image, 90).expect("encode fixture");
    std::fs::write(&path, bytes).expect("write fixture");
    path
}

/// Build a server over `photos` with the given extra flags.
pub async fn spawn_gallery(photos: TempDir, extra: &[&str]) -> Result<TestGallery> {
    let dir = photos.path().to_string_lossy().into_owned();
    let mut argv = vec![
        "galeria-server",
        "--photo-directory",
        dir.as_str(),
        "--login",
        LOGIN,
        "--password",
        PASSWORD,
        "--concurrency",
        "2",
        "--no-progress",
    ];
    argv.extend_from_slice(extra);

    let args = ServeArgs::try_parse_from(argv)?;
    let config = ConfigLoader::new().load(args)?.config;
    let state = startup::prepare(config, Arc::new(NoopProgress)).await?;
    state.status.mark_serving()?;

    let server = TestServer::builder()
        .build(routes::create_router(state.clone()))
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;

    Ok(TestGallery {
        server,
        state,
        photos,
    })
}

/// Three photos: a landscape, a portrait and a small one.
pub async fn standard_gallery() -> Result<TestGallery> {
    let photos = TempDir::new()?;
    write_jpeg(photos.path(), "a_landscape.jpg", 800, 600, 1);
    write_jpeg(photos.path(), "b_portrait.JPG", 400, 900, 2);
    write_jpeg(photos.path(), "nested/c_small.jpg", 120, 80, 3);
    spawn_gallery(photos, &[]).await
}
