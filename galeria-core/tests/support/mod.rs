#![allow(dead_code)]

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};

/// Write a gradient JPEG so every fixture encodes to different bytes.
pub fn write_jpeg(dir: &Path, relative: &str, width: u32, height: u32, seed: u8) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture dir");
    }

    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            seed.wrapping_add((x % 251) as u8),
            seed.wrapping_mul(3).wrapping_add((y % 241) as u8),
            seed ^ (((x + y) % 255) as u8),
        ])
    });
    let bytes =
        galeria_core::thumbnail::encode_jpeg(&image, 90).expect("encode fixture jpeg");
    std::fs::write(&path, bytes).expect("write fixture jpeg");
    path
}

pub fn write_corrupt(dir: &Path, relative: &str) -> PathBuf {
    let path = dir.join(relative);
    std::fs::write(&path, b"\xFF\xD8\xFF\xE0 truncated garbage").expect("write corrupt fixture");
    path
}
