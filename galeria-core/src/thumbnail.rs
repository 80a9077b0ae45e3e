use std::{io::Cursor, path::Path};

use image::{
    DynamicImage, ExtendedColorType, ImageDecoder, ImageFormat, ImageReader,
    Rgb, RgbImage, codecs::jpeg::JpegEncoder, imageops::FilterType,
    metadata::Orientation,
};
use tracing::debug;

use crate::{GalleryError, Result};

pub const THUMB_WIDTH: u32 = 300;
pub const THUMB_HEIGHT: u32 = 200;
pub const VIEW_WIDTH: u32 = 1920;
pub const VIEW_HEIGHT: u32 = 1280;
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

const LETTERBOX: Rgb<u8> = Rgb([0, 0, 0]);

/// Bounding box and encoder settings for generated thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSpec {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

impl Default for ThumbnailSpec {
    fn default() -> Self {
        Self {
            width: THUMB_WIDTH,
            height: THUMB_HEIGHT,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// JPEG bytes together with the pixel dimensions they encode.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Height matching `width` at the gallery's 1920x1280 view aspect ratio.
pub fn view_height_for(width: u32) -> u32 {
    ((width as f64) * (VIEW_HEIGHT as f64) / (VIEW_WIDTH as f64)).round() as u32
}

/// Produce the thumbnail for a single source photo.
pub fn generate_thumbnail(path: &Path, spec: &ThumbnailSpec) -> Result<EncodedImage> {
    render_contained(path, spec.width, spec.height, spec.quality)
}

/// Decode `path`, apply its orientation, contain-fit it into
/// `width`x`height` and encode the result as JPEG.
pub fn render_contained(
    path: &Path,
    width: u32,
    height: u32,
    quality: u8,
) -> Result<EncodedImage> {
    if width == 0 || height == 0 {
        return Err(GalleryError::Internal(
            "Target dimensions must be non-zero".into(),
        ));
    }

    let source = decode_oriented(path)?;
    debug!(
        "Rendering {} ({}x{}) into {}x{}",
        path.display(),
        source.width(),
        source.height(),
        width,
        height
    );

    let canvas = fit_contain(&source, width, height);
    let bytes = encode_jpeg(&canvas, quality)?;

    Ok(EncodedImage {
        bytes,
        width,
        height,
    })
}

/// Decode a JPEG and rotate/flip its pixels to match the stored EXIF
/// orientation.
pub fn decode_oriented(path: &Path) -> Result<DynamicImage> {
    let mut reader = ImageReader::open(path).map_err(|source| GalleryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    reader.set_format(ImageFormat::Jpeg);

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| GalleryError::from_image(path.to_path_buf(), e))?;

    let orientation = match decoder.orientation() {
        Ok(orientation) => orientation,
        Err(err) => {
            debug!(
                "Ignoring unreadable orientation metadata in {}: {}",
                path.display(),
                err
            );
            Orientation::NoTransforms
        }
    };

    let mut image = DynamicImage::from_decoder(decoder)
        .map_err(|e| GalleryError::from_image(path.to_path_buf(), e))?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Resize `source` to fit inside `width`x`height` preserving its aspect
/// ratio, centered on a black canvas of exactly that size.
pub fn fit_contain(source: &DynamicImage, width: u32, height: u32) -> RgbImage {
    let resized = source.resize(width, height, FilterType::Lanczos3).to_rgb8();

    let mut canvas = RgbImage::from_pixel(width, height, LETTERBOX);
    let x = width.saturating_sub(resized.width()) / 2;
    let y = height.saturating_sub(resized.height()) / 2;
    image::imageops::overlay(&mut canvas, &resized, x as i64, y as i64);
    canvas
}

pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);

    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| GalleryError::Encode(e.to_string()))?;

    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    fn write_jpeg(dir: &Path, name: &str, image: &RgbImage) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, encode_jpeg(image, 90).unwrap()).unwrap();
        path
    }

    /// Splice an EXIF APP1 segment carrying `orientation` right after SOI.
    fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"II*\0");
        tiff.extend_from_slice(&8u32.to_le_bytes());
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&0x0112u16.to_le_bytes());
        tiff.extend_from_slice(&3u16.to_le_bytes());
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&(orientation as u32).to_le_bytes());
        tiff.extend_from_slice(&0u32.to_le_bytes());

        let payload_len = 2 + 6 + tiff.len();
        let mut out = Vec::with_capacity(jpeg.len() + payload_len + 2);
        out.extend_from_slice(&jpeg[..2]);
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&(payload_len as u16).to_be_bytes());
        out.extend_from_slice(b"Exif\0\0");
        out.extend_from_slice(&tiff);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn contain_fit_letterboxes_wider_aspect() {
        // 4:3 into 3:2 leaves bars on the left and right.
        let canvas = fit_contain(&solid(800, 600, [250, 250, 250]), 300, 200);
        assert_eq!(canvas.dimensions(), (300, 200));
        assert_eq!(canvas.get_pixel(0, 100), &LETTERBOX);
        assert_eq!(canvas.get_pixel(299, 100), &LETTERBOX);
        assert!(canvas.get_pixel(150, 100).0[0] > 200);
    }

    #[test]
    fn contain_fit_letterboxes_taller_aspect() {
        let canvas = fit_contain(&solid(200, 800, [250, 250, 250]), 300, 200);
        assert_eq!(canvas.dimensions(), (300, 200));
        assert_eq!(canvas.get_pixel(10, 100), &LETTERBOX);
        assert!(canvas.get_pixel(150, 0).0[0] > 200);
        assert!(canvas.get_pixel(150, 199).0[0] > 200);
    }

    #[test]
    fn contain_fit_upscales_small_images() {
        let canvas = fit_contain(&solid(30, 20, [250, 250, 250]), 300, 200);
        assert_eq!(canvas.dimensions(), (300, 200));
        assert!(canvas.get_pixel(0, 0).0[0] > 200);
        assert!(canvas.get_pixel(299, 199).0[0] > 200);
    }

    #[test]
    fn view_height_follows_view_aspect_ratio() {
        assert_eq!(view_height_for(1920), 1280);
        assert_eq!(view_height_for(640), 427);
        assert_eq!(view_height_for(300), 200);
    }

    #[test]
    fn generated_thumbnail_is_decodable_jpeg_of_box_size() {
        let tmp = TempDir::new().unwrap();
        let path = write_jpeg(
            tmp.path(),
            "wide.jpg",
            &RgbImage::from_pixel(640, 360, Rgb([10, 120, 200])),
        );

        let thumb = generate_thumbnail(&path, &ThumbnailSpec::default()).unwrap();
        assert!(thumb.bytes.starts_with(&[0xFF, 0xD8, 0xFF]));
        assert_eq!((thumb.width, thumb.height), (300, 200));

        let decoded = image::load_from_memory(&thumb.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (300, 200));
    }

    #[test]
    fn exif_orientation_rotates_pixels() {
        let tmp = TempDir::new().unwrap();
        let plain = encode_jpeg(&RgbImage::from_pixel(80, 40, Rgb([90, 90, 90])), 90)
            .unwrap();
        let path = tmp.path().join("rotated.jpg");
        fs::write(&path, with_exif_orientation(&plain, 6)).unwrap();

        let image = decode_oriented(&path).unwrap();
        assert_eq!((image.width(), image.height()), (40, 80));
    }

    #[test]
    fn non_jpeg_content_is_decode_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        fs::write(&path, b"definitely not a jpeg").unwrap();

        let err = generate_thumbnail(&path, &ThumbnailSpec::default()).unwrap_err();
        assert!(matches!(err, GalleryError::Decode { .. }), "got {err:?}");
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = generate_thumbnail(&tmp.path().join("gone.jpg"), &ThumbnailSpec::default())
            .unwrap_err();
        assert!(matches!(err, GalleryError::Io { .. }), "got {err:?}");
    }
}
