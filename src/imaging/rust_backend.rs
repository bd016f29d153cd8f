//! Production image backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG) | `image::ImageReader`, format sniffed from content |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → WebP | `webp::Encoder` (lossy) |
//! | Encode → JPEG | `jpeg_encoder::Encoder` (progressive, optimized Huffman tables) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//!
//! Every encode goes to memory first, then to a temporary file in the output
//! directory which is renamed into place. A variant path therefore either holds
//! a complete encode or does not exist.

use super::backend::{BackendError, ImageBackend};
use super::calculations::width_constrained_dimensions;
use super::params::{EncodeFormat, EncodeParams, Quality};
use crate::config::PngCompression;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Write;
use std::path::Path;

/// Prefix of in-flight temporary files in the output directory.
pub const PARTIAL_PREFIX: &str = ".partial-";

/// Backend built on the `image` and `webp` crates.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, e: impl std::fmt::Display) -> BackendError {
    BackendError::Decode {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

fn encode_webp(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    // libwebp only takes 8-bit RGB or RGBA
    let pixels = if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };
    let encoder = webp::Encoder::from_image(&pixels)
        .map_err(|e| BackendError::ProcessingFailed(format!("WebP setup failed: {e}")))?;
    let encoded = encoder
        .encode_simple(false, quality.value() as f32)
        .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {e:?}")))?;
    Ok(encoded.to_vec())
}

fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let (width, height) = match (u16::try_from(rgb.width()), u16::try_from(rgb.height())) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(BackendError::ProcessingFailed(format!(
                "{}x{} exceeds the JPEG size limit",
                rgb.width(),
                rgb.height()
            )));
        }
    };
    let mut buf = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut buf, quality.value() as u8);
    encoder.set_progressive(true);
    encoder.set_optimized_huffman_tables(true);
    encoder
        .encode(rgb.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;
    Ok(buf)
}

fn encode_png(img: &DynamicImage, compression: PngCompression) -> Result<Vec<u8>, BackendError> {
    let compression = match compression {
        PngCompression::Fast => CompressionType::Fast,
        PngCompression::Default => CompressionType::Default,
        PngCompression::Best => CompressionType::Best,
    };
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buf, compression, PngFilter::Adaptive);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {e}")))?;
    Ok(buf)
}

/// Write `bytes` to `path` through a temporary sibling file and a rename.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), BackendError> {
    let dir = path.parent().ok_or_else(|| {
        BackendError::ProcessingFailed(format!("{} has no parent directory", path.display()))
    })?;
    let mut tmp = tempfile::Builder::new()
        .prefix(PARTIAL_PREFIX)
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| BackendError::Io(e.error))?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        // Sniff the real format so a PNG saved as .jpg still decodes
        ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| decode_error(path, e))
    }

    fn resize(&self, image: &DynamicImage, width: u32) -> DynamicImage {
        let (w, h) = width_constrained_dimensions((image.width(), image.height()), width);
        image.resize_exact(w, h, FilterType::Lanczos3)
    }

    fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<(), BackendError> {
        let bytes = match params.format {
            EncodeFormat::WebP { quality } => encode_webp(image, quality)?,
            EncodeFormat::Jpeg { quality } => encode_jpeg(image, quality)?,
            EncodeFormat::Png { compression } => encode_png(image, compression)?,
        };
        write_atomically(&params.output, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{write_test_jpeg, write_test_png};
    use image::{GenericImageView, ImageFormat};
    use tempfile::TempDir;

    fn encode_to(backend: &RustBackend, img: &DynamicImage, path: &Path, format: EncodeFormat) {
        backend
            .encode(
                img,
                &EncodeParams {
                    output: path.to_path_buf(),
                    format,
                },
            )
            .unwrap();
    }

    #[test]
    fn decode_synthetic_jpeg() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sunset.jpg");
        write_test_jpeg(&path, 200, 150);

        let img = RustBackend::new().decode(&path).unwrap();
        assert_eq!(img.dimensions(), (200, 150));
    }

    #[test]
    fn decode_sniffs_mislabeled_png() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("actually-png.jpg");
        write_test_png(&path, 40, 30);

        let img = RustBackend::new().decode(&path).unwrap();
        assert_eq!(img.dimensions(), (40, 30));
    }

    #[test]
    fn decode_corrupt_file_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        let result = RustBackend::new().decode(&path);
        assert!(matches!(result, Err(BackendError::Decode { .. })));
    }

    #[test]
    fn decode_nonexistent_file_errors() {
        let result = RustBackend::new().decode(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn resize_is_width_constrained() {
        let backend = RustBackend::new();
        let img = DynamicImage::new_rgb8(400, 300);
        assert_eq!(backend.resize(&img, 96).dimensions(), (96, 72));
        assert_eq!(backend.resize(&img, 800).dimensions(), (800, 600));
    }

    #[test]
    fn encode_webp_writes_decodable_file() {
        let tmp = TempDir::new().unwrap();
        let backend = RustBackend::new();
        let output = tmp.path().join("sunset-96.webp");
        let img = backend.resize(&DynamicImage::new_rgb8(200, 100), 96);

        encode_to(
            &backend,
            &img,
            &output,
            EncodeFormat::WebP {
                quality: Quality::new(78),
            },
        );

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::WebP);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (96, 48));
    }

    #[test]
    fn encode_webp_keeps_alpha_sources() {
        let tmp = TempDir::new().unwrap();
        let backend = RustBackend::new();
        let output = tmp.path().join("logo-96.webp");

        encode_to(
            &backend,
            &DynamicImage::new_rgba8(96, 96),
            &output,
            EncodeFormat::WebP {
                quality: Quality::new(78),
            },
        );
        assert!(std::fs::metadata(&output).unwrap().len() > 0);
    }

    #[test]
    fn encode_jpeg_from_rgba_source() {
        let tmp = TempDir::new().unwrap();
        let backend = RustBackend::new();
        let output = tmp.path().join("photo-128.jpg");

        encode_to(
            &backend,
            &DynamicImage::new_rgba8(128, 64),
            &output,
            EncodeFormat::Jpeg {
                quality: Quality::new(80),
            },
        );

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    /// SOF2 (`FF C2`) marks a progressive frame.
    fn has_marker(bytes: &[u8], marker: u8) -> bool {
        bytes.windows(2).any(|w| w == [0xFF, marker])
    }

    #[test]
    fn encode_jpeg_is_progressive() {
        let tmp = TempDir::new().unwrap();
        let backend = RustBackend::new();
        let output = tmp.path().join("sunset-32.jpg");
        let source = tmp.path().join("sunset.jpg");
        write_test_jpeg(&source, 64, 48);
        let img = backend.resize(&backend.decode(&source).unwrap(), 32);

        encode_to(
            &backend,
            &img,
            &output,
            EncodeFormat::Jpeg {
                quality: Quality::new(80),
            },
        );

        let bytes = std::fs::read(&output).unwrap();
        assert!(has_marker(&bytes, 0xC2), "no SOF2 frame");
        assert_eq!(
            image::load_from_memory(&bytes).unwrap().dimensions(),
            (32, 24)
        );
    }

    #[test]
    fn encode_png_stays_png() {
        let tmp = TempDir::new().unwrap();
        let backend = RustBackend::new();
        let output = tmp.path().join("logo-96.png");

        encode_to(
            &backend,
            &DynamicImage::new_rgba8(96, 40),
            &output,
            EncodeFormat::Png {
                compression: PngCompression::Best,
            },
        );

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (96, 40));
    }

    #[test]
    fn encode_leaves_no_partial_files() {
        let tmp = TempDir::new().unwrap();
        let backend = RustBackend::new();
        encode_to(
            &backend,
            &DynamicImage::new_rgb8(32, 32),
            &tmp.path().join("a-32.jpg"),
            EncodeFormat::Jpeg {
                quality: Quality::new(80),
            },
        );

        let names: Vec<String> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a-32.jpg"]);
    }

    #[test]
    fn encode_into_missing_directory_errors() {
        let tmp = TempDir::new().unwrap();
        let backend = RustBackend::new();
        let result = backend.encode(
            &DynamicImage::new_rgb8(8, 8),
            &EncodeParams {
                output: tmp.path().join("missing/a-8.jpg"),
                format: EncodeFormat::Jpeg {
                    quality: Quality::new(80),
                },
            },
        );
        assert!(matches!(result, Err(BackendError::Io(_))));
    }
}
