//! Parameter types for image operations.
//!
//! These structs describe *what* to encode, not *how*. They are the interface
//! between the generator (which decides which variants a source needs) and the
//! [`backend`](super::backend) (which does the pixel work), so tests can swap in
//! a recording mock without touching the generator.

use crate::config::{GeneratorConfig, PngCompression};
use crate::contract::{Encoding, RasterFamily};
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

/// Output codec and its settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeFormat {
    WebP { quality: Quality },
    Jpeg { quality: Quality },
    Png { compression: PngCompression },
}

/// A single encode: write an already-resized image to `output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeParams {
    pub output: PathBuf,
    pub format: EncodeFormat,
}

/// Codec settings for every encoding the generator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    pub webp_quality: Quality,
    pub jpeg_quality: Quality,
    pub png_compression: PngCompression,
}

impl EncodeSettings {
    pub fn from_generator_config(config: &GeneratorConfig) -> Self {
        Self {
            webp_quality: Quality::new(config.webp_quality),
            jpeg_quality: Quality::new(config.jpeg_quality),
            png_compression: config.png_compression,
        }
    }

    /// Codec settings for one output encoding.
    pub fn format_for(&self, encoding: Encoding) -> EncodeFormat {
        match encoding {
            Encoding::WebP => EncodeFormat::WebP {
                quality: self.webp_quality,
            },
            Encoding::Raster(RasterFamily::Jpg) => EncodeFormat::Jpeg {
                quality: self.jpeg_quality,
            },
            Encoding::Raster(RasterFamily::Png) => EncodeFormat::Png {
                compression: self.png_compression,
            },
        }
    }
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self::from_generator_config(&GeneratorConfig::default())
    }
}
