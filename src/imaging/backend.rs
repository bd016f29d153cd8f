//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the generator needs:
//! decode a source once, resize it per width, and encode each resized copy.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::EncodeParams;
use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for image processing backends.
///
/// Implementations must be `Sync`: the generator calls them from many pool
/// threads at once.
pub trait ImageBackend: Sync {
    /// Load and decode a source image.
    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError>;

    /// Resize to `width`, preserving aspect ratio.
    fn resize(&self, image: &DynamicImage, width: u32) -> DynamicImage;

    /// Encode and write one variant. A failed encode must not leave a file at
    /// `params.output`.
    fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<(), BackendError>;
}
