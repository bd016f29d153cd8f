//! Image processing: decode, resize and encode. Pure Rust except for libwebp.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** (JPEG, PNG) | `image::ImageReader` with content sniffing |
//! | **Resize** | Lanczos3, width-constrained, aspect preserved |
//! | **Encode → WebP** | `webp` crate (lossy, libwebp) |
//! | **Encode → JPEG** | `jpeg-encoder` (progressive, optimized Huffman tables) |
//! | **Encode → PNG** | `image::codecs::png` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing encode operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::width_constrained_dimensions;
pub use params::{EncodeFormat, EncodeParams, EncodeSettings, Quality};
pub use rust_backend::RustBackend;
