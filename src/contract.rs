//! The naming contract shared by the variant generator and the resolver.
//!
//! The generator writes files and the resolver computes URLs, and the two never
//! talk to each other at runtime. The only thing linking them is the rule in
//! this module:
//!
//! ```text
//! public/images/<stem>.<jpg|jpeg|png>                  source
//! public/images/optimized/<stem>-<width>.webp          next-gen variant
//! public/images/optimized/<stem>-<width>.<jpg|png>     raster variant
//! ```
//!
//! `jpeg` sources are normalized to the `jpg` family, so `photo.jpeg` produces
//! `photo-320.jpg`. PNG sources stay PNG.
//!
//! Both halves format names through [`variant_filename`]. If one of them built
//! the string by hand the two rules could drift apart, and the only symptom
//! would be 404s in the browser.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Source extensions the pipeline accepts (compared case-insensitively).
pub const SOURCE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Every width the generator produces, ascending.
pub const GENERATOR_WIDTHS: &[u32] = &[
    96, 128, 160, 256, 320, 384, 480, 512, 640, 768, 960, 1024, 1280, 1600, 1920, 2560,
];

/// Default widths the resolver advertises in a srcset, ascending.
///
/// Must stay a subset of [`GENERATOR_WIDTHS`]; `config` validation enforces
/// this for user-supplied lists.
pub const RESOLVER_WIDTHS: &[u32] = &[320, 480, 640, 768, 960, 1024, 1280, 1600, 1920, 2560];

/// Fallback `src` width used when the resolver is handed an empty width list.
pub const FALLBACK_WIDTH: u32 = 1280;

/// URL prefix of logical image references (`/images/<stem>.<ext>`).
pub const SOURCE_URL_PREFIX: &str = "/images";

/// URL prefix under which generated variants are served.
pub const OPTIMIZED_URL_PREFIX: &str = "/images/optimized";

/// Raster family of a source image and of its raster variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFamily {
    Jpg,
    Png,
}

impl RasterFamily {
    /// Map a source extension to its family. `jpg` and `jpeg` both become
    /// [`RasterFamily::Jpg`]. Case-insensitive.
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") {
            Some(Self::Jpg)
        } else if ext.eq_ignore_ascii_case("png") {
            Some(Self::Png)
        } else {
            None
        }
    }

    /// Normalized output extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Png => "png",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Output encoding of a single variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    WebP,
    Raster(RasterFamily),
}

impl Encoding {
    pub fn extension(self) -> &'static str {
        match self {
            Self::WebP => "webp",
            Self::Raster(family) => family.extension(),
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::WebP => "image/webp",
            Self::Raster(family) => family.mime_type(),
        }
    }

    /// Parse a generated file extension. Only the exact lowercase extensions
    /// the generator writes are recognized.
    pub fn from_output_extension(ext: &str) -> Option<Self> {
        match ext {
            "webp" => Some(Self::WebP),
            "jpg" => Some(Self::Raster(RasterFamily::Jpg)),
            "png" => Some(Self::Raster(RasterFamily::Png)),
            _ => None,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// The two encodings produced for a source, in selection-priority order:
/// next-gen first, then the raster family.
pub fn encodings_for(family: RasterFamily) -> [Encoding; 2] {
    [Encoding::WebP, Encoding::Raster(family)]
}

/// Format the generated file name for one variant: `{stem}-{width}.{ext}`.
pub fn variant_filename(stem: &str, width: u32, encoding: Encoding) -> String {
    format!("{}-{}.{}", stem, width, encoding.extension())
}

/// A source image file name split into its stem and raster family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceName {
    pub stem: String,
    pub family: RasterFamily,
}

/// Parse a source file name.
///
/// Returns `None` for anything that is not a recognized raster extension,
/// including extension-less names and dotfiles such as `.jpg`.
///
/// - `"sunset.jpg"` → stem `sunset`, family `Jpg`
/// - `"photo.JPEG"` → stem `photo`, family `Jpg`
/// - `"logo.png"` → stem `logo`, family `Png`
/// - `"notes.txt"`, `"optimized"` → `None`
pub fn parse_source_filename(name: &str) -> Option<SourceName> {
    let path = Path::new(name);
    let family = RasterFamily::from_extension(path.extension()?.to_str()?)?;
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() {
        return None;
    }
    Some(SourceName {
        stem: stem.to_string(),
        family,
    })
}

/// A generated file name split back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantName {
    pub stem: String,
    pub width: u32,
    pub encoding: Encoding,
}

/// Parse a generated file name of the form `{stem}-{width}.{ext}`.
///
/// The width must be a member of `widths` and the extension one the generator
/// writes. Stems may themselves contain dashes: the width is always the part
/// after the last one.
///
/// - `"sunset-320.webp"` → `sunset`, 320, WebP
/// - `"my-trip-1024.jpg"` → `my-trip`, 1024, Jpg
/// - `"sunset-321.webp"` (width not configured) → `None`
/// - `"sunset.webp"`, `"-320.png"`, `"sunset-320.gif"` → `None`
pub fn parse_variant_filename(name: &str, widths: &[u32]) -> Option<VariantName> {
    let (base, ext) = name.rsplit_once('.')?;
    let encoding = Encoding::from_output_extension(ext)?;
    let (stem, width) = base.rsplit_once('-')?;
    if stem.is_empty() || width.is_empty() || !width.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let width: u32 = width.parse().ok()?;
    if !widths.contains(&width) {
        return None;
    }
    Some(VariantName {
        stem: stem.to_string(),
        width,
        encoding,
    })
}
