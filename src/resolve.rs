//! The variant resolver: logical image reference in, responsive sources out.
//!
//! Pure and infallible. A reference of the form `/images/<stem>.<jpg|jpeg|png>`
//! (case-insensitive) expands into one `srcset` per encoding, next-gen first:
//!
//! ```text
//! /images/sunset.jpg
//!   image/webp  /images/optimized/sunset-320.webp 320w, ..., /images/optimized/sunset-2560.webp 2560w
//!   image/jpeg  /images/optimized/sunset-320.jpg 320w, ..., /images/optimized/sunset-2560.jpg 2560w
//!   fallback    /images/optimized/sunset-1024.jpg
//! ```
//!
//! Anything else (external URLs, other prefixes, unknown extensions) passes
//! through: no alternate sources, the reference itself as the fallback URL.
//!
//! File names come from [`contract::variant_filename`], the same function the
//! generator writes with.

use crate::config::ResolverConfig;
use crate::contract::{Encoding, RasterFamily, encodings_for, variant_filename};
use serde::Serialize;

/// Per-call overrides.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// CSS `sizes` value, copied verbatim into the result.
    pub sizes: Option<String>,
    /// Replaces the configured width list for this call.
    pub widths: Option<Vec<u32>>,
}

/// One `<source>` element worth of data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescriptor {
    pub mime_type: &'static str,
    pub src_set: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
}

/// Result of resolving one reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSources {
    /// Next-gen descriptor first, then raster. Empty for passthrough.
    pub alternate_sources: Vec<SourceDescriptor>,
    pub fallback_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_src_set: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_sizes: Option<String>,
}

impl ResolvedSources {
    pub fn is_passthrough(&self) -> bool {
        self.alternate_sources.is_empty()
    }
}

/// One variant file behind a resolved reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRef {
    /// File name under the output directory, e.g. `sunset-320.webp`.
    pub file_name: String,
    pub url: String,
}

/// A reference that matched the local-image pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalReference<'a> {
    pub stem: &'a str,
    pub family: RasterFamily,
}

/// Resolves references against one URL layout and width list.
#[derive(Debug, Clone)]
pub struct Resolver {
    widths: Vec<u32>,
    fallback_width: u32,
    source_prefix: String,
    optimized_prefix: String,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(&ResolverConfig::default())
    }
}

impl Resolver {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            widths: config.widths.clone(),
            fallback_width: config.fallback_width,
            source_prefix: config.source_prefix.trim_end_matches('/').to_string(),
            optimized_prefix: config.optimized_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Match `<source_prefix>/<stem>.<ext>`, case-insensitively.
    ///
    /// The stem is everything between the prefix and the last dot, and may
    /// contain slashes.
    pub fn parse_reference<'a>(&self, reference: &'a str) -> Option<LocalReference<'a>> {
        let prefix_len = self.source_prefix.len();
        let head = reference.get(..prefix_len)?;
        if !head.eq_ignore_ascii_case(&self.source_prefix) {
            return None;
        }
        let rest = reference.get(prefix_len..)?.strip_prefix('/')?;
        let (stem, ext) = rest.rsplit_once('.')?;
        if stem.is_empty() || stem.contains('\n') {
            return None;
        }
        let family = RasterFamily::from_extension(ext)?;
        Some(LocalReference { stem, family })
    }

    /// Public URL of one variant.
    pub fn variant_url(&self, stem: &str, width: u32, encoding: Encoding) -> String {
        format!(
            "{}/{}",
            self.optimized_prefix,
            variant_filename(stem, width, encoding)
        )
    }

    fn src_set(&self, stem: &str, widths: &[u32], encoding: Encoding) -> String {
        widths
            .iter()
            .map(|&w| format!("{} {w}w", self.variant_url(stem, w, encoding)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn fallback_width(&self, widths: &[u32]) -> u32 {
        widths
            .get(widths.len() / 2)
            .copied()
            .unwrap_or(self.fallback_width)
    }

    /// Every variant file a resolved reference points at: each srcset entry,
    /// next-gen first, then the fallback if it is not already listed. Empty for
    /// passthrough references.
    pub fn referenced_variants(&self, reference: &str, options: &ResolveOptions) -> Vec<VariantRef> {
        let Some(local) = self.parse_reference(reference) else {
            return Vec::new();
        };
        let widths = options.widths.as_deref().unwrap_or(&self.widths);
        let fallback = (
            self.fallback_width(widths),
            Encoding::Raster(local.family),
        );

        let mut variants: Vec<VariantRef> = Vec::new();
        let pairs = encodings_for(local.family)
            .into_iter()
            .flat_map(|encoding| widths.iter().map(move |&w| (w, encoding)))
            .chain(std::iter::once(fallback));
        for (width, encoding) in pairs {
            let file_name = variant_filename(local.stem, width, encoding);
            if variants.iter().any(|v| v.file_name == file_name) {
                continue;
            }
            variants.push(VariantRef {
                url: self.variant_url(local.stem, width, encoding),
                file_name,
            });
        }
        variants
    }

    pub fn resolve(&self, reference: &str, options: &ResolveOptions) -> ResolvedSources {
        let sizes = options.sizes.clone();
        let Some(local) = self.parse_reference(reference) else {
            return ResolvedSources {
                alternate_sources: Vec::new(),
                fallback_url: reference.to_string(),
                fallback_src_set: None,
                fallback_sizes: sizes,
            };
        };

        let widths = options.widths.as_deref().unwrap_or(&self.widths);
        let alternate_sources: Vec<SourceDescriptor> = encodings_for(local.family)
            .into_iter()
            .map(|encoding| SourceDescriptor {
                mime_type: encoding.mime_type(),
                src_set: self.src_set(local.stem, widths, encoding),
                sizes: sizes.clone(),
            })
            .collect();

        let fallback_width = self.fallback_width(widths);
        let raster = Encoding::Raster(local.family);

        ResolvedSources {
            fallback_url: self.variant_url(local.stem, fallback_width, raster),
            fallback_src_set: Some(self.src_set(local.stem, widths, raster)),
            fallback_sizes: sizes,
            alternate_sources,
        }
    }
}

/// Resolve with the default layout and widths.
pub fn resolve_image_sources(reference: &str, options: &ResolveOptions) -> ResolvedSources {
    Resolver::default().resolve(reference, options)
}

// ============================================================================
// Loading hints
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Loading {
    Eager,
    Lazy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchPriority {
    High,
    Low,
}

/// Browser loading hints for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingHints {
    pub loading: Loading,
    pub decoding_async: bool,
    pub fetch_priority: FetchPriority,
}

impl LoadingHints {
    /// HTML attribute pairs: `loading`, `decoding`, `fetchpriority`.
    pub fn attributes(&self) -> [(&'static str, &'static str); 3] {
        let loading = match self.loading {
            Loading::Eager => "eager",
            Loading::Lazy => "lazy",
        };
        let decoding = if self.decoding_async { "async" } else { "auto" };
        let priority = match self.fetch_priority {
            FetchPriority::High => "high",
            FetchPriority::Low => "low",
        };
        [
            ("loading", loading),
            ("decoding", decoding),
            ("fetchpriority", priority),
        ]
    }
}

/// Above-the-fold images load eagerly at high priority; everything else is lazy.
pub fn loading_hints(priority: bool) -> LoadingHints {
    if priority {
        LoadingHints {
            loading: Loading::Eager,
            decoding_async: true,
            fetch_priority: FetchPriority::High,
        }
    } else {
        LoadingHints {
            loading: Loading::Lazy,
            decoding_async: true,
            fetch_priority: FetchPriority::Low,
        }
    }
}
