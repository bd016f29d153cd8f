//! # Folio Assets
//!
//! Responsive image variants for a static portfolio site. An offline batch job
//! turns every source image into a fixed set of resized, re-encoded variants,
//! and a pure resolver turns a logical image reference into the `srcset`
//! strings that point at them.
//!
//! # Architecture: Two Halves, One Naming Contract
//!
//! ```text
//! build time   public/images/sunset.jpg  →  optimize  →  public/images/optimized/sunset-{w}.{webp,jpg}
//! render time  "/images/sunset.jpg"      →  resolve   →  <source type="image/webp" srcset="...">
//! ```
//!
//! The generator and the resolver never talk to each other. The generator
//! writes files, the resolver computes URLs, and both go through the
//! [`contract`] module for file names, extensions and widths. If they disagreed
//! the only symptom would be 404s in the browser, so neither half formats a
//! variant name on its own.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`contract`] | Naming rule `{stem}-{width}.{ext}`, raster families, default width lists |
//! | [`config`] | `folio.toml` loading, merging over stock defaults, validation |
//! | [`optimize`] | The generator: full run, bounded worker pool, per-source outcomes |
//! | [`freshness`] | Modification-time skip check and run statistics |
//! | [`sweep`] | Deletes variants whose source is gone |
//! | [`resolve`] | The resolver: reference → alternate sources + fallback, loading hints |
//! | [`audit`] | Verifies every URL the resolver would emit exists on disk |
//! | [`imaging`] | Pure-Rust decode, Lanczos3 resize, WebP/JPEG/PNG encode |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Regenerate Whole Variant Sets
//!
//! A source is either fully fresh or fully rebuilt. One missing or stale
//! variant triggers a rebuild of all of them. Interrupted runs, failed writes
//! and replaced sources all heal on the next run without a manifest file.
//!
//! ## One Pool for All Encodes
//!
//! Sources are pulled from a shared queue by a handful of logical workers, and
//! each source fans out into one encode per width and encoding. Both levels run
//! on the same [rayon](https://docs.rs/rayon) pool, so the number of encodes in
//! flight never exceeds the pool size.
//!
//! ## Atomic Writes
//!
//! Variants are written to a temporary file in the output directory and
//! renamed into place. A truncated file would otherwise carry a fresh
//! modification time and pass the freshness check forever.
//!
//! ## Failures Are Data
//!
//! A source that cannot be decoded or written does not stop the run. It shows
//! up as a failed [`optimize::SourceOutcome`] in the report, and the CLI exits
//! non-zero after finishing the rest of the batch.

pub mod audit;
pub mod config;
pub mod contract;
pub mod freshness;
pub mod imaging;
pub mod optimize;
pub mod output;
pub mod resolve;
pub mod sweep;

#[cfg(test)]
pub(crate) mod test_helpers;
