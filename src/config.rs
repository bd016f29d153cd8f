//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging `folio.toml`. Stock defaults are
//! overridden by an optional `folio.toml` in the project root.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! input_dir = "public/images"            # Source images (flat directory)
//! output_dir = "public/images/optimized" # Generated variants
//!
//! [generator]
//! widths = [96, 128, 160, 256, 320, 384, 480, 512, 640, 768, 960, 1024, 1280, 1600, 1920, 2560]
//! webp_quality = 78
//! jpeg_quality = 80
//! png_compression = "best"               # "fast", "default" or "best"
//!
//! [resolver]
//! widths = [320, 480, 640, 768, 960, 1024, 1280, 1600, 1920, 2560]
//! fallback_width = 1280
//! source_prefix = "/images"
//! optimized_prefix = "/images/optimized"
//!
//! [processing]
//! source_workers = 4     # Sources processed at once
//! max_processes = 4      # Encode threads (omit for auto = CPU cores)
//! ```
//!
//! ## Width Lists
//!
//! The generator and resolver lists are configured separately, but the
//! resolver may only advertise widths the generator actually produces.
//! [`PipelineConfig::validate`] rejects a resolver width (or fallback width)
//! missing from the generator list, so a drifted config fails at load time
//! instead of as broken image requests.
//!
//! Unknown keys are rejected to catch typos early.

use crate::contract::{
    FALLBACK_WIDTH, GENERATOR_WIDTHS, OPTIMIZED_URL_PREFIX, RESOLVER_WIDTHS, SOURCE_URL_PREFIX,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the project root.
pub const CONFIG_FILENAME: &str = "folio.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `folio.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub generator: GeneratorConfig,
    pub resolver: ResolverConfig,
    pub processing: ProcessingConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges and that the
    /// resolver only references generated widths.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_widths("generator.widths", &self.generator.widths)?;
        if self.generator.widths.is_empty() {
            return Err(ConfigError::Validation(
                "generator.widths must not be empty".into(),
            ));
        }
        validate_widths("resolver.widths", &self.resolver.widths)?;
        for (key, quality) in [
            ("generator.webp_quality", self.generator.webp_quality),
            ("generator.jpeg_quality", self.generator.jpeg_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(ConfigError::Validation(format!("{key} must be 1-100")));
            }
        }
        // --clean removes output_dir recursively
        if self.paths.input_dir.starts_with(&self.paths.output_dir) {
            return Err(ConfigError::Validation(
                "paths.output_dir must not be paths.input_dir or one of its parents".into(),
            ));
        }
        if self.processing.source_workers == 0 {
            return Err(ConfigError::Validation(
                "processing.source_workers must be at least 1".into(),
            ));
        }
        if let Some(missing) = self
            .resolver
            .widths
            .iter()
            .find(|w| !self.generator.widths.contains(w))
        {
            return Err(ConfigError::Validation(format!(
                "resolver width {missing} is not in generator.widths"
            )));
        }
        if !self.generator.widths.contains(&self.resolver.fallback_width) {
            return Err(ConfigError::Validation(format!(
                "resolver.fallback_width {} is not in generator.widths",
                self.resolver.fallback_width
            )));
        }
        Ok(())
    }

    /// Absolute input directory for a project root.
    pub fn input_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.paths.input_dir)
    }

    /// Absolute output directory for a project root.
    pub fn output_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.paths.output_dir)
    }
}

fn validate_widths(key: &str, widths: &[u32]) -> Result<(), ConfigError> {
    if widths.contains(&0) {
        return Err(ConfigError::Validation(format!(
            "{key} values must be non-zero"
        )));
    }
    if !widths.windows(2).all(|pair| pair[0] < pair[1]) {
        return Err(ConfigError::Validation(format!(
            "{key} must be strictly ascending"
        )));
    }
    Ok(())
}

/// Source and output locations, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("public/images"),
            output_dir: PathBuf::from("public/images/optimized"),
        }
    }
}

/// PNG compression effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    Fast,
    Default,
    #[default]
    Best,
}

/// Variant generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Every width to produce, ascending.
    pub widths: Vec<u32>,
    /// Lossy WebP quality (1-100).
    pub webp_quality: u32,
    /// JPEG quality (1-100).
    pub jpeg_quality: u32,
    pub png_compression: PngCompression,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            widths: GENERATOR_WIDTHS.to_vec(),
            webp_quality: 78,
            jpeg_quality: 80,
            png_compression: PngCompression::Best,
        }
    }
}

/// Runtime URL resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Widths advertised in each srcset.
    pub widths: Vec<u32>,
    /// Fallback `src` width used when the width list is empty.
    pub fallback_width: u32,
    /// URL prefix of logical references (`<prefix>/<stem>.<ext>`).
    pub source_prefix: String,
    /// URL prefix of generated variants.
    pub optimized_prefix: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            widths: RESOLVER_WIDTHS.to_vec(),
            fallback_width: FALLBACK_WIDTH,
            source_prefix: SOURCE_URL_PREFIX.to_string(),
            optimized_prefix: OPTIMIZED_URL_PREFIX.to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Number of sources pulled from the queue concurrently.
    pub source_workers: usize,
    /// Maximum number of encode threads shared by all workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            source_workers: 4,
            max_processes: None,
        }
    }
}

/// Resolve the effective encode thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(PipelineConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `folio.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no config file exists.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `folio.toml` in the given project root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `folio.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# folio-assets configuration
# ==========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Locations, relative to the project root
# ---------------------------------------------------------------------------
[paths]
input_dir = "public/images"
output_dir = "public/images/optimized"

# ---------------------------------------------------------------------------
# Variant generation
# ---------------------------------------------------------------------------
[generator]
# Every width produced for every source, ascending. Each width yields one
# .webp and one .jpg/.png file.
widths = [96, 128, 160, 256, 320, 384, 480, 512, 640, 768, 960, 1024, 1280, 1600, 1920, 2560]

# Lossy WebP quality (1 = worst, 100 = best).
webp_quality = 78

# JPEG quality (1 = worst, 100 = best).
jpeg_quality = 80

# PNG compression effort: "fast", "default" or "best".
png_compression = "best"

# ---------------------------------------------------------------------------
# URL resolution
# ---------------------------------------------------------------------------
[resolver]
# Widths listed in each srcset. Every value must appear in generator.widths.
widths = [320, 480, 640, 768, 960, 1024, 1280, 1600, 1920, 2560]

# src width used when an empty width list is requested.
fallback_width = 1280

# References of the form <source_prefix>/<stem>.<ext> are resolved.
source_prefix = "/images"

# Generated variants are served from here.
optimized_prefix = "/images/optimized"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Sources processed concurrently.
source_workers = 4

# Maximum encode threads shared by all workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
