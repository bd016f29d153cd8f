//! Orphan sweep: delete variants whose source no longer exists.
//!
//! A file in the output directory is an orphan when its name parses as
//! `{stem}-{width}.{ext}` (width in the configured list, ext one the generator
//! writes) and no source with that stem exists in the input directory under
//! any recognized extension. Files that do not parse are never touched.
//!
//! Leftover `.partial-*` temporaries from an interrupted run are removed too.

use crate::contract::{parse_source_filename, parse_variant_filename};
use crate::imaging::rust_backend::PARTIAL_PREFIX;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What a sweep removed, and what it failed to remove.
#[derive(Debug, Default)]
pub struct SweepResult {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, io::Error)>,
}

/// Regular files directly inside `dir`, sorted by name.
pub(crate) fn list_files(dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        // Non-UTF-8 names can't be part of the naming contract
        if let Some(name) = entry.file_name().to_str() {
            files.push((name.to_string(), entry.path().to_path_buf()));
        }
    }
    Ok(files)
}

/// Stems of every recognized source in `input_dir`.
pub fn source_stems(input_dir: &Path) -> io::Result<HashSet<String>> {
    Ok(list_files(input_dir)?
        .into_iter()
        .filter_map(|(name, _)| parse_source_filename(&name))
        .map(|source| source.stem)
        .collect())
}

/// Delete orphaned variants from `output_dir`.
///
/// A missing output directory is a no-op. Failure to list the input directory
/// is an error: without it every variant would look orphaned.
pub fn sweep_orphans(
    input_dir: &Path,
    output_dir: &Path,
    widths: &[u32],
) -> io::Result<SweepResult> {
    let mut result = SweepResult::default();
    if !output_dir.is_dir() {
        return Ok(result);
    }
    let stems = source_stems(input_dir)?;
    let outputs = match list_files(output_dir) {
        Ok(files) => files,
        Err(e) => {
            tracing::warn!(dir = %output_dir.display(), "cannot list output directory: {e}");
            return Ok(result);
        }
    };

    for (name, path) in outputs {
        let orphaned = if name.starts_with(PARTIAL_PREFIX) {
            true
        } else {
            match parse_variant_filename(&name, widths) {
                Some(variant) => !stems.contains(&variant.stem),
                None => false,
            }
        };
        if !orphaned {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(file = %name, "removed orphan");
                result.removed.push(path);
            }
            Err(e) => {
                tracing::warn!(file = %name, "cannot remove orphan: {e}");
                result.failed.push((path, e));
            }
        }
    }
    Ok(result)
}
