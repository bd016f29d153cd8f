//! Freshness check for incremental runs.
//!
//! Encoding is the bottleneck of a run: one source expands into dozens of
//! resized encodes. This module lets the generator skip a source whose
//! variants are already up to date.
//!
//! # Rule
//!
//! A source is **fresh** when every expected variant exists and none of them
//! has a modification time older than the source. Anything else (a single
//! missing file, a single stale file) marks the whole source for regeneration.
//! There is no per-variant repair: a variant set is either complete and fresh
//! or rebuilt wholesale.
//!
//! The check is modification-time based, with no manifest file of its own, so
//! it survives a wiped cache, a crash mid-run (missing outputs), and a replaced
//! source (newer mtime).
//!
//! # Bypassing the check
//!
//! Pass `--force` to regenerate every source regardless of freshness.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Result of comparing a source against its expected variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// Every variant exists and is at least as new as the source.
    Fresh,
    /// This variant does not exist.
    Missing(PathBuf),
    /// This variant is older than the source.
    Stale(PathBuf),
}

impl Freshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh)
    }
}

fn modified(path: &Path) -> io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
}

/// Compare `source` against every path in `outputs`.
///
/// Returns `Err` only when the source itself cannot be inspected. An output
/// that cannot be inspected counts as missing.
pub fn check_freshness(source: &Path, outputs: &[PathBuf]) -> io::Result<Freshness> {
    let source_time = modified(source)?;
    for output in outputs {
        match modified(output) {
            Err(_) => return Ok(Freshness::Missing(output.clone())),
            Ok(time) if time < source_time => return Ok(Freshness::Stale(output.clone())),
            Ok(_) => {}
        }
    }
    Ok(Freshness::Fresh)
}

/// Summary of a generator run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FreshnessStats {
    pub fresh: u32,
    pub encoded: u32,
    pub failed: u32,
    /// Sources whose variants all come from another source with the same stem.
    pub duplicates: u32,
    pub orphans_removed: u32,
}

impl FreshnessStats {
    pub fn total(&self) -> u32 {
        self.fresh + self.encoded + self.failed + self.duplicates
    }
}

impl fmt::Display for FreshnessStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fresh, {} encoded, {} failed ({} sources)",
            self.fresh,
            self.encoded,
            self.failed,
            self.total()
        )?;
        if self.duplicates > 0 {
            write!(f, ", {} duplicates", self.duplicates)?;
        }
        if self.orphans_removed > 0 {
            write!(f, ", {} orphans removed", self.orphans_removed)?;
        }
        Ok(())
    }
}
