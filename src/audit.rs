//! Drift check between the resolver and the files on disk.
//!
//! For every source in the input directory, resolve `<source_prefix>/<name>`
//! with the configured resolver and verify that every variant file it points at
//! exists under the output directory. File names come from the same naming
//! rule the generator writes with. A missing file here is a 404 in production.

use crate::config::PipelineConfig;
use crate::contract::parse_source_filename;
use crate::resolve::{ResolveOptions, Resolver};
use crate::sweep::list_files;
use serde::Serialize;
use std::io;
use std::path::Path;

/// Missing URLs for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub source: String,
    pub reference: String,
    pub missing: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct AuditReport {
    /// Number of sources checked.
    pub checked: usize,
    /// Only sources with at least one missing URL.
    pub entries: Vec<AuditEntry>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.entries.iter().map(|e| e.missing.len()).sum()
    }
}

pub fn audit(config: &PipelineConfig, input_dir: &Path, output_dir: &Path) -> io::Result<AuditReport> {
    let resolver = Resolver::new(&config.resolver);
    let source_prefix = config.resolver.source_prefix.trim_end_matches('/');
    let mut report = AuditReport::default();

    for (name, _) in list_files(input_dir)? {
        if parse_source_filename(&name).is_none() {
            continue;
        }
        report.checked += 1;
        let reference = format!("{source_prefix}/{name}");
        let missing: Vec<String> = resolver
            .referenced_variants(&reference, &ResolveOptions::default())
            .into_iter()
            .filter(|variant| !output_dir.join(&variant.file_name).is_file())
            .map(|variant| variant.url)
            .collect();

        if !missing.is_empty() {
            tracing::debug!(source = %name, missing = missing.len(), "variants missing");
            report.entries.push(AuditEntry {
                source: name,
                reference,
                missing,
            });
        }
    }
    Ok(report)
}
