//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Optimize
//!
//! One line per event as the run progresses, then a summary:
//!
//! ```text
//! removed  old-banner-320.webp
//! encoded  sunset.jpg (32 variants)
//! fresh    logo.png
//! failed   broken.jpg
//!     Error: decode error for public/images/broken.jpg: ...
//!
//! 1 fresh, 1 encoded, 1 failed (3 sources), 1 orphans removed
//! Failed sources:
//!     broken.jpg
//! ```
//!
//! ## Check
//!
//! ```text
//! sunset.jpg → /images/sunset.jpg
//!     missing: /images/optimized/sunset-320.jpg
//!
//! 1 of 4 sources missing variants (1 URLs)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::audit::AuditReport;
use crate::optimize::{OptimizeEvent, OptimizeReport};
use crate::sweep::SweepResult;
use std::path::Path;

/// Status labels are padded to this width so file names line up.
const LABEL_WIDTH: usize = 8;

fn status_line(label: &str, subject: &str) -> String {
    format!("{label:<width$} {subject}", width = LABEL_WIDTH)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Optimize
// ============================================================================

/// Format a single progress event as display lines.
pub fn format_optimize_event(event: &OptimizeEvent) -> Vec<String> {
    match event {
        OptimizeEvent::OrphanRemoved { file } => vec![status_line("removed", file)],
        OptimizeEvent::SourceSkipped { source } => vec![status_line("fresh", source)],
        OptimizeEvent::SourceEncoded { source, variants } => {
            vec![status_line(
                "encoded",
                &format!("{source} ({variants} variants)"),
            )]
        }
        OptimizeEvent::SourceFailed { source, error } => vec![
            status_line("failed", source),
            format!("    Error: {error}"),
        ],
        OptimizeEvent::SourceDuplicate { source, of } => {
            vec![status_line("same", &format!("{source} (variants from {of})"))]
        }
    }
}

/// Summary printed after the last event.
pub fn format_optimize_summary(report: &OptimizeReport) -> Vec<String> {
    let mut lines = vec![String::new(), report.stats.to_string()];
    if report.has_failures() {
        lines.push("Failed sources:".to_string());
        for outcome in report.failures() {
            lines.push(format!("    {}", outcome.source));
        }
    }
    lines
}

pub fn print_optimize_summary(report: &OptimizeReport) {
    for line in format_optimize_summary(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Sweep
// ============================================================================

pub fn format_sweep_output(result: &SweepResult) -> Vec<String> {
    let mut lines: Vec<String> = result
        .removed
        .iter()
        .map(|path| status_line("removed", &file_name(path)))
        .collect();
    for (path, error) in &result.failed {
        lines.push(status_line("kept", &file_name(path)));
        lines.push(format!("    Error: {error}"));
    }
    lines.push(format!("{} orphans removed", result.removed.len()));
    lines
}

pub fn print_sweep_output(result: &SweepResult) {
    for line in format_sweep_output(result) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_audit_report(report: &AuditReport) -> Vec<String> {
    let mut lines = Vec::new();
    for entry in &report.entries {
        lines.push(format!("{} \u{2192} {}", entry.source, entry.reference));
        for url in &entry.missing {
            lines.push(format!("    missing: {url}"));
        }
    }
    if report.is_clean() {
        lines.push(format!(
            "All {} sources have every advertised variant",
            report.checked
        ));
    } else {
        lines.push(String::new());
        lines.push(format!(
            "{} of {} sources missing variants ({} URLs)",
            report.entries.len(),
            report.checked,
            report.missing_count()
        ));
    }
    lines
}

pub fn print_audit_report(report: &AuditReport) {
    for line in format_audit_report(report) {
        println!("{}", line);
    }
}
